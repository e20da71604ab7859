//! Shared fixtures: an in-memory SQLite database with every migration
//! applied, the in-process cache store and a notifier that records jobs.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use storefront_api::config::Config;
use storefront_api::domain::{
    Actor, Category, NewProduct, NewUser, Password, ProductDetails, ProductStatus, User, UserRole,
};
use storefront_api::errors::AppResult;
use storefront_api::infra::{CacheStore, Database, MemoryStore, Migrator, Repositories};
use storefront_api::jobs::{OrderConfirmationJob, OrderNotifier};
use storefront_api::services::{ServiceContainer, Services};
use storefront_api::AppState;

pub const PASSWORD: &str = "SecurePass123!";
pub const APP_URL: &str = "http://shop.test";

/// Keeps every confirmation handed to it.
#[derive(Default)]
pub struct RecordingNotifier {
    jobs: Mutex<Vec<OrderConfirmationJob>>,
}

impl RecordingNotifier {
    pub fn jobs(&self) -> Vec<OrderConfirmationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn order_placed(&self, job: OrderConfirmationJob) -> AppResult<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub cache: Arc<dyn CacheStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub services: Arc<Services>,
    pub config: Config,
}

pub fn test_config() -> Config {
    let mut config = Config::new("sqlite::memory:", "integration-test-secret-with-32-chars");
    config.app_url = APP_URL.to_string();
    config
}

pub async fn setup() -> TestApp {
    // One connection, so every query sees the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = sea_orm::Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = test_config();
    let services = Arc::new(Services::from_connection(
        db.clone(),
        cache.clone(),
        notifier.clone(),
        config.clone(),
    ));

    TestApp {
        db,
        cache,
        notifier,
        services,
        config,
    }
}

impl TestApp {
    pub fn repositories(&self) -> Repositories<'_, DatabaseConnection> {
        Repositories::new(&self.db)
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.services.clone(),
            self.cache.clone(),
            Arc::new(Database::from_connection(self.db.clone())),
            APP_URL,
        )
    }

    pub async fn user(&self, email: &str, role: UserRole) -> (User, Actor) {
        let user = self
            .repositories()
            .users()
            .create_with_role(
                NewUser {
                    name: "Test User".to_string(),
                    email: email.to_string(),
                    password_hash: Password::new(PASSWORD).unwrap().into_string(),
                },
                role,
            )
            .await
            .unwrap();
        let actor = Actor::new(user.id, user.email.clone(), user.role);
        (user, actor)
    }

    pub async fn customer(&self, email: &str) -> Actor {
        self.user(email, UserRole::Customer).await.1
    }

    pub async fn admin(&self) -> Actor {
        self.user("admin@example.com", UserRole::Admin).await.1
    }

    /// Bearer token for an existing account
    pub async fn token(&self, email: &str) -> String {
        self.services
            .auth()
            .login(email.to_string(), PASSWORD.to_string())
            .await
            .unwrap()
            .token
    }

    pub async fn category(&self, admin: &Actor, name: &str) -> Category {
        self.services
            .categories()
            .create(admin, name.to_string())
            .await
            .unwrap()
            .category
    }

    pub async fn product(
        &self,
        admin: &Actor,
        name: &str,
        price: Decimal,
        quantity: i32,
        categories: &[Uuid],
    ) -> ProductDetails {
        self.services
            .products()
            .create(
                admin,
                NewProduct {
                    name: name.to_string(),
                    description: None,
                    price,
                    quantity,
                    status: ProductStatus::Active,
                    category_ids: categories.to_vec(),
                },
            )
            .await
            .unwrap()
    }

    /// Current stock, trashed products included
    pub async fn stock(&self, product_id: Uuid) -> i32 {
        self.repositories()
            .products()
            .find_many_with_deleted(&[product_id])
            .await
            .unwrap()
            .remove(&product_id)
            .unwrap()
            .quantity
    }
}

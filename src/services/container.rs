//! Service container: one place to reach every application service.
//!
//! Handlers depend on the `ServiceContainer` trait, so routes can be tested
//! against a mocked container.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::{
    AuthService, Authenticator, CartManager, CartService, CategoryManager, CategoryService,
    OrderManager, OrderService, ProductManager, ProductService,
};
use crate::config::Config;
use crate::infra::{CacheStore, Persistence};
use crate::jobs::OrderNotifier;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn products(&self) -> Arc<dyn ProductService>;

    fn categories(&self) -> Arc<dyn CategoryService>;

    fn carts(&self) -> Arc<dyn CartService>;

    fn orders(&self) -> Arc<dyn OrderService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    product_service: Arc<dyn ProductService>,
    category_service: Arc<dyn CategoryService>,
    cart_service: Arc<dyn CartService>,
    order_service: Arc<dyn OrderService>,
}

impl Services {
    /// Wire every service over one shared unit of work
    pub fn from_connection(
        db: DatabaseConnection,
        cache: Arc<dyn CacheStore>,
        notifier: Arc<dyn OrderNotifier>,
        config: Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), cache.clone(), config)),
            product_service: Arc::new(ProductManager::new(uow.clone())),
            category_service: Arc::new(CategoryManager::new(uow.clone(), cache)),
            cart_service: Arc::new(CartManager::new(uow.clone())),
            order_service: Arc::new(OrderManager::new(uow, notifier)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn products(&self) -> Arc<dyn ProductService> {
        self.product_service.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryService> {
        self.category_service.clone()
    }

    fn carts(&self) -> Arc<dyn CartService> {
        self.cart_service.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.order_service.clone()
    }
}

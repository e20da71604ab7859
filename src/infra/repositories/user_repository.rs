//! User repository implementation.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User, UserRole};
use crate::errors::{AppError, AppResult};

/// User persistence over any connection or transaction.
pub struct UserRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    /// Lookup by already-normalised email address
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Create an account. Every registration starts as a customer.
    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        self.insert(new_user, UserRole::Customer).await
    }

    /// Create an account with an explicit role (operator tooling only).
    pub async fn create_with_role(&self, new_user: NewUser, role: UserRole) -> AppResult<User> {
        self.insert(new_user, role).await
    }

    async fn insert(&self, new_user: NewUser, role: UserRole) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            role: Set(role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }
}

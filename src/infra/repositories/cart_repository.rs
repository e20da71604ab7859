//! Cart and cart item repository implementation.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::cart::{self, Entity as CartEntity};
use super::entities::cart_item::{self, Entity as CartItemEntity};
use crate::domain::{Cart, CartItem};
use crate::errors::{AppError, AppResult};

pub struct CartRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CartRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        let result = CartEntity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(self.conn)
            .await?;
        Ok(result.map(Cart::from))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Cart>> {
        let result = CartEntity::find_by_id(id).one(self.conn).await?;
        Ok(result.map(Cart::from))
    }

    pub async fn create(&self, user_id: Uuid) -> AppResult<Cart> {
        let now = Utc::now();
        let active_model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Cart::from(model))
    }

    /// Lines in the order they were first added
    pub async fn items(&self, cart_id: Uuid) -> AppResult<Vec<CartItem>> {
        let models = CartItemEntity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(CartItem::from).collect())
    }

    pub async fn find_item(&self, cart_id: Uuid, product_id: Uuid) -> AppResult<Option<CartItem>> {
        let result = CartItemEntity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(self.conn)
            .await?;
        Ok(result.map(CartItem::from))
    }

    pub async fn find_item_by_id(&self, id: Uuid) -> AppResult<Option<CartItem>> {
        let result = CartItemEntity::find_by_id(id).one(self.conn).await?;
        Ok(result.map(CartItem::from))
    }

    pub async fn insert_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
    ) -> AppResult<CartItem> {
        let now = Utc::now();
        let active_model = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(price),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(CartItem::from(model))
    }

    /// Overwrite quantity and the price snapshot of a line
    pub async fn update_item(&self, id: Uuid, quantity: i32, price: Decimal) -> AppResult<CartItem> {
        let model = CartItemEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: cart_item::ActiveModel = model.into();
        active.quantity = Set(quantity);
        active.price = Set(price);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(CartItem::from(model))
    }

    pub async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        let result = CartItemEntity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Remove every line; the cart row itself stays.
    pub async fn clear(&self, cart_id: Uuid) -> AppResult<u64> {
        let result = CartItemEntity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}

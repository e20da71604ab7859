//! Order repository implementation.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::fetch_page;
use super::entities::order::{self, Entity as OrderEntity};
use super::entities::order_item::{self, Entity as OrderItemEntity};
use crate::domain::{Order, OrderItem, OrderLineRequest, OrderStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

pub struct OrderRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> OrderRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a pending order with a zero total
    pub async fn create(&self, user_id: Uuid, order_number: String) -> AppResult<Order> {
        let now = Utc::now();
        let active_model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            order_number: Set(order_number),
            total: Set(Decimal::ZERO),
            status: Set(OrderStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Order::from(model))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let result = OrderEntity::find_by_id(id).one(self.conn).await?;
        Ok(result.map(Order::from))
    }

    /// Read the order row with a write lock held until the transaction ends
    pub async fn find_for_update(&self, id: Uuid) -> AppResult<Option<Order>> {
        let result = OrderEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.conn)
            .await?;
        Ok(result.map(Order::from))
    }

    /// Insert line items with the given unit prices, in request order
    pub async fn insert_items(
        &self,
        order_id: Uuid,
        lines: &[(OrderLineRequest, Decimal)],
    ) -> AppResult<Vec<OrderItem>> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let models: Vec<order_item::Model> = lines
            .iter()
            .map(|(line, price)| order_item::Model {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: *price,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let active_models = models.iter().map(|model| order_item::ActiveModel {
            id: Set(model.id),
            order_id: Set(model.order_id),
            product_id: Set(model.product_id),
            quantity: Set(model.quantity),
            price: Set(model.price),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        });
        OrderItemEntity::insert_many(active_models)
            .exec(self.conn)
            .await?;

        Ok(models.into_iter().map(OrderItem::from).collect())
    }

    /// Line items of each order, keyed by order id
    pub async fn items_by_order(
        &self,
        order_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<OrderItem>>> {
        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let models = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(self.conn)
            .await?;

        for model in models {
            grouped
                .entry(model.order_id)
                .or_default()
                .push(OrderItem::from(model));
        }
        Ok(grouped)
    }

    pub async fn set_total(&self, id: Uuid, total: Decimal) -> AppResult<Order> {
        self.modify(id, |active| active.total = Set(total)).await
    }

    pub async fn set_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Order> {
        self.modify(id, |active| active.status = Set(status.to_string()))
            .await
    }

    async fn modify(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut order::ActiveModel),
    ) -> AppResult<Order> {
        let model = OrderEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: order::ActiveModel = model.into();
        apply(&mut active);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Order::from(model))
    }

    /// Newest first. `user_id` restricts the page to one customer's orders.
    pub async fn paginate(
        &self,
        user_id: Option<Uuid>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Order>, u64)> {
        let mut select = OrderEntity::find();
        if let Some(user_id) = user_id {
            select = select.filter(order::Column::UserId.eq(user_id));
        }
        let select = select
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderNumber);

        let (models, total) = fetch_page(self.conn, select, params).await?;
        Ok((models.into_iter().map(Order::from).collect(), total))
    }

    /// Whether any order line references the product
    pub async fn product_has_orders(&self, product_id: Uuid) -> AppResult<bool> {
        let count = OrderItemEntity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}

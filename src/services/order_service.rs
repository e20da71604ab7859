//! Order placement and cancellation.
//!
//! Placement validates every line up front, then re-checks stock under row
//! locks inside one transaction: the products are locked, the order and its
//! lines are written, stock is decremented and the total is stored. The
//! confirmation is queued only after the commit.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::common::order_details;
use crate::domain::{order_total, Actor, Order, OrderDetails, OrderLineRequest, OrderStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::jobs::{OrderConfirmationJob, OrderNotifier};
use crate::types::{FieldErrors, Paginated, PaginationParams};

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Admins see every order, customers only their own
    async fn list(&self, actor: &Actor, params: PaginationParams)
        -> AppResult<Paginated<OrderDetails>>;

    async fn show(&self, actor: &Actor, id: Uuid) -> AppResult<OrderDetails>;

    async fn create(&self, actor: &Actor, lines: Vec<OrderLineRequest>) -> AppResult<OrderDetails>;

    /// Cancel and put the stock back
    async fn cancel(&self, actor: &Actor, id: Uuid) -> AppResult<OrderDetails>;
}

pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Arc<dyn OrderNotifier>,
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(uow: Arc<U>, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { uow, notifier }
    }

    /// Per-line checks against current stock, reported as field errors.
    async fn check_lines(&self, lines: &[OrderLineRequest]) -> AppResult<()> {
        if lines.is_empty() {
            return Err(AppError::validation("items", "The Items field is required."));
        }

        let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        let products = self
            .uow
            .repositories()
            .products()
            .find_many_with_deleted(&ids)
            .await?;

        let mut errors = FieldErrors::new();
        for (index, line) in lines.iter().enumerate() {
            let product = products
                .get(&line.product_id)
                .filter(|product| !product.is_trashed() && product.is_active());

            match product {
                None => errors.add(
                    format!("items.{}.product_id", index),
                    "The selected Product ID is invalid or not available.",
                ),
                Some(product) if !product.in_stock() => errors.add(
                    format!("items.{}.product_id", index),
                    "The product is not available or out of stock.",
                ),
                Some(product) if product.quantity < line.quantity => errors.add(
                    format!("items.{}.quantity", index),
                    format!(
                        "Insufficient quantity available for product '{}'. Only {} available.",
                        product.name, product.quantity
                    ),
                ),
                Some(_) => {}
            }
        }
        errors.into_result()
    }

    async fn details(&self, order: Order) -> AppResult<OrderDetails> {
        order_details(self.uow.repositories(), vec![order])
            .await?
            .pop()
            .ok_or_not_found()
    }

    async fn owned_order(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        let order = self
            .uow
            .repositories()
            .orders()
            .find_by_id(id)
            .await?
            .ok_or_not_found()?;

        if !actor.can_access(order.user_id) {
            tracing::warn!(user_id = %actor.id, order_id = %id, "Order access refused");
            return Err(AppError::forbidden(""));
        }
        Ok(order)
    }

    async fn notify(&self, actor: &Actor, details: &OrderDetails) {
        let customer = match self.uow.repositories().users().find_by_id(actor.id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(user_id = %actor.id, "Order placed by unknown user");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load customer for confirmation");
                return;
            }
        };

        let job = OrderConfirmationJob::new(details, &customer);
        if let Err(e) = self.notifier.order_placed(job).await {
            tracing::warn!(order_id = %details.order.id, error = %e, "Failed to queue order confirmation");
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    async fn list(
        &self,
        actor: &Actor,
        params: PaginationParams,
    ) -> AppResult<Paginated<OrderDetails>> {
        let scope = if actor.is_admin() { None } else { Some(actor.id) };
        let repos = self.uow.repositories();

        let (orders, total) = repos.orders().paginate(scope, &params).await?;
        let items = order_details(repos, orders).await?;
        Ok(Paginated::new(items, &params, total))
    }

    async fn show(&self, actor: &Actor, id: Uuid) -> AppResult<OrderDetails> {
        let order = self.owned_order(actor, id).await?;
        self.details(order).await
    }

    async fn create(&self, actor: &Actor, lines: Vec<OrderLineRequest>) -> AppResult<OrderDetails> {
        self.check_lines(&lines).await?;

        let user_id = actor.id;
        let order = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let ids: Vec<Uuid> = lines
                        .iter()
                        .map(|line| line.product_id)
                        .collect::<HashSet<_>>()
                        .into_iter()
                        .collect();

                    let locked = tx.products().lock_available(&ids).await?;
                    if locked.len() < ids.len() {
                        return Err(AppError::bad_request(
                            "One or more products are not available.",
                        ));
                    }
                    let mut stock: HashMap<Uuid, i32> =
                        locked.iter().map(|p| (p.id, p.quantity)).collect();
                    let products: HashMap<Uuid, _> =
                        locked.into_iter().map(|p| (p.id, p)).collect();

                    let order = tx
                        .orders()
                        .create(user_id, Uuid::new_v4().to_string())
                        .await?;

                    let mut priced = Vec::with_capacity(lines.len());
                    for line in lines {
                        let product = products
                            .get(&line.product_id)
                            .ok_or_else(|| AppError::bad_request("One or more products are not available."))?;
                        let remaining = stock.entry(line.product_id).or_default();
                        if *remaining < line.quantity {
                            return Err(AppError::bad_request(format!(
                                "Insufficient quantity for product: {}",
                                product.name
                            )));
                        }
                        *remaining -= line.quantity;

                        tx.products()
                            .decrement_stock(line.product_id, line.quantity)
                            .await?;
                        priced.push((line, product.price));
                    }

                    let items = tx.orders().insert_items(order.id, &priced).await?;
                    tx.orders().set_total(order.id, order_total(&items)).await
                })
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            "Order placed"
        );

        let details = self.details(order).await?;
        self.notify(actor, &details).await;
        Ok(details)
    }

    async fn cancel(&self, actor: &Actor, id: Uuid) -> AppResult<OrderDetails> {
        self.owned_order(actor, id).await?;

        let order = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let order = tx
                        .orders()
                        .find_for_update(id)
                        .await?
                        .ok_or(AppError::NotFound)?;
                    order.ensure_cancellable()?;

                    let items = tx
                        .orders()
                        .items_by_order(&[id])
                        .await?
                        .remove(&id)
                        .unwrap_or_default();
                    for item in &items {
                        tx.products()
                            .increment_stock(item.product_id, item.quantity)
                            .await?;
                    }

                    tx.orders().set_status(id, OrderStatus::Cancelled).await
                })
            })
            .await?;

        tracing::info!(order_id = %order.id, user_id = %actor.id, "Order cancelled");
        self.details(order).await
    }
}

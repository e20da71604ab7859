//! Shopping cart service.

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Actor, Cart, CartDetails, CartLine};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{Repositories, UnitOfWork};

#[async_trait]
pub trait CartService: Send + Sync {
    /// The caller's cart, created on first access
    async fn get(&self, actor: &Actor) -> AppResult<CartDetails>;

    /// Add a product, merging with an existing line for the same product
    async fn add(&self, actor: &Actor, product_id: Uuid, quantity: i32) -> AppResult<CartDetails>;

    async fn remove(&self, actor: &Actor, item_id: Uuid) -> AppResult<CartDetails>;

    async fn clear(&self, actor: &Actor) -> AppResult<CartDetails>;
}

async fn cart_for<C: ConnectionTrait>(repos: Repositories<'_, C>, user_id: Uuid) -> AppResult<Cart> {
    if let Some(cart) = repos.carts().find_by_user(user_id).await? {
        return Ok(cart);
    }

    match repos.carts().create(user_id).await {
        Ok(cart) => Ok(cart),
        // A concurrent request may have created it first
        Err(e) => repos.carts().find_by_user(user_id).await?.ok_or(e),
    }
}

async fn cart_details<C: ConnectionTrait>(
    repos: Repositories<'_, C>,
    cart: Cart,
) -> AppResult<CartDetails> {
    let items = repos.carts().items(cart.id).await?;
    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let mut products = repos
        .products()
        .find_many_with_deleted(&product_ids)
        .await?;

    let lines = items
        .into_iter()
        .filter_map(|item| {
            products
                .remove(&item.product_id)
                .map(|product| CartLine { item, product })
        })
        .collect();

    Ok(CartDetails { cart, lines })
}

pub struct CartManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CartManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> CartService for CartManager<U> {
    async fn get(&self, actor: &Actor) -> AppResult<CartDetails> {
        let repos = self.uow.repositories();
        let cart = cart_for(repos, actor.id).await?;
        cart_details(repos, cart).await
    }

    async fn add(&self, actor: &Actor, product_id: Uuid, quantity: i32) -> AppResult<CartDetails> {
        let product = self
            .uow
            .repositories()
            .products()
            .find_by_id(product_id)
            .await?
            .filter(|product| product.is_active());
        if product.is_none() {
            return Err(AppError::validation(
                "product_id",
                "The selected Product ID is invalid or not available.",
            ));
        }

        let user_id = actor.id;
        let cart = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let product = tx
                        .products()
                        .find_by_id(product_id)
                        .await?
                        .filter(|product| product.is_available())
                        .ok_or_else(|| {
                            AppError::bad_request("Product is not available or out of stock.")
                        })?;

                    let cart = cart_for(tx, user_id).await?;
                    let existing = tx.carts().find_item(cart.id, product_id).await?;
                    let wanted = existing
                        .as_ref()
                        .map_or(0, |item| item.quantity)
                        .checked_add(quantity)
                        .filter(|wanted| *wanted <= product.quantity)
                        .ok_or_else(|| AppError::bad_request("Insufficient quantity available."))?;

                    match existing {
                        Some(item) => {
                            tx.carts().update_item(item.id, wanted, product.price).await?;
                        }
                        None => {
                            tx.carts()
                                .insert_item(cart.id, product_id, quantity, product.price)
                                .await?;
                        }
                    }
                    Ok(cart)
                })
            })
            .await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "Added to cart");
        cart_details(self.uow.repositories(), cart).await
    }

    async fn remove(&self, actor: &Actor, item_id: Uuid) -> AppResult<CartDetails> {
        let repos = self.uow.repositories();
        let item = repos
            .carts()
            .find_item_by_id(item_id)
            .await?
            .ok_or_not_found()?;

        let owned = repos
            .carts()
            .find_by_id(item.cart_id)
            .await?
            .is_some_and(|cart| cart.user_id == actor.id);
        if !owned {
            tracing::warn!(user_id = %actor.id, item_id = %item_id, "Cart item removal refused");
            return Err(AppError::forbidden(
                "You are not authorized to remove this item.",
            ));
        }

        repos.carts().delete_item(item.id).await?;
        self.get(actor).await
    }

    async fn clear(&self, actor: &Actor) -> AppResult<CartDetails> {
        let repos = self.uow.repositories();
        let cart = cart_for(repos, actor.id).await?;

        let removed = repos.carts().clear(cart.id).await?;
        tracing::info!(user_id = %actor.id, removed, "Cart cleared");
        cart_details(repos, cart).await
    }
}

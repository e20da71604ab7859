//! Helpers shared by the catalog, cart and order services.

use std::collections::HashMap;
use std::future::Future;

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::domain::slug::{slug_with_suffix, slugify};
use crate::domain::{
    Actor, Category, CategoryDetails, Order, OrderDetails, OrderLine, Product, ProductDetails,
};
use crate::errors::{AppError, AppResult};
use crate::infra::Repositories;

/// Catalog mutations are admin-only.
pub(crate) fn ensure_admin(actor: &Actor) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.id, "Admin action refused");
        Err(AppError::forbidden(""))
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
pub(crate) async fn unique_slug<F, Fut>(name: &str, fallback: &str, taken: F) -> AppResult<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    let mut base = slugify(name);
    if base.is_empty() {
        base = fallback.to_string();
    }

    let mut attempt = 1;
    loop {
        let candidate = slug_with_suffix(&base, attempt);
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

/// Attach categories to each product, preserving order.
pub(crate) async fn product_details<C: ConnectionTrait>(
    repos: Repositories<'_, C>,
    products: Vec<Product>,
) -> AppResult<Vec<ProductDetails>> {
    let ids: Vec<Uuid> = products.iter().map(|product| product.id).collect();
    let mut categories = repos.products().categories_by_product(&ids).await?;

    Ok(products
        .into_iter()
        .map(|product| ProductDetails {
            categories: categories.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect())
}

/// Attach live products to each category, preserving order.
pub(crate) async fn category_details<C: ConnectionTrait>(
    repos: Repositories<'_, C>,
    categories: Vec<Category>,
) -> AppResult<Vec<CategoryDetails>> {
    let ids: Vec<Uuid> = categories.iter().map(|category| category.id).collect();
    let mut products = repos.categories().products_by_category(&ids).await?;

    Ok(categories
        .into_iter()
        .map(|category| CategoryDetails {
            products: products.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect())
}

/// Attach line items and their products (trashed included) to each order.
pub(crate) async fn order_details<C: ConnectionTrait>(
    repos: Repositories<'_, C>,
    orders: Vec<Order>,
) -> AppResult<Vec<OrderDetails>> {
    let ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let mut items = repos.orders().items_by_order(&ids).await?;

    let product_ids: Vec<Uuid> = items
        .values()
        .flatten()
        .map(|item| item.product_id)
        .collect();
    let products: HashMap<Uuid, Product> = repos
        .products()
        .find_many_with_deleted(&product_ids)
        .await?;

    orders
        .into_iter()
        .map(|order| {
            let lines = items
                .remove(&order.id)
                .unwrap_or_default()
                .into_iter()
                .map(|item| {
                    let product = products.get(&item.product_id).cloned().ok_or_else(|| {
                        AppError::internal(format!("Order item {} has no product", item.id))
                    })?;
                    Ok(OrderLine { item, product })
                })
                .collect::<AppResult<Vec<_>>>()?;
            Ok(OrderDetails { order, lines })
        })
        .collect()
}

//! Product catalog service.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::common::{ensure_admin, product_details, unique_slug};
use crate::domain::slug::title_case;
use crate::domain::{Actor, NewProduct, Product, ProductChanges, ProductDetails, ProductFilter};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{FieldErrors, Paginated, PaginationParams};

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Live products matching the filters, with their categories
    async fn list(
        &self,
        filter: ProductFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<ProductDetails>>;

    async fn show(&self, slug: &str) -> AppResult<ProductDetails>;

    async fn create(&self, actor: &Actor, input: NewProduct) -> AppResult<ProductDetails>;

    async fn update(
        &self,
        actor: &Actor,
        slug: &str,
        changes: ProductChanges,
    ) -> AppResult<ProductDetails>;

    /// Soft delete
    async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()>;

    async fn trashed(
        &self,
        actor: &Actor,
        params: PaginationParams,
    ) -> AppResult<Paginated<ProductDetails>>;

    async fn restore(&self, actor: &Actor, slug: &str) -> AppResult<ProductDetails>;

    /// Permanent delete of a trashed product without order history
    async fn force_delete(&self, actor: &Actor, slug: &str) -> AppResult<()>;
}

pub struct ProductManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ProductManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Every id must name an existing category; errors are keyed by position.
    async fn check_categories(&self, ids: &[Uuid]) -> AppResult<()> {
        if ids.is_empty() {
            return Err(AppError::validation(
                "categories",
                "The Categories field is required.",
            ));
        }

        let found = self.uow.repositories().categories().find_many(ids).await?;
        let mut errors = FieldErrors::new();
        for (index, id) in ids.iter().enumerate() {
            if !found.iter().any(|category| category.id == *id) {
                errors.add(
                    format!("categories.{}", index),
                    "The selected Categories is invalid.",
                );
            }
        }
        errors.into_result()
    }

    async fn details(&self, product: Product) -> AppResult<ProductDetails> {
        product_details(self.uow.repositories(), vec![product])
            .await?
            .pop()
            .ok_or_not_found()
    }

    async fn page(
        &self,
        products: Vec<Product>,
        total: u64,
        params: &PaginationParams,
    ) -> AppResult<Paginated<ProductDetails>> {
        let items = product_details(self.uow.repositories(), products).await?;
        Ok(Paginated::new(items, params, total))
    }
}

#[async_trait]
impl<U: UnitOfWork> ProductService for ProductManager<U> {
    async fn list(
        &self,
        filter: ProductFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<ProductDetails>> {
        let (products, total) = self
            .uow
            .repositories()
            .products()
            .search(&filter, &params)
            .await?;
        self.page(products, total, &params).await
    }

    async fn show(&self, slug: &str) -> AppResult<ProductDetails> {
        let product = self
            .uow
            .repositories()
            .products()
            .find_by_slug(slug)
            .await?
            .ok_or_not_found()?;
        self.details(product).await
    }

    async fn create(&self, actor: &Actor, mut input: NewProduct) -> AppResult<ProductDetails> {
        ensure_admin(actor)?;
        self.check_categories(&input.category_ids).await?;
        input.name = title_case(&input.name);

        let product = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let slug = unique_slug(&input.name, "product", |candidate| async move {
                        tx.products().slug_taken(&candidate).await
                    })
                    .await?;

                    let product = tx.products().create(&input, slug).await?;
                    tx.products()
                        .sync_categories(product.id, &input.category_ids)
                        .await?;
                    Ok(product)
                })
            })
            .await?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        self.details(product).await
    }

    async fn update(
        &self,
        actor: &Actor,
        slug: &str,
        mut changes: ProductChanges,
    ) -> AppResult<ProductDetails> {
        ensure_admin(actor)?;
        let existing = self
            .uow
            .repositories()
            .products()
            .find_by_slug(slug)
            .await?
            .ok_or_not_found()?;

        if let Some(ids) = &changes.category_ids {
            self.check_categories(ids).await?;
        }
        changes.name = changes.name.as_deref().map(title_case);

        let id = existing.id;
        let product = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let product = tx.products().update(id, &changes).await?;
                    if let Some(ids) = &changes.category_ids {
                        tx.products().sync_categories(id, ids).await?;
                    }
                    Ok(product)
                })
            })
            .await?;

        tracing::info!(product_id = %product.id, "Product updated");
        self.details(product).await
    }

    async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        ensure_admin(actor)?;
        let products = self.uow.repositories().products();
        let product = products.find_by_slug(slug).await?.ok_or_not_found()?;

        products.soft_delete(product.id).await?;
        tracing::info!(product_id = %product.id, "Product moved to trash");
        Ok(())
    }

    async fn trashed(
        &self,
        actor: &Actor,
        params: PaginationParams,
    ) -> AppResult<Paginated<ProductDetails>> {
        ensure_admin(actor)?;
        let (products, total) = self
            .uow
            .repositories()
            .products()
            .paginate_trashed(&params)
            .await?;
        self.page(products, total, &params).await
    }

    async fn restore(&self, actor: &Actor, slug: &str) -> AppResult<ProductDetails> {
        ensure_admin(actor)?;
        let products = self.uow.repositories().products();
        let trashed = products
            .find_trashed_by_slug(slug)
            .await?
            .ok_or_not_found()?;

        let product = products.restore(trashed.id).await?;
        tracing::info!(product_id = %product.id, "Product restored");
        self.details(product).await
    }

    async fn force_delete(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        ensure_admin(actor)?;
        let repos = self.uow.repositories();
        let product = repos
            .products()
            .find_trashed_by_slug(slug)
            .await?
            .ok_or_not_found()?;

        let id = product.id;
        crate::with_transaction!(self.uow, |tx| {
            // Checked under the same transaction as the delete
            if tx.orders().product_has_orders(id).await? {
                return Err(AppError::bad_request(
                    "Cannot permanently delete a product with order history.",
                ));
            }
            tx.products().force_delete(id).await
        })?;

        tracing::info!(product_id = %id, "Product permanently deleted");
        Ok(())
    }
}

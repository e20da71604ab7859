//! Category service with cache-aside reads.
//!
//! Listing pages are cached per page size and page number for the fixed
//! page-size variants and the first `CATEGORY_CACHE_MAX_PAGES` pages only,
//! single categories per id. Every mutation
//! evicts all listing keys and, when known, the category's own key.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::common::{category_details, ensure_admin, unique_slug};
use crate::config::{
    CACHE_PREFIX_CATEGORY, CACHE_PREFIX_CATEGORY_LIST, CATEGORY_CACHE_MAX_PAGES,
    CATEGORY_CACHE_PAGE_SIZES, DEFAULT_CACHE_TTL_SECONDS,
};
use crate::domain::slug::title_case;
use crate::domain::{Actor, Category, CategoryDetails};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{CacheStore, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

pub fn list_cache_key(per_page: u64, page: u64) -> String {
    format!("{}{}:page:{}", CACHE_PREFIX_CATEGORY_LIST, per_page, page)
}

pub fn category_cache_key(id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_CATEGORY, id)
}

#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn list(&self, params: PaginationParams) -> AppResult<Paginated<CategoryDetails>>;

    async fn show(&self, slug: &str) -> AppResult<CategoryDetails>;

    async fn create(&self, actor: &Actor, name: String) -> AppResult<CategoryDetails>;

    /// Rename; `None` leaves the category as is
    async fn update(
        &self,
        actor: &Actor,
        slug: &str,
        name: Option<String>,
    ) -> AppResult<CategoryDetails>;

    async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()>;
}

pub struct CategoryManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
}

impl<U: UnitOfWork> CategoryManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>) -> Self {
        Self { uow, cache }
    }

    async fn load_page(&self, params: PaginationParams) -> AppResult<Paginated<CategoryDetails>> {
        let repos = self.uow.repositories();
        let (categories, total) = repos.categories().paginate(&params).await?;
        let items = category_details(repos, categories).await?;
        Ok(Paginated::new(items, &params, total))
    }

    async fn load_one(&self, category: Category) -> AppResult<CategoryDetails> {
        category_details(self.uow.repositories(), vec![category])
            .await?
            .pop()
            .ok_or_not_found()
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        if self
            .uow
            .repositories()
            .categories()
            .name_taken(name, except)
            .await?
        {
            return Err(AppError::validation(
                "name",
                "The Name has already been taken.",
            ));
        }
        Ok(())
    }

    async fn invalidate(&self, id: Option<Uuid>) {
        let mut keys: Vec<String> = CATEGORY_CACHE_PAGE_SIZES
            .iter()
            .flat_map(|&per_page| {
                (1..=CATEGORY_CACHE_MAX_PAGES).map(move |page| list_cache_key(per_page, page))
            })
            .collect();
        if let Some(id) = id {
            keys.push(category_cache_key(id));
        }

        if let Err(e) = self.cache.delete_many(&keys).await {
            tracing::warn!(error = %e, "Failed to invalidate category cache");
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> CategoryService for CategoryManager<U> {
    async fn list(&self, params: PaginationParams) -> AppResult<Paginated<CategoryDetails>> {
        let per_page = params.limit();
        // Only pages that invalidation evicts may be cached
        if !CATEGORY_CACHE_PAGE_SIZES.contains(&per_page)
            || params.page() > CATEGORY_CACHE_MAX_PAGES
        {
            return self.load_page(params).await;
        }

        let key = list_cache_key(per_page, params.page());
        self.cache
            .remember(&key, DEFAULT_CACHE_TTL_SECONDS, || self.load_page(params))
            .await
    }

    async fn show(&self, slug: &str) -> AppResult<CategoryDetails> {
        let category = self
            .uow
            .repositories()
            .categories()
            .find_by_slug(slug)
            .await?
            .ok_or_not_found()?;

        let key = category_cache_key(category.id);
        self.cache
            .remember(&key, DEFAULT_CACHE_TTL_SECONDS, || self.load_one(category))
            .await
    }

    async fn create(&self, actor: &Actor, name: String) -> AppResult<CategoryDetails> {
        ensure_admin(actor)?;
        let name = title_case(&name);
        self.ensure_name_free(&name, None).await?;

        let repos = self.uow.repositories();
        let slug = unique_slug(&name, "category", |candidate| async move {
            repos.categories().slug_taken(&candidate).await
        })
        .await?;
        let category = repos.categories().create(name, slug).await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        self.invalidate(None).await;
        self.load_one(category).await
    }

    async fn update(
        &self,
        actor: &Actor,
        slug: &str,
        name: Option<String>,
    ) -> AppResult<CategoryDetails> {
        ensure_admin(actor)?;
        let categories = self.uow.repositories().categories();
        let mut category = categories.find_by_slug(slug).await?.ok_or_not_found()?;

        let name = name.map(|n| title_case(&n)).filter(|n| !n.is_empty());
        if let Some(name) = name {
            self.ensure_name_free(&name, Some(category.id)).await?;
            category = categories.rename(category.id, name).await?;
            tracing::info!(category_id = %category.id, "Category renamed");
        }

        self.invalidate(Some(category.id)).await;
        self.load_one(category).await
    }

    async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        ensure_admin(actor)?;
        let category = self
            .uow
            .repositories()
            .categories()
            .find_by_slug(slug)
            .await?
            .ok_or_not_found()?;

        let id = category.id;
        crate::with_transaction!(self.uow, |tx| tx.categories().delete(id).await)?;

        tracing::info!(category_id = %id, "Category deleted");
        self.invalidate(Some(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys() {
        assert_eq!(list_cache_key(15, 2), "categories:list:per_page:15:page:2");

        let id = Uuid::nil();
        assert_eq!(
            category_cache_key(id),
            "category:00000000-0000-0000-0000-000000000000"
        );
    }
}

//! Product repository implementation with soft delete support.
//!
//! Query methods exclude trashed products unless their name says otherwise.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::base::fetch_page;
use super::entities::product::{self, ActiveModel, Entity as ProductEntity};
use super::entities::{category, category_product};
use crate::domain::{Category, NewProduct, Product, ProductChanges, ProductFilter, ProductStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

pub struct ProductRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ProductRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn live() -> Select<ProductEntity> {
        ProductEntity::find().filter(product::Column::DeletedAt.is_null())
    }

    fn trashed() -> Select<ProductEntity> {
        ProductEntity::find().filter(product::Column::DeletedAt.is_not_null())
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let result = Self::live()
            .filter(product::Column::Id.eq(id))
            .one(self.conn)
            .await?;
        Ok(result.map(Product::from))
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        let result = Self::live()
            .filter(product::Column::Slug.eq(slug))
            .one(self.conn)
            .await?;
        Ok(result.map(Product::from))
    }

    /// Only matches products that are currently trashed
    pub async fn find_trashed_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        let result = Self::trashed()
            .filter(product::Column::Slug.eq(slug))
            .one(self.conn)
            .await?;
        Ok(result.map(Product::from))
    }

    /// Live and trashed products, keyed by id
    pub async fn find_many_with_deleted(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = ProductEntity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| (model.id, Product::from(model)))
            .collect())
    }

    /// Slugs stay reserved while a product sits in the trash.
    pub async fn slug_taken(&self, slug: &str) -> AppResult<bool> {
        let count = ProductEntity::find()
            .filter(product::Column::Slug.eq(slug))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn search(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)> {
        let mut select = Self::live();

        if let Some(slug) = filter.category.as_deref() {
            let in_category = Query::select()
                .column((category_product::Entity, category_product::Column::ProductId))
                .from(category_product::Entity)
                .inner_join(
                    category::Entity,
                    Expr::col((category::Entity, category::Column::Id)).equals((
                        category_product::Entity,
                        category_product::Column::CategoryId,
                    )),
                )
                .and_where(Expr::col((category::Entity, category::Column::Slug)).eq(slug))
                .to_owned();
            select = select.filter(product::Column::Id.in_subquery(in_category));
        }
        if let Some(min) = filter.price_min {
            select = select.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = filter.price_max {
            select = select.filter(product::Column::Price.lte(max));
        }
        match filter.in_stock {
            Some(true) => select = select.filter(product::Column::Quantity.gt(0)),
            Some(false) => select = select.filter(product::Column::Quantity.eq(0)),
            None => {}
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((product::Entity, product::Column::Name))))
                    .like(pattern),
            );
        }

        let select = select
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Name);
        let (models, total) = fetch_page(self.conn, select, params).await?;
        Ok((models.into_iter().map(Product::from).collect(), total))
    }

    pub async fn paginate_trashed(
        &self,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)> {
        let select = Self::trashed().order_by_desc(product::Column::DeletedAt);
        let (models, total) = fetch_page(self.conn, select, params).await?;
        Ok((models.into_iter().map(Product::from).collect(), total))
    }

    pub async fn create(&self, new_product: &NewProduct, slug: String) -> AppResult<Product> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_product.name.clone()),
            slug: Set(slug),
            description: Set(new_product.description.clone()),
            price: Set(new_product.price),
            quantity: Set(new_product.quantity),
            status: Set(new_product.status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Product::from(model))
    }

    /// Apply the allow-listed changes to a live product. Category membership
    /// is handled by [`Self::sync_categories`].
    pub async fn update(&self, id: Uuid, changes: &ProductChanges) -> AppResult<Product> {
        let model = Self::live()
            .filter(product::Column::Id.eq(id))
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        if let Some(name) = &changes.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &changes.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(quantity) = changes.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.to_string());
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Product::from(model))
    }

    pub async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let now = Utc::now();
        let result = ProductEntity::update_many()
            .col_expr(product::Column::DeletedAt, Expr::value(now))
            .col_expr(product::Column::UpdatedAt, Expr::value(now))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::DeletedAt.is_null())
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> AppResult<Product> {
        let model = Self::trashed()
            .filter(product::Column::Id.eq(id))
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Product::from(model))
    }

    /// Permanently remove a product and its category links
    pub async fn force_delete(&self, id: Uuid) -> AppResult<()> {
        category_product::Entity::delete_many()
            .filter(category_product::Column::ProductId.eq(id))
            .exec(self.conn)
            .await?;

        let result = ProductEntity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Categories of each product, keyed by product id
    pub async fn categories_by_product(
        &self,
        product_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<Category>>> {
        let mut grouped: HashMap<Uuid, Vec<Category>> = HashMap::new();
        if product_ids.is_empty() {
            return Ok(grouped);
        }

        let links = category_product::Entity::find()
            .filter(category_product::Column::ProductId.is_in(product_ids.iter().copied()))
            .all(self.conn)
            .await?;
        if links.is_empty() {
            return Ok(grouped);
        }

        let category_ids: Vec<Uuid> = links.iter().map(|link| link.category_id).collect();
        let categories: HashMap<Uuid, Category> = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|model| (model.id, Category::from(model)))
            .collect();

        for link in links {
            if let Some(category) = categories.get(&link.category_id) {
                grouped
                    .entry(link.product_id)
                    .or_default()
                    .push(category.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(grouped)
    }

    /// Replace the product's category membership
    pub async fn sync_categories(&self, product_id: Uuid, category_ids: &[Uuid]) -> AppResult<()> {
        category_product::Entity::delete_many()
            .filter(category_product::Column::ProductId.eq(product_id))
            .exec(self.conn)
            .await?;

        let mut unique = category_ids.to_vec();
        unique.sort();
        unique.dedup();
        if unique.is_empty() {
            return Ok(());
        }

        let links = unique.into_iter().map(|category_id| category_product::ActiveModel {
            category_id: Set(category_id),
            product_id: Set(product_id),
        });
        category_product::Entity::insert_many(links)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Re-read the given products with a row-level write lock, keeping only
    /// those that are active, in stock and not trashed.
    pub async fn lock_available(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Self::live()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .filter(product::Column::Status.eq(ProductStatus::Active.as_str()))
            .filter(product::Column::Quantity.gt(0))
            .order_by_asc(product::Column::Id)
            .lock_exclusive()
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Product::from).collect())
    }

    pub async fn decrement_stock(&self, id: Uuid, quantity: i32) -> AppResult<()> {
        self.adjust_stock(id, -quantity).await
    }

    /// Trashed products get their stock back too
    pub async fn increment_stock(&self, id: Uuid, quantity: i32) -> AppResult<()> {
        self.adjust_stock(id, quantity).await
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32) -> AppResult<()> {
        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).add(delta),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

//! Category repository implementation.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::fetch_page;
use super::entities::category::{self, ActiveModel, Entity as CategoryEntity};
use super::entities::{category_product, product};
use crate::domain::{Category, Product};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

pub struct CategoryRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CategoryRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find_by_id(id).one(self.conn).await?;
        Ok(result.map(Category::from))
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.conn)
            .await?;
        Ok(result.map(Category::from))
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = CategoryEntity::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    /// Whether another category already uses this name.
    pub async fn name_taken(&self, name: &str, except: Option<Uuid>) -> AppResult<bool> {
        let mut condition = Condition::all().add(category::Column::Name.eq(name));
        if let Some(id) = except {
            condition = condition.add(category::Column::Id.ne(id));
        }

        let count = CategoryEntity::find()
            .filter(condition)
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn slug_taken(&self, slug: &str) -> AppResult<bool> {
        let count = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn paginate(&self, params: &PaginationParams) -> AppResult<(Vec<Category>, u64)> {
        let select = CategoryEntity::find()
            .order_by_asc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Name);

        let (models, total) = fetch_page(self.conn, select, params).await?;
        Ok((models.into_iter().map(Category::from).collect(), total))
    }

    pub async fn create(&self, name: String, slug: String) -> AppResult<Category> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Category::from(model))
    }

    /// Change the name. The slug stays as it was.
    pub async fn rename(&self, id: Uuid, name: String) -> AppResult<Category> {
        let model = CategoryEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Category::from(model))
    }

    /// Hard delete; membership rows go with it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        category_product::Entity::delete_many()
            .filter(category_product::Column::CategoryId.eq(id))
            .exec(self.conn)
            .await?;

        let result = CategoryEntity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Live products of each category, keyed by category id.
    pub async fn products_by_category(
        &self,
        category_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<Product>>> {
        let mut grouped: HashMap<Uuid, Vec<Product>> = HashMap::new();
        if category_ids.is_empty() {
            return Ok(grouped);
        }

        let links = category_product::Entity::find()
            .filter(category_product::Column::CategoryId.is_in(category_ids.iter().copied()))
            .all(self.conn)
            .await?;
        if links.is_empty() {
            return Ok(grouped);
        }

        let product_ids: Vec<Uuid> = links.iter().map(|link| link.product_id).collect();
        let products: HashMap<Uuid, Product> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .filter(product::Column::DeletedAt.is_null())
            .order_by_asc(product::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(|model| (model.id, Product::from(model)))
            .collect();

        for link in links {
            if let Some(product) = products.get(&link.product_id) {
                grouped
                    .entry(link.category_id)
                    .or_default()
                    .push(product.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(grouped)
    }
}

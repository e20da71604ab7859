//! Repository access shared by pooled connections and transactions.
//!
//! Every repository borrows a `ConnectionTrait` implementor, so the same
//! query code runs against `DatabaseConnection` or a `DatabaseTransaction`.

use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, Select};

use super::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository, UserRepository,
};
use crate::errors::AppResult;
use crate::types::PaginationParams;

/// Entry point to all repositories over one connection.
pub struct Repositories<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> Clone for Repositories<'a, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, C: ConnectionTrait> Copy for Repositories<'a, C> {}

impl<'a, C: ConnectionTrait> Repositories<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'a C {
        self.conn
    }

    pub fn users(&self) -> UserRepository<'a, C> {
        UserRepository::new(self.conn)
    }

    pub fn categories(&self) -> CategoryRepository<'a, C> {
        CategoryRepository::new(self.conn)
    }

    pub fn products(&self) -> ProductRepository<'a, C> {
        ProductRepository::new(self.conn)
    }

    pub fn carts(&self) -> CartRepository<'a, C> {
        CartRepository::new(self.conn)
    }

    pub fn orders(&self) -> OrderRepository<'a, C> {
        OrderRepository::new(self.conn)
    }
}

/// Run a select as one page, returning the rows and the total row count.
pub(crate) async fn fetch_page<C, E>(
    conn: &C,
    select: Select<E>,
    params: &PaginationParams,
) -> AppResult<(Vec<E::Model>, u64)>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync + 'static,
{
    let paginator = select.paginate(conn, params.limit());
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(params.page() - 1).await?;
    Ok((rows, total))
}

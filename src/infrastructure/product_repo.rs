use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::StockLedger;
use crate::domain::product::Product;
use crate::schema::products;

use super::models::ProductRow;

/// Unlocked reads of the `products` table, used by the cart.
pub struct DieselStockLedger {
    pool: DbPool,
}

impl DieselStockLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl StockLedger for DieselStockLedger {
    fn get(&self, id: Uuid) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Product::from)
            .ok_or(DomainError::NotFound("product"))
    }
}

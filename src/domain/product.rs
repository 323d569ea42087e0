use bigdecimal::BigDecimal;
use uuid::Uuid;

/// A catalog entry as seen by the cart and order assembly.
///
/// `available` only controls catalog visibility; `stock` is the number of
/// units that may still be sold.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: BigDecimal,
    pub stock: i32,
    pub available: bool,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

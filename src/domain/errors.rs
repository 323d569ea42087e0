use thiserror::Error;

use super::stock::StockReport;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Sorry, {product} is currently out of stock.")]
    OutOfStock { product: String },

    #[error("Sorry, only {available} units of {product} are available.")]
    InsufficientStock { product: String, available: i32 },

    #[error("Order could not be placed: {0}")]
    OrderValidationFailed(StockReport),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stock errors are shown to the shopper; everything else is not.
    pub fn is_stock_error(&self) -> bool {
        matches!(
            self,
            DomainError::OutOfStock { .. }
                | DomainError::InsufficientStock { .. }
                | DomainError::OrderValidationFailed(_)
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("session data: {e}"))
    }
}

//! Stock checks shared by the cart and order assembly.
//!
//! [`check_add`] is the advisory time-of-check run on every cart add. It gives
//! quick feedback but is not a guarantee: stock can move before checkout.
//! [`validate_lines`] is run by the repositories while the product rows are
//! locked and is the only check that protects the stock counter.

use std::fmt;

use uuid::Uuid;

use super::errors::DomainError;
use super::order::OrderLineInput;
use super::product::Product;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortfall {
    OutOfStock,
    Insufficient { available: i32 },
    /// The product was removed from the catalog after it was carted.
    Discontinued,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockViolation {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub requested: i32,
    pub shortfall: Shortfall,
}

impl fmt::Display for StockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .product_name
            .clone()
            .unwrap_or_else(|| format!("Product {}", self.product_id));
        match self.shortfall {
            Shortfall::OutOfStock => write!(f, "{name} is out of stock."),
            Shortfall::Insufficient { available } => write!(
                f,
                "Only {available} units of {name} are available (you requested {}).",
                self.requested
            ),
            Shortfall::Discontinued => write!(f, "{name} is no longer available."),
        }
    }
}

/// Every line that failed validation for one checkout attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReport {
    violations: Vec<StockViolation>,
}

impl StockReport {
    pub fn push(&mut self, violation: StockViolation) {
        self.violations.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[StockViolation] {
        &self.violations
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::OrderValidationFailed(self))
        }
    }
}

impl fmt::Display for StockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(" "))
    }
}

/// Time-of-check validation for a single cart add.
///
/// `in_cart` is the quantity already held for this product in the session cart.
pub fn check_add(
    product: &Product,
    in_cart: i32,
    requested: i32,
    override_quantity: bool,
) -> Result<(), DomainError> {
    if product.stock <= 0 {
        return Err(DomainError::OutOfStock {
            product: product.name.clone(),
        });
    }

    let effective_total = if override_quantity {
        requested
    } else {
        in_cart.saturating_add(requested)
    };

    if effective_total > product.stock {
        return Err(DomainError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
        });
    }

    Ok(())
}

/// Checks every line against the given product rows and collects all failures.
///
/// `products` must hold the current (locked) state of the referenced rows; a
/// line whose product is absent is reported as [`Shortfall::Discontinued`].
pub fn validate_lines(lines: &[OrderLineInput], products: &[Product]) -> StockReport {
    let mut report = StockReport::default();

    for line in lines {
        let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
            report.push(StockViolation {
                product_id: line.product_id,
                product_name: None,
                requested: line.quantity,
                shortfall: Shortfall::Discontinued,
            });
            continue;
        };

        if line.quantity > product.stock {
            let shortfall = if product.stock <= 0 {
                Shortfall::OutOfStock
            } else {
                Shortfall::Insufficient {
                    available: product.stock,
                }
            };
            report.push(StockViolation {
                product_id: product.id,
                product_name: Some(product.name.clone()),
                requested: line.quantity,
                shortfall,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;

    fn product(name: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            price: BigDecimal::from_str("799.99").expect("valid decimal"),
            stock,
            available: true,
        }
    }

    fn line(product: &Product, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: product.id,
            quantity,
            price: product.price.clone(),
        }
    }

    #[test]
    fn zero_stock_is_out_of_stock_even_with_override() {
        let p = product("Google Pixel 8", 0);
        let err = check_add(&p, 0, 1, true).unwrap_err();
        assert!(matches!(err, DomainError::OutOfStock { .. }));
    }

    #[test]
    fn additive_add_counts_existing_cart_quantity() {
        let p = product("iPhone 15 Pro", 5);
        assert!(check_add(&p, 3, 2, false).is_ok());

        let err = check_add(&p, 3, 3, false).unwrap_err();
        match err {
            DomainError::InsufficientStock { available, .. } => assert_eq!(available, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn override_add_ignores_existing_cart_quantity() {
        let p = product("iPhone 15 Pro", 5);
        assert!(check_add(&p, 4, 5, true).is_ok());
        assert!(check_add(&p, 0, 6, true).is_err());
    }

    #[test]
    fn insufficient_stock_message_states_available_units() {
        let p = product("Sony Xperia", 2);
        let err = check_add(&p, 0, 3, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sorry, only 2 units of Sony Xperia are available."
        );
    }

    #[test]
    fn validate_lines_collects_every_violation() {
        let sold_out = product("Pixel", 0);
        let scarce = product("Galaxy", 1);
        let plenty = product("Xperia", 10);
        let gone = product("Nokia", 5);

        let lines = vec![
            line(&sold_out, 1),
            line(&scarce, 2),
            line(&plenty, 3),
            line(&gone, 1),
        ];
        let report = validate_lines(&lines, &[sold_out.clone(), scarce.clone(), plenty]);

        let shortfalls: Vec<_> = report.violations().iter().map(|v| v.shortfall.clone()).collect();
        assert_eq!(
            shortfalls,
            vec![
                Shortfall::OutOfStock,
                Shortfall::Insufficient { available: 1 },
                Shortfall::Discontinued,
            ]
        );
        assert_eq!(report.messages()[0], "Pixel is out of stock.");
        assert_eq!(
            report.messages()[1],
            "Only 1 units of Galaxy are available (you requested 2)."
        );
    }

    #[test]
    fn validate_lines_accepts_exact_stock() {
        let p = product("Pixel", 3);
        assert!(validate_lines(&[line(&p, 3)], &[p.clone()]).into_result().is_ok());
    }
}

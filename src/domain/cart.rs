//! The session-held shopping cart.

use std::fmt;

use bigdecimal::BigDecimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::OrderLineInput;
use super::ports::StockLedger;
use super::product::Product;
use super::session::{SessionStore, CART_KEY};

/// Quantity and price snapshot for one product in the cart.
///
/// `price` is captured when the line is created and never re-read from the
/// product afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub quantity: i32,
    pub price: BigDecimal,
}

/// Insertion-ordered map from product id (string form) to [`CartLine`].
///
/// Serializes as a JSON object so the session layout stays
/// `{"<product id>": {"quantity": .., "price": ".."}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<(String, CartLine)>,
}

/// A cart line joined with the live product it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub price: BigDecimal,
    pub quantity: i32,
}

impl CartItem {
    pub fn total_price(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units, or sets the line to exactly `quantity` when
    /// `override_quantity` is true. No stock check happens here.
    ///
    /// An existing line keeps its original price snapshot in both modes.
    pub fn add(&mut self, product: &Product, quantity: i32, override_quantity: bool) {
        let key = product.id.to_string();
        match self.lines.iter_mut().find(|(id, _)| *id == key) {
            Some((_, line)) => {
                if override_quantity {
                    line.quantity = quantity;
                } else {
                    line.quantity = line.quantity.saturating_add(quantity);
                }
            }
            None => self.lines.push((
                key,
                CartLine {
                    quantity,
                    price: product.price.clone(),
                },
            )),
        }
    }

    /// Drops the line for `product_id`; returns whether one existed.
    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let key = product_id.to_string();
        let before = self.lines.len();
        self.lines.retain(|(id, _)| *id != key);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn quantity_of(&self, product_id: Uuid) -> i32 {
        let key = product_id.to_string();
        self.lines
            .iter()
            .find(|(id, _)| *id == key)
            .map_or(0, |(_, line)| line.quantity)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = (&str, &CartLine)> {
        self.lines.iter().map(|(id, line)| (id.as_str(), line))
    }

    /// Lazily resolves each line against the ledger, in insertion order.
    ///
    /// Products are looked up fresh on every call, so stock and names are
    /// current while prices stay at their snapshot.
    pub fn items<'a, L>(&'a self, ledger: &'a L) -> impl Iterator<Item = Result<CartItem, DomainError>> + 'a
    where
        L: StockLedger + ?Sized,
    {
        self.lines.iter().map(move |(id, line)| {
            let product_id =
                Uuid::parse_str(id).map_err(|_| DomainError::NotFound("product"))?;
            let product = ledger.get(product_id)?;
            Ok(CartItem {
                product,
                price: line.price.clone(),
                quantity: line.quantity,
            })
        })
    }

    /// Σ price × quantity, recomputed on every call.
    pub fn total_price(&self) -> BigDecimal {
        self.lines.iter().fold(BigDecimal::from(0), |acc, (_, line)| {
            acc + &line.price * BigDecimal::from(line.quantity)
        })
    }

    /// The lines in the shape order assembly consumes.
    pub fn to_order_lines(&self) -> Result<Vec<OrderLineInput>, DomainError> {
        self.lines
            .iter()
            .map(|(id, line)| {
                let product_id = Uuid::parse_str(id).map_err(|_| {
                    DomainError::InvalidInput(format!("malformed product id '{id}' in cart"))
                })?;
                Ok(OrderLineInput {
                    product_id,
                    quantity: line.quantity,
                    price: line.price.clone(),
                })
            })
            .collect()
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.lines.len()))?;
        for (id, line) in &self.lines {
            map.serialize_entry(id, line)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CartVisitor;

        impl<'de> Visitor<'de> for CartVisitor {
            type Value = Cart;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of product ids to cart lines")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Cart, A::Error> {
                let mut lines = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, line)) = access.next_entry::<String, CartLine>()? {
                    lines.push((id, line));
                }
                Ok(Cart { lines })
            }
        }

        deserializer.deserialize_map(CartVisitor)
    }
}

/// A [`Cart`] bound to the session it was read from.
///
/// Every mutation is written straight back to the session, which marks it
/// modified.
pub struct SessionCart<'s, S: SessionStore> {
    session: &'s mut S,
    cart: Cart,
}

impl<'s, S: SessionStore> SessionCart<'s, S> {
    pub fn open(session: &'s mut S) -> Result<Self, DomainError> {
        let cart = session.get(CART_KEY)?.unwrap_or_default();
        Ok(Self { session, cart })
    }

    pub fn add(
        &mut self,
        product: &Product,
        quantity: i32,
        override_quantity: bool,
    ) -> Result<(), DomainError> {
        self.cart.add(product, quantity, override_quantity);
        self.save()
    }

    pub fn remove(&mut self, product_id: Uuid) -> Result<bool, DomainError> {
        let removed = self.cart.remove(product_id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.session.remove(CART_KEY);
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    fn save(&mut self) -> Result<(), DomainError> {
        self.session.insert(CART_KEY, &self.cart)
    }
}

impl<S: SessionStore> fmt::Debug for SessionCart<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCart").field("cart", &self.cart).finish()
    }
}

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, SessionCart};
use crate::domain::errors::DomainError;
use crate::domain::pending::PendingIntent;
use crate::domain::ports::StockLedger;
use crate::domain::product::Product;
use crate::domain::session::{current_user, push_notice, Notice, SessionStore, CART_KEY};
use crate::domain::stock::check_add;

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Product),
    /// The caller is anonymous; the add was parked as a pending intent.
    LoginRequired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// Nothing was pending, or the caller has not logged in yet.
    Noop,
    Added(Product),
    /// The replayed add failed its stock check; the message was queued as a notice.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct CartService<L> {
    ledger: L,
}

impl<L: StockLedger> CartService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn add_to_cart<S: SessionStore>(
        &self,
        session: &mut S,
        product_id: Uuid,
        quantity: i32,
        override_quantity: bool,
    ) -> Result<AddOutcome, DomainError> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        let product = self.ledger.get(product_id)?;

        if current_user(session)?.is_none() {
            PendingIntent {
                product_id,
                quantity,
                override_quantity,
            }
            .stash(session)?;
            log::info!(
                "Anonymous add of {} x {} parked until login",
                quantity,
                product.name
            );
            return Ok(AddOutcome::LoginRequired);
        }

        self.checked_add(session, &product, quantity, override_quantity)?;
        Ok(AddOutcome::Added(product))
    }

    /// Replays the session's pending add, if any, once the caller is logged in.
    pub fn resume_pending_add<S: SessionStore>(
        &self,
        session: &mut S,
    ) -> Result<ResumeOutcome, DomainError> {
        if current_user(session)?.is_none() {
            return Ok(ResumeOutcome::Noop);
        }
        let intent = match PendingIntent::take(session) {
            Ok(Some(intent)) => intent,
            Ok(None) => return Ok(ResumeOutcome::Noop),
            Err(e) => {
                log::warn!("Discarding unreadable pending cart add: {}", e);
                return Ok(ResumeOutcome::Noop);
            }
        };

        let replayed = match self.ledger.get(intent.product_id) {
            Ok(product) => self
                .checked_add(session, &product, intent.quantity, intent.override_quantity)
                .map(|()| product),
            Err(e) => Err(e),
        };

        match replayed {
            Ok(product) => {
                push_notice(
                    session,
                    Notice::success(format!("{} was added to your cart.", product.name)),
                )?;
                Ok(ResumeOutcome::Added(product))
            }
            Err(e) if e.is_stock_error() || matches!(e, DomainError::NotFound(_)) => {
                let message = e.to_string();
                push_notice(session, Notice::error(message.clone()))?;
                Ok(ResumeOutcome::Rejected(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Idempotent: removing a product that is not in the cart is fine.
    pub fn remove_from_cart<S: SessionStore>(
        &self,
        session: &mut S,
        product_id: Uuid,
    ) -> Result<(), DomainError> {
        if SessionCart::open(session)?.remove(product_id)? {
            log::info!("Removed product {} from cart", product_id);
        }
        Ok(())
    }

    /// The cart resolved against live products. Lines whose product has
    /// disappeared from the catalog are skipped.
    pub fn view<S: SessionStore>(&self, session: &S) -> Result<CartView, DomainError> {
        let cart: Cart = session.get(CART_KEY)?.unwrap_or_default();
        let mut items = Vec::with_capacity(cart.len());
        for item in cart.items(&self.ledger) {
            match item {
                Ok(item) => items.push(item),
                Err(DomainError::NotFound(_)) => {
                    log::warn!("Skipping cart line for a product that no longer exists");
                }
                Err(e) => return Err(e),
            }
        }
        let total = items
            .iter()
            .fold(BigDecimal::from(0), |acc, item| acc + item.total_price());
        Ok(CartView { items, total })
    }

    fn checked_add<S: SessionStore>(
        &self,
        session: &mut S,
        product: &Product,
        quantity: i32,
        override_quantity: bool,
    ) -> Result<(), DomainError> {
        let mut cart = SessionCart::open(session)?;
        if let Err(e) = check_add(
            product,
            cart.cart().quantity_of(product.id),
            quantity,
            override_quantity,
        ) {
            log::warn!("Rejected cart add of {} x {}: {}", quantity, product.name, e);
            return Err(e);
        }
        cart.add(product, quantity, override_quantity)?;
        log::info!("Added {} of product {} to cart", quantity, product.name);
        Ok(())
    }
}

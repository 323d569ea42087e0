use uuid::Uuid;

use crate::domain::cart::SessionCart;
use crate::domain::errors::DomainError;
use crate::domain::order::{ContactDetails, Order, OrderDraft, OrderStatus};
use crate::domain::ports::{Notifier, OrderRepository};
use crate::domain::session::{current_user, SessionStore};

#[derive(Debug, Clone)]
pub struct OrderService<R, N> {
    repo: R,
    notifier: N,
}

impl<R: OrderRepository, N: Notifier> OrderService<R, N> {
    pub fn new(repo: R, notifier: N) -> Self {
        Self { repo, notifier }
    }

    /// Turns the session cart into an order.
    ///
    /// The cart is cleared only after the repository has committed; on any
    /// failure it is left exactly as it was so the shopper can adjust and
    /// resubmit. A failed confirmation email is logged and otherwise ignored.
    pub fn create_order<S: SessionStore>(
        &self,
        session: &mut S,
        contact: ContactDetails,
    ) -> Result<Order, DomainError> {
        contact.validate()?;
        let user_id = current_user(session)?;
        let mut cart = SessionCart::open(session)?;
        if cart.cart().is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let draft = OrderDraft {
            user_id,
            contact,
            lines: cart.cart().to_order_lines()?,
        };

        let order = match self.repo.place_order(draft) {
            Ok(order) => order,
            Err(DomainError::OrderValidationFailed(report)) => {
                log::warn!("Checkout rejected: {}", report);
                return Err(DomainError::OrderValidationFailed(report));
            }
            Err(e) => return Err(e),
        };

        cart.clear();
        log::info!(
            "Order {} created by {} for {}",
            order.id,
            user_id.map_or_else(|| "guest".to_string(), |u| u.to_string()),
            order.total_cost()
        );

        if !self.notifier.send_confirmation(&order) {
            log::error!("Failed to send order confirmation email for order #{}", order.id);
        }

        Ok(order)
    }

    /// The user's orders, newest first.
    pub fn history(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        self.repo.list_for_user(user_id)
    }

    /// Only the owning user may see an order.
    pub fn get_for_user(&self, order_id: Uuid, user_id: Uuid) -> Result<Order, DomainError> {
        self.repo
            .find_by_id(order_id)?
            .filter(|o| o.user_id == Some(user_id))
            .ok_or(DomainError::NotFound("order"))
    }

    pub fn ship(&self, order_id: Uuid, tracking_number: Option<&str>) -> Result<Order, DomainError> {
        let order = self.repo.update_status(
            order_id,
            &[OrderStatus::Pending, OrderStatus::Processing],
            OrderStatus::Shipped,
        )?;
        log::info!("Order {} marked as shipped", order.id);

        if !self.notifier.send_shipped(&order, tracking_number) {
            log::error!("Failed to send order shipped email for order #{}", order.id);
        }
        Ok(order)
    }
}

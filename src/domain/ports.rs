use std::sync::Arc;

use uuid::Uuid;

use super::account::Account;
use super::errors::DomainError;
use super::order::{Order, OrderDraft, OrderStatus};
use super::product::Product;

/// Read access to live product stock.
pub trait StockLedger: Send + Sync + 'static {
    /// Returns `NotFound("product")` for unknown ids.
    fn get(&self, id: Uuid) -> Result<Product, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Commits the order, its items and the stock decrements as one unit.
    ///
    /// Stock is re-read under a lock; if any line exceeds it the whole draft
    /// is rejected with `OrderValidationFailed` listing every offending line
    /// and nothing is written.
    fn place_order(&self, draft: OrderDraft) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;
    /// Moves the order to `status` if its current status is one of `from`,
    /// checked and written as one step. Any other current status is an
    /// `InvalidInput` error and nothing changes.
    fn update_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        status: OrderStatus,
    ) -> Result<Order, DomainError>;
}

pub trait UserDirectory: Send + Sync + 'static {
    fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, DomainError>;
}

/// Outgoing customer mail. Both calls report success and never fail the caller.
pub trait Notifier: Send + Sync + 'static {
    fn send_confirmation(&self, order: &Order) -> bool;
    fn send_shipped(&self, order: &Order, tracking_number: Option<&str>) -> bool;
}

impl<T: StockLedger + ?Sized> StockLedger for Arc<T> {
    fn get(&self, id: Uuid) -> Result<Product, DomainError> {
        (**self).get(id)
    }
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn place_order(&self, draft: OrderDraft) -> Result<Order, DomainError> {
        (**self).place_order(draft)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        (**self).list_for_user(user_id)
    }

    fn update_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        (**self).update_status(id, from, status)
    }
}

impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, DomainError> {
        (**self).find_account(user_id)
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn send_confirmation(&self, order: &Order) -> bool {
        (**self).send_confirmation(order)
    }

    fn send_shipped(&self, order: &Order, tracking_number: Option<&str>) -> bool {
        (**self).send_shipped(order, tracking_number)
    }
}

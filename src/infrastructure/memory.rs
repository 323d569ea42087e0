//! Process-local catalog and order book.
//!
//! Backs the HTTP tests and local demos. A single mutex guards the whole
//! shop, so order assembly's check-then-decrement is serialized the same way
//! the row locks serialize it in Postgres.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderDraft, OrderItem, OrderStatus};
use crate::domain::ports::{OrderRepository, StockLedger, UserDirectory};
use crate::domain::product::Product;
use crate::domain::stock::validate_lines;

#[derive(Debug, Default)]
struct ShopState {
    products: HashMap<Uuid, Product>,
    accounts: HashMap<Uuid, Account>,
    orders: Vec<Order>,
}

#[derive(Debug, Default)]
pub struct InMemoryShop {
    state: Mutex<ShopState>,
}

impl InMemoryShop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, product: Product) {
        self.state.lock().products.insert(product.id, product);
    }

    pub fn remove_product(&self, id: Uuid) {
        self.state.lock().products.remove(&id);
    }

    /// Restocking, as done by catalog administration.
    pub fn set_stock(&self, id: Uuid, stock: i32) {
        if let Some(product) = self.state.lock().products.get_mut(&id) {
            product.stock = stock;
        }
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().accounts.insert(account.id, account);
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }
}

impl StockLedger for InMemoryShop {
    fn get(&self, id: Uuid) -> Result<Product, DomainError> {
        self.state
            .lock()
            .products
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound("product"))
    }
}

impl OrderRepository for InMemoryShop {
    fn place_order(&self, draft: OrderDraft) -> Result<Order, DomainError> {
        let mut state = self.state.lock();

        let referenced: Vec<Product> = draft
            .lines
            .iter()
            .filter_map(|l| state.products.get(&l.product_id).cloned())
            .collect();
        validate_lines(&draft.lines, &referenced).into_result()?;

        let order = Order {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            contact: draft.contact,
            status: OrderStatus::Pending,
            paid: false,
            created_at: Utc::now(),
            items: draft
                .lines
                .iter()
                .map(|l| OrderItem {
                    id: Uuid::new_v4(),
                    product_id: l.product_id,
                    price: l.price.clone(),
                    quantity: l.quantity,
                })
                .collect(),
        };

        for line in &draft.lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
        }
        state.orders.push(order.clone());

        Ok(order)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.state.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    fn update_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut state = self.state.lock();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound("order"))?;
        if !from.contains(&order.status) {
            return Err(DomainError::InvalidInput(format!(
                "order {} is already {}",
                id, order.status
            )));
        }
        order.status = status;
        Ok(order.clone())
    }
}

impl UserDirectory for InMemoryShop {
    fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, DomainError> {
        Ok(self.state.lock().accounts.get(&user_id).cloned())
    }
}

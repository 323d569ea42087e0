use crate::domain::order::Order;
use crate::domain::ports::Notifier;

/// A composed customer email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn confirmation_email(from: &str, order: &Order) -> Email {
    let lines: Vec<String> = order
        .items
        .iter()
        .map(|item| format!("  {} x {} = {}", item.quantity, item.price, item.cost()))
        .collect();
    let body = format!(
        "Hello {} {},\n\nThank you for your order #{}.\n\n{}\n\nTotal: {}\n",
        order.contact.first_name,
        order.contact.last_name,
        order.id,
        lines.join("\n"),
        order.total_cost()
    );
    Email {
        from: from.to_string(),
        to: order.contact.email.clone(),
        subject: format!("Order Confirmation - Order #{}", order.id),
        body,
    }
}

pub fn shipped_email(from: &str, order: &Order, tracking_number: Option<&str>) -> Email {
    let tracking = tracking_number
        .map(|t| format!("\nTracking Number: {t}"))
        .unwrap_or_default();
    let body = format!(
        "Hello {} {},\n\nYour order #{} has been shipped and is on its way.{}\n\nExpected delivery: 5-7 business days from shipment date.\n",
        order.contact.first_name, order.contact.last_name, order.id, tracking
    );
    Email {
        from: from.to_string(),
        to: order.contact.email.clone(),
        subject: format!("Order Shipped - Order #{}", order.id),
        body,
    }
}

/// Writes outgoing mail to the log instead of a mail server.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    from: String,
}

impl LogNotifier {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }

    fn deliver(&self, email: &Email) -> bool {
        if email.to.is_empty() {
            log::error!("Cannot send '{}': no recipient address", email.subject);
            return false;
        }
        log::info!(
            "Sending mail from {} to {}: {}\n{}",
            email.from,
            email.to,
            email.subject,
            email.body
        );
        true
    }
}

impl Notifier for LogNotifier {
    fn send_confirmation(&self, order: &Order) -> bool {
        self.deliver(&confirmation_email(&self.from, order))
    }

    fn send_shipped(&self, order: &Order, tracking_number: Option<&str>) -> bool {
        self.deliver(&shipped_email(&self.from, order, tracking_number))
    }
}

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{ContactDetails, Order};
use crate::domain::session::current_user;
use crate::errors::AppError;

use super::session::with_session;
use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: String,
}

impl From<ContactForm> for ContactDetails {
    fn from(f: ContactForm) -> Self {
        ContactDetails {
            first_name: f.first_name,
            last_name: f.last_name,
            email: f.email,
            phone: f.phone,
            address: f.address,
        }
    }
}

impl From<ContactDetails> for ContactForm {
    fn from(c: ContactDetails) -> Self {
        ContactForm {
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            address: c.address,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub cost: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub contact: ContactForm,
    pub status: String,
    pub paid: bool,
    pub created_at: String,
    pub total_cost: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        let total_cost = o.total_cost().to_string();
        OrderResponse {
            id: o.id,
            user_id: o.user_id,
            status: o.status.to_string(),
            paid: o.paid,
            created_at: o.created_at.to_rfc3339(),
            total_cost,
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    cost: i.cost().to_string(),
                    price: i.price.to_string(),
                })
                .collect(),
            contact: o.contact.into(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/new
///
/// Checkout form defaults for the caller: profile data when logged in,
/// blank for guests.
#[utoipa::path(
    get,
    path = "/orders/new",
    responses((status = 200, description = "Prefilled contact details", body = ContactForm)),
    tag = "orders"
)]
pub async fn new_order_form(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let accounts = state.accounts.clone();

    let contact = with_session(&session, move |s| {
        let user = current_user(s)?;
        accounts.initial_contact(user)
    })
    .await?;

    Ok(HttpResponse::Ok().json(ContactForm::from(contact)))
}

/// POST /orders
///
/// Converts the session cart into an order. Stock for every line is
/// re-checked under row locks; if any line is short the whole order is
/// refused, every short line is reported, and the cart is left as it was.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = ContactForm,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Invalid contact details or empty cart"),
        (status = 409, description = "One or more cart lines exceed current stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<ContactForm>,
) -> Result<HttpResponse, AppError> {
    let contact = ContactDetails::from(body.into_inner());
    let orders = state.orders.clone();

    let order = with_session(&session, move |s| orders.create_order(s, contact)).await?;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// The caller's order history, newest first. Guests have none.
#[utoipa::path(
    get,
    path = "/orders",
    responses((status = 200, description = "Orders of the current user", body = [OrderResponse])),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.clone();

    let history = with_session(&session, move |s| match current_user(s)? {
        Some(user) => orders.history(user),
        None => Ok(Vec::new()),
    })
    .await?;

    let body: Vec<OrderResponse> = history.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let orders = state.orders.clone();

    let order = with_session(&session, move |s| {
        let user = current_user(s)?.ok_or(DomainError::NotFound("order"))?;
        orders.get_for_user(order_id, user)
    })
    .await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

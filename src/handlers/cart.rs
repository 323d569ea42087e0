use actix_session::Session;
use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::account_service::RESUME_PENDING_ADD_PATH;
use crate::application::cart_service::{AddOutcome, CartView, ResumeOutcome};
use crate::domain::session::{take_notices, Notice, NoticeLevel};
use crate::errors::AppError;

use super::session::with_session;
use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Replace the cart quantity instead of adding to it.
    #[serde(default, rename = "override")]
    pub override_quantity: bool,
}

fn default_quantity() -> i32 {
    1
}

impl Default for AddToCartRequest {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            override_quantity: false,
        }
    }
}

impl AddToCartRequest {
    /// An empty body means one unit, additive. Anything else must be a
    /// well-formed request.
    fn parse(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("invalid add-to-cart body: {e}")))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub name: String,
    /// Price captured when the product was added, e.g. "799.99"
    pub price: String,
    pub quantity: i32,
    pub total_price: String,
    pub in_stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoticeResponse {
    pub level: String,
    pub text: String,
}

impl From<Notice> for NoticeResponse {
    fn from(n: Notice) -> Self {
        let level = match n.level {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        };
        Self {
            level: level.to_string(),
            text: n.text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total: String,
    pub notices: Vec<NoticeResponse>,
}

impl CartResponse {
    fn new(view: CartView, notices: Vec<Notice>) -> Self {
        Self {
            items: view
                .items
                .into_iter()
                .map(|item| CartItemResponse {
                    product_id: item.product.id,
                    name: item.product.name.clone(),
                    price: item.price.to_string(),
                    quantity: item.quantity,
                    total_price: item.total_price().to_string(),
                    in_stock: item.product.stock,
                })
                .collect(),
            total: view.total.to_string(),
            notices: notices.into_iter().map(NoticeResponse::from).collect(),
        }
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /cart/add/{product_id}
///
/// Adds a product after the advisory stock check. Anonymous callers are sent
/// to the login page; their add is replayed once they come back.
#[utoipa::path(
    post,
    path = "/cart/add/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product UUID")),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added", body = CartResponse),
        (status = 303, description = "Login required; add parked until then"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Out of stock or not enough units"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let req = AddToCartRequest::parse(&body)?;
    let carts = state.carts.clone();

    let added = with_session(&session, move |s| {
        match carts.add_to_cart(s, product_id, req.quantity, req.override_quantity)? {
            AddOutcome::LoginRequired => Ok(None),
            AddOutcome::Added(_) => carts.view(s).map(Some),
        }
    })
    .await?;

    match added {
        Some(view) => Ok(HttpResponse::Ok().json(CartResponse::new(view, vec![]))),
        None => Ok(see_other(&format!(
            "{}?next={}",
            state.login_url, RESUME_PENDING_ADD_PATH
        ))),
    }
}

/// POST /cart/remove/{product_id}
#[utoipa::path(
    post,
    path = "/cart/remove/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product no longer in cart", body = CartResponse),
    ),
    tag = "cart"
)]
pub async fn remove_from_cart(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let carts = state.carts.clone();

    let view = with_session(&session, move |s| {
        carts.remove_from_cart(s, product_id)?;
        carts.view(s)
    })
    .await?;

    Ok(HttpResponse::Ok().json(CartResponse::new(view, vec![])))
}

/// GET /cart
///
/// Returns the cart and any notices queued since the last view.
#[utoipa::path(
    get,
    path = "/cart",
    responses((status = 200, description = "Current cart", body = CartResponse)),
    tag = "cart"
)]
pub async fn cart_detail(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let carts = state.carts.clone();

    let (view, notices) = with_session(&session, move |s| {
        let notices = take_notices(s)?;
        Ok((carts.view(s)?, notices))
    })
    .await?;

    Ok(HttpResponse::Ok().json(CartResponse::new(view, notices)))
}

/// GET /cart/complete-pending-add
///
/// Login lands here when an add was parked. Always redirects to the cart;
/// the outcome is reported there as a notice.
#[utoipa::path(
    get,
    path = "/cart/complete-pending-add",
    responses((status = 303, description = "Redirect to the cart")),
    tag = "cart"
)]
pub async fn complete_pending_add(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let carts = state.carts.clone();

    let outcome = with_session(&session, move |s| carts.resume_pending_add(s)).await?;
    match outcome {
        ResumeOutcome::Added(product) => log::info!("Replayed pending add of {}", product.name),
        ResumeOutcome::Rejected(reason) => log::info!("Pending add rejected: {}", reason),
        ResumeOutcome::Noop => {}
    }

    Ok(see_other("/cart"))
}

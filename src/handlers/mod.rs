pub mod accounts;
pub mod cart;
pub mod orders;
pub mod session;

use std::sync::Arc;

use actix_web::web;
use utoipa::OpenApi;

use crate::application::account_service::AccountService;
use crate::application::cart_service::CartService;
use crate::application::order_service::OrderService;
use crate::config::Config;
use crate::db::DbPool;
use crate::domain::ports::{Notifier, OrderRepository, StockLedger, UserDirectory};
use crate::infrastructure::memory::InMemoryShop;
use crate::infrastructure::notifier::LogNotifier;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselStockLedger;
use crate::infrastructure::user_repo::DieselUserDirectory;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub carts: CartService<Arc<dyn StockLedger>>,
    pub orders: OrderService<Arc<dyn OrderRepository>, Arc<dyn Notifier>>,
    pub accounts: AccountService<Arc<dyn UserDirectory>>,
    pub login_url: String,
    /// Shared secret expected from the auth proxy on login completion.
    pub auth_proxy_secret: Option<String>,
}

impl AppState {
    pub fn diesel(pool: DbPool, config: &Config) -> Self {
        let ledger: Arc<dyn StockLedger> = Arc::new(DieselStockLedger::new(pool.clone()));
        let repo: Arc<dyn OrderRepository> = Arc::new(DieselOrderRepository::new(pool.clone()));
        let users: Arc<dyn UserDirectory> = Arc::new(DieselUserDirectory::new(pool));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new(config.mail_from.clone()));
        Self {
            carts: CartService::new(ledger),
            orders: OrderService::new(repo, notifier),
            accounts: AccountService::new(users, config.landing_url.clone()),
            login_url: config.login_url.clone(),
            auth_proxy_secret: config.auth_proxy_secret.clone(),
        }
    }

    pub fn in_memory(
        shop: Arc<InMemoryShop>,
        notifier: Arc<dyn Notifier>,
        login_url: impl Into<String>,
    ) -> Self {
        let ledger: Arc<dyn StockLedger> = shop.clone();
        let repo: Arc<dyn OrderRepository> = shop.clone();
        let users: Arc<dyn UserDirectory> = shop;
        Self {
            carts: CartService::new(ledger),
            orders: OrderService::new(repo, notifier),
            accounts: AccountService::new(users, "/"),
            login_url: login_url.into(),
            auth_proxy_secret: None,
        }
    }

    pub fn with_auth_proxy_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth_proxy_secret = Some(secret.into());
        self
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("/login/complete", web::get().to(accounts::complete_login))
            .route("/login/complete", web::post().to(accounts::complete_login))
            .route("/logout", web::post().to(accounts::logout)),
    )
    .service(
        web::scope("/cart")
            .route("", web::get().to(cart::cart_detail))
            .route("/add/{product_id}", web::post().to(cart::add_to_cart))
            .route("/remove/{product_id}", web::post().to(cart::remove_from_cart))
            .route(
                "/complete-pending-add",
                web::get().to(cart::complete_pending_add),
            ),
    )
    .service(
        web::scope("/orders")
            .route("", web::get().to(orders::list_orders))
            .route("", web::post().to(orders::create_order))
            .route("/new", web::get().to(orders::new_order_form))
            .route("/{id}", web::get().to(orders::get_order)),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        accounts::complete_login,
        accounts::logout,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::cart_detail,
        cart::complete_pending_add,
        orders::new_order_form,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
    ),
    components(schemas(
        cart::AddToCartRequest,
        cart::CartResponse,
        cart::CartItemResponse,
        cart::NoticeResponse,
        orders::ContactForm,
        orders::OrderResponse,
        orders::OrderItemResponse,
    )),
    tags(
        (name = "accounts", description = "Login completion and logout"),
        (name = "cart", description = "Session cart"),
        (name = "orders", description = "Checkout and order history"),
    )
)]
pub struct ApiDoc;

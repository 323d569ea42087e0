//! HTTP-level tests against the in-memory adapters.

use std::str::FromStr;
use std::sync::Arc;

use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront::domain::account::Account;
use storefront::domain::product::Product;
use storefront::handlers::accounts::{AUTH_PROXY_SECRET_HEADER, AUTH_USER_HEADER};
use storefront::handlers;
use storefront::infrastructure::memory::InMemoryShop;
use storefront::infrastructure::notifier::LogNotifier;
use storefront::{session_middleware, AppState};

const LOGIN_URL: &str = "/accounts/login/";
const PROXY_SECRET: &str = "proxy-shared-secret";

fn product(name: &str, price: &str, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        price: BigDecimal::from_str(price).unwrap(),
        stock,
        available: true,
    }
}

fn state(shop: &Arc<InMemoryShop>) -> AppState {
    AppState::in_memory(
        Arc::clone(shop),
        Arc::new(LogNotifier::new("shop@example.com")),
        LOGIN_URL,
    )
    .with_auth_proxy_secret(PROXY_SECRET)
}

/// Registers a customer account and returns its id.
fn customer(shop: &InMemoryShop) -> Uuid {
    let account = Account {
        id: Uuid::new_v4(),
        username: "jdoe".to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "john@example.com".to_string(),
        profile: None,
    };
    let id = account.id;
    shop.add_account(account);
    id
}

/// A login completion as forwarded by the auth proxy.
fn login_request(user_id: Uuid) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/accounts/login/complete")
        .insert_header((AUTH_PROXY_SECRET_HEADER, PROXY_SECRET))
        .insert_header((AUTH_USER_HEADER, user_id.to_string()))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(session_middleware(Key::generate(), false))
                .configure(handlers::routes),
        )
        .await
    };
}

/// Keeps the latest session cookie across requests.
#[derive(Default)]
struct Jar(Option<Cookie<'static>>);

impl Jar {
    fn update<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(c) = resp.response().cookies().find(|c| c.name() == "id") {
            self.0 = Some(c.into_owned());
        }
    }

    fn apply(&self, req: test::TestRequest) -> test::TestRequest {
        match &self.0 {
            Some(c) => req.cookie(c.clone()),
            None => req,
        }
    }
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn contact() -> Value {
    json!({
        "first_name": "John",
        "last_name": "Doe",
        "email": "john@example.com",
        "phone": "1234567890",
        "address": "123 Main St"
    })
}

#[actix_web::test]
async fn anonymous_add_redirects_to_login_with_resume_path() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Google Pixel 8", "799.99", 10);
    shop.add_product(p.clone());
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri(&format!("/cart/add/{}", p.id))
        .set_json(json!({"quantity": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    assert!(target.starts_with(LOGIN_URL));
    assert!(target.contains("next=/cart/complete-pending-add"));
}

#[actix_web::test]
async fn empty_cart_view() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::get().uri("/cart").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total"], "0");
}

#[actix_web::test]
async fn add_unknown_product_is_not_found() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri(&format!("/cart/add/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn remove_absent_product_is_ok() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri(&format!("/cart/remove/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn resume_without_pending_add_goes_to_cart() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::get()
        .uri("/cart/complete-pending-add")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");
}

#[actix_web::test]
async fn checkout_with_empty_cart_is_rejected() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(contact())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(shop.order_count(), 0);
}

#[actix_web::test]
async fn guest_order_lookup_is_not_found() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn parked_add_is_replayed_after_login_and_checked_out() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Google Pixel 8", "799.99", 10);
    shop.add_product(p.clone());
    let app = app!(state(&shop));
    let mut jar = Jar::default();

    let req = test::TestRequest::post()
        .uri(&format!("/cart/add/{}", p.id))
        .set_json(json!({"quantity": 3}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.update(&resp);

    let user_id = customer(&shop);
    let req = jar
        .apply(login_request(user_id).uri("/accounts/login/complete?next=/orders"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart/complete-pending-add");
    jar.update(&resp);

    let req = jar
        .apply(test::TestRequest::get().uri("/cart/complete-pending-add"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/cart");
    jar.update(&resp);

    let req = jar.apply(test::TestRequest::get().uri("/cart")).to_request();
    let resp = test::call_service(&app, req).await;
    jar.update(&resp);
    let cart: Value = test::read_body_json(resp).await;
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["total"], "2399.97");
    assert_eq!(cart["notices"][0]["level"], "success");

    let req = jar
        .apply(test::TestRequest::post().uri("/orders").set_json(contact()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    jar.update(&resp);
    let order: Value = test::read_body_json(resp).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_cost"], "2399.97");
    assert_eq!(order["user_id"], json!(user_id));

    let req = jar.apply(test::TestRequest::get().uri("/cart")).to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"], json!([]));

    let req = jar.apply(test::TestRequest::get().uri("/orders")).to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn checkout_reports_every_short_line() {
    let shop = Arc::new(InMemoryShop::new());
    let phone = product("Google Pixel 8", "799.99", 10);
    let case = product("Pixel Case", "19.99", 5);
    shop.add_product(phone.clone());
    shop.add_product(case.clone());
    let app = app!(state(&shop));
    let mut jar = Jar::default();

    let req = login_request(customer(&shop)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.update(&resp);

    for (id, quantity) in [(phone.id, 4), (case.id, 2)] {
        let req = jar
            .apply(
                test::TestRequest::post()
                    .uri(&format!("/cart/add/{id}"))
                    .set_json(json!({"quantity": quantity})),
            )
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        jar.update(&resp);
    }

    shop.set_stock(phone.id, 1);
    shop.set_stock(case.id, 0);

    let req = jar
        .apply(test::TestRequest::post().uri("/orders").set_json(contact()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    jar.update(&resp);
    let body: Value = test::read_body_json(resp).await;
    let details = body["details"].as_array().cloned().unwrap_or_default();
    assert_eq!(details.len(), 2);
    assert_eq!(shop.order_count(), 0);

    let req = jar.apply(test::TestRequest::get().uri("/cart")).to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn add_beyond_stock_is_conflict() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Sony Xperia", "899.99", 2);
    shop.add_product(p.clone());
    let app = app!(state(&shop));
    let mut jar = Jar::default();

    let req = login_request(customer(&shop)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.update(&resp);

    let req = jar
        .apply(
            test::TestRequest::post()
                .uri(&format!("/cart/add/{}", p.id))
                .set_json(json!({"quantity": 3})),
        )
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_add_body_is_rejected() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Google Pixel 8", "799.99", 10);
    shop.add_product(p.clone());
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri(&format!("/cart/add/{}", p.id))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"quantity": "five", "override": true}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/cart/add/{}", p.id))
        .set_payload("not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_add_body_adds_one_unit() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Google Pixel 8", "799.99", 10);
    shop.add_product(p.clone());
    let app = app!(state(&shop));
    let mut jar = Jar::default();

    let req = login_request(customer(&shop)).to_request();
    let resp = test::call_service(&app, req).await;
    jar.update(&resp);

    let req = jar
        .apply(test::TestRequest::post().uri(&format!("/cart/add/{}", p.id)))
        .to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[actix_web::test]
async fn login_completion_requires_the_proxy_secret() {
    let shop = Arc::new(InMemoryShop::new());
    let user_id = customer(&shop);
    let app = app!(state(&shop));

    let req = test::TestRequest::post()
        .uri("/accounts/login/complete")
        .insert_header((AUTH_USER_HEADER, user_id.to_string()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/accounts/login/complete")
        .insert_header((AUTH_PROXY_SECRET_HEADER, "wrong"))
        .insert_header((AUTH_USER_HEADER, user_id.to_string()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_completion_is_disabled_without_a_configured_secret() {
    let shop = Arc::new(InMemoryShop::new());
    let user_id = customer(&shop);
    let app = app!(AppState::in_memory(
        Arc::clone(&shop),
        Arc::new(LogNotifier::new("shop@example.com")),
        LOGIN_URL,
    ));

    let req = login_request(user_id).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_for_unknown_user_is_not_found() {
    let shop = Arc::new(InMemoryShop::new());
    let app = app!(state(&shop));

    let req = login_request(Uuid::new_v4()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn login_without_pending_add_follows_local_next() {
    let shop = Arc::new(InMemoryShop::new());
    let user_id = customer(&shop);
    let app = app!(state(&shop));

    let req = login_request(user_id)
        .uri("/accounts/login/complete?next=/orders")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/orders");

    let req = login_request(user_id)
        .uri("/accounts/login/complete?next=//evil.example")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn logout_drops_identity_and_cart() {
    let shop = Arc::new(InMemoryShop::new());
    let p = product("Google Pixel 8", "799.99", 10);
    shop.add_product(p.clone());
    let app = app!(state(&shop));
    let mut jar = Jar::default();

    let req = login_request(customer(&shop)).to_request();
    let resp = test::call_service(&app, req).await;
    jar.update(&resp);

    let req = jar
        .apply(test::TestRequest::post().uri(&format!("/cart/add/{}", p.id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    jar.update(&resp);

    let req = jar
        .apply(test::TestRequest::post().uri("/accounts/logout"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    jar.update(&resp);

    let req = jar.apply(test::TestRequest::get().uri("/cart")).to_request();
    let cart: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart["items"], json!([]));

    let req = jar
        .apply(test::TestRequest::post().uri(&format!("/cart/add/{}", p.id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

use actix_session::Session;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::errors::AppError;

use super::session::with_session;
use super::AppState;

/// Set by the auth proxy to the id of the user it authenticated.
pub const AUTH_USER_HEADER: &str = "x-authenticated-user";
/// Proves the request came through the auth proxy.
pub const AUTH_PROXY_SECRET_HEADER: &str = "x-auth-proxy-secret";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Local path to continue to when no cart add is pending.
    pub next: Option<String>,
}

fn header_value<'r>(req: &'r HttpRequest, name: &str) -> Option<&'r str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn secrets_match(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// The user id the auth proxy vouches for on this request.
fn authenticated_user(req: &HttpRequest, state: &AppState) -> Result<Uuid, AppError> {
    let Some(expected) = state.auth_proxy_secret.as_deref() else {
        return Err(AppError::Unauthorized(
            "login completion is not configured".to_string(),
        ));
    };
    let given = header_value(req, AUTH_PROXY_SECRET_HEADER).unwrap_or_default();
    if !secrets_match(expected, given) {
        log::warn!("Rejected login completion without a valid proxy secret");
        return Err(AppError::Unauthorized("not authenticated".to_string()));
    }

    let raw = header_value(req, AUTH_USER_HEADER)
        .ok_or_else(|| AppError::Unauthorized("not authenticated".to_string()))?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("malformed {AUTH_USER_HEADER} header")))
}

/// GET|POST /accounts/login/complete
///
/// Reached through the auth proxy once it has verified the visitor. Binds the
/// user to the session, then redirects to the pending cart add if one is
/// parked, otherwise to `next` or the landing page.
#[utoipa::path(
    post,
    path = "/accounts/login/complete",
    params(LoginQuery),
    responses(
        (status = 303, description = "Logged in; redirect to the next page"),
        (status = 400, description = "Malformed user header"),
        (status = 401, description = "Request did not come through the auth proxy"),
        (status = 404, description = "Unknown user"),
    ),
    tag = "accounts"
)]
pub async fn complete_login(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<LoginQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = authenticated_user(&req, &state)?;
    let next = query.into_inner().next;
    let accounts = state.accounts.clone();

    session.renew();
    let target = with_session(&session, move |s| {
        accounts.complete_login(s, user_id, next.as_deref())
    })
    .await?;

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target))
        .finish())
}

/// POST /accounts/logout
#[utoipa::path(
    post,
    path = "/accounts/logout",
    responses((status = 303, description = "Session cleared; redirect to the landing page")),
    tag = "accounts"
)]
pub async fn logout(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let accounts = state.accounts.clone();

    with_session(&session, move |s| accounts.logout(s)).await?;
    session.renew();

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, state.accounts.landing_url()))
        .finish())
}

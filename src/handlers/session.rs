//! Bridges actix-session to the core's [`SessionStore`] contract.
//!
//! `actix_session::Session` is tied to the request's thread, so each use case
//! runs against an owned [`SessionData`] snapshot inside `web::block` and the
//! keys it touched are written back afterwards.

use actix_session::Session;
use actix_web::web;
use serde_json::Value;

use crate::domain::errors::DomainError;
use crate::domain::session::SessionData;
use crate::errors::AppError;

pub fn load(session: &Session) -> Result<SessionData, AppError> {
    let mut data = SessionData::new();
    for (key, raw) in session.entries().iter() {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::Internal(format!("corrupt session value '{key}': {e}")))?;
        data.load(key.clone(), value);
    }
    Ok(data)
}

pub fn persist(session: &Session, data: &SessionData) -> Result<(), AppError> {
    for key in data.dirty_keys() {
        match data.raw(key) {
            Some(value) => session.insert(key, value)?,
            None => {
                session.remove(key);
            }
        }
    }
    Ok(())
}

/// Runs `f` on a blocking thread against the request's session state.
///
/// Session changes are written back even when `f` fails, so a consumed
/// pending intent stays consumed.
pub async fn with_session<T, F>(session: &Session, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut SessionData) -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    let mut data = load(session)?;
    let (result, data) = web::block(move || {
        let result = f(&mut data);
        (result, data)
    })
    .await?;
    persist(session, &data)?;
    Ok(result?)
}

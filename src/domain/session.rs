//! The session contract the core works against.
//!
//! Cart, pending intent, identity and notices all live in per-visitor
//! session state. The core never touches a storage engine directly; it is
//! handed a [`SessionStore`] for the current request.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::DomainError;

pub const CART_KEY: &str = "cart";
pub const PENDING_CART_ADD_KEY: &str = "pending_cart_add";
pub const USER_ID_KEY: &str = "user_id";
pub const NOTICES_KEY: &str = "notices";

/// Get/set access to one visitor's session, with a modification flag.
pub trait SessionStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DomainError>;

    /// Stores `value` under `key` and marks the session modified.
    fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), DomainError>;

    /// Removes `key`, returning whether anything was there.
    fn remove(&mut self, key: &str) -> bool;

    fn is_modified(&self) -> bool;
}

/// Owned session state for one request.
///
/// Loaded from the web layer's session before a use case runs and flushed
/// back afterwards; only keys listed by [`SessionData::dirty_keys`] need to
/// be written.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    values: Map<String, Value>,
    dirty: BTreeSet<String>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value without marking it dirty.
    pub fn load(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl SessionStore for SessionData {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DomainError> {
        self.values
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(DomainError::from)
    }

    fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), DomainError> {
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        self.dirty.insert(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.values.remove(key).is_some();
        if existed {
            self.dirty.insert(key.to_string());
        }
        existed
    }

    fn is_modified(&self) -> bool {
        !self.dirty.is_empty()
    }
}

/// The authenticated user bound to this session, if any.
pub fn current_user<S: SessionStore>(session: &S) -> Result<Option<Uuid>, DomainError> {
    session.get(USER_ID_KEY)
}

pub fn set_current_user<S: SessionStore>(session: &mut S, user_id: Uuid) -> Result<(), DomainError> {
    session.insert(USER_ID_KEY, &user_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A one-shot message shown on the next cart view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub fn push_notice<S: SessionStore>(session: &mut S, notice: Notice) -> Result<(), DomainError> {
    let mut notices: Vec<Notice> = session.get(NOTICES_KEY)?.unwrap_or_default();
    notices.push(notice);
    session.insert(NOTICES_KEY, &notices)
}

/// Returns and clears the pending notices.
pub fn take_notices<S: SessionStore>(session: &mut S) -> Result<Vec<Notice>, DomainError> {
    let notices = session.get(NOTICES_KEY)?.unwrap_or_default();
    session.remove(NOTICES_KEY);
    Ok(notices)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn loaded_values_are_not_dirty() {
        let mut session = SessionData::new();
        session.load(USER_ID_KEY, json!(Uuid::nil()));

        assert!(!session.is_modified());
        assert_eq!(current_user(&session).unwrap(), Some(Uuid::nil()));
    }

    #[test]
    fn insert_and_remove_mark_modified() {
        let mut session = SessionData::new();
        session.insert("k", &3).unwrap();
        assert!(session.is_modified());
        assert_eq!(session.dirty_keys().collect::<Vec<_>>(), vec!["k"]);

        let mut session = SessionData::new();
        assert!(!session.remove("missing"));
        assert!(!session.is_modified());
    }

    #[test]
    fn notices_are_read_once() {
        let mut session = SessionData::new();
        push_notice(&mut session, Notice::success("added")).unwrap();
        push_notice(&mut session, Notice::error("nope")).unwrap();

        let notices = take_notices(&mut session).unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert!(take_notices(&mut session).unwrap().is_empty());
    }

    #[test]
    fn mistyped_value_is_an_internal_error() {
        let mut session = SessionData::new();
        session.load(USER_ID_KEY, json!("not-a-uuid"));
        assert!(matches!(
            current_user(&session),
            Err(DomainError::Internal(_))
        ));
    }
}

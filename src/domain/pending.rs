//! A single deferred cart add that survives the login redirect.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::session::{SessionStore, PENDING_CART_ADD_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(rename = "override")]
    pub override_quantity: bool,
}

impl PendingIntent {
    /// Stores the intent, replacing any earlier one for this session.
    pub fn stash<S: SessionStore>(&self, session: &mut S) -> Result<(), DomainError> {
        session.insert(PENDING_CART_ADD_KEY, self)
    }

    /// Reads and deletes the intent. A second call returns `None`.
    ///
    /// The key is removed even when the stored value fails to decode.
    pub fn take<S: SessionStore>(session: &mut S) -> Result<Option<Self>, DomainError> {
        let intent = session.get(PENDING_CART_ADD_KEY);
        session.remove(PENDING_CART_ADD_KEY);
        intent
    }

    /// Whether anything is parked under the intent key, decodable or not.
    pub fn exists<S: SessionStore>(session: &S) -> Result<bool, DomainError> {
        Ok(session.get::<Value>(PENDING_CART_ADD_KEY)?.is_some())
    }
}

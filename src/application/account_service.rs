use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::ContactDetails;
use crate::domain::pending::PendingIntent;
use crate::domain::ports::UserDirectory;
use crate::domain::session::{
    current_user, set_current_user, SessionStore, CART_KEY, NOTICES_KEY, PENDING_CART_ADD_KEY,
    USER_ID_KEY,
};

/// Where a parked cart add is replayed after login.
pub const RESUME_PENDING_ADD_PATH: &str = "/cart/complete-pending-add";

#[derive(Debug, Clone)]
pub struct AccountService<U> {
    users: U,
    landing_url: String,
}

impl<U: UserDirectory> AccountService<U> {
    pub fn new(users: U, landing_url: impl Into<String>) -> Self {
        Self {
            users,
            landing_url: landing_url.into(),
        }
    }

    pub fn landing_url(&self) -> &str {
        &self.landing_url
    }

    /// Binds `user_id` to the session once credentials have been verified
    /// and returns where the browser should go next.
    ///
    /// The user must exist in the directory; the session is left untouched
    /// otherwise.
    pub fn complete_login<S: SessionStore>(
        &self,
        session: &mut S,
        user_id: Uuid,
        next: Option<&str>,
    ) -> Result<String, DomainError> {
        let account = self
            .users
            .find_account(user_id)?
            .ok_or(DomainError::NotFound("user"))?;
        set_current_user(session, account.id)?;
        log::info!("User {} logged in", account.username);
        self.login_redirect_target(session, next)
    }

    /// Ends the visit: identity, cart, any parked add and queued notices are
    /// all dropped. Returns the user that was logged in, if any.
    pub fn logout<S: SessionStore>(&self, session: &mut S) -> Result<Option<Uuid>, DomainError> {
        let user = current_user(session).unwrap_or(None);
        for key in [USER_ID_KEY, CART_KEY, PENDING_CART_ADD_KEY, NOTICES_KEY] {
            session.remove(key);
        }
        match user {
            Some(id) => log::info!("User {} logged out", id),
            None => log::info!("Anonymous session cleared"),
        }
        Ok(user)
    }

    /// A pending cart add wins over any `next` parameter. Only local paths
    /// are accepted for `next`.
    pub fn login_redirect_target<S: SessionStore>(
        &self,
        session: &S,
        next: Option<&str>,
    ) -> Result<String, DomainError> {
        if PendingIntent::exists(session)? {
            return Ok(RESUME_PENDING_ADD_PATH.to_string());
        }
        Ok(next
            .filter(|n| n.starts_with('/') && !n.starts_with("//"))
            .map_or_else(|| self.landing_url.clone(), str::to_string))
    }

    /// Checkout form defaults: empty for guests, account fields otherwise.
    pub fn initial_contact(&self, user_id: Option<Uuid>) -> Result<ContactDetails, DomainError> {
        let Some(user_id) = user_id else {
            return Ok(ContactDetails::default());
        };
        Ok(self
            .users
            .find_account(user_id)?
            .map(|account| account.contact_defaults())
            .unwrap_or_default())
    }
}

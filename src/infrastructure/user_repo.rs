use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::account::Account;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserDirectory;
use crate::schema::{user_profiles, users};

use super::models::{UserProfileRow, UserRow};

pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for DieselUserDirectory {
    fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, DomainError> {
        let mut conn = self.pool.get()?;

        let user = users::table
            .filter(users::id.eq(user_id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(user) = user else {
            return Ok(None);
        };

        let profile = user_profiles::table
            .filter(user_profiles::user_id.eq(user.id))
            .select(UserProfileRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(Some(user.into_account(profile)))
    }
}

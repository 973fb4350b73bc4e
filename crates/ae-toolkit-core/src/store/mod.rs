//! Seams to the hosted identity provider and the `deals` record store.
//!
//! Every record-store call carries the caller's access token; rows are
//! always filtered by the owning user id.

#[cfg(feature = "supabase")]
pub mod supabase;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::profitability::{NewDealRow, SavedDeal};

/// Identity of a signed-in user plus the tokens that authorise store calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub trait IdentityProvider {
    fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<AuthSession, StoreError>;

    fn sign_out(&self, access_token: &str) -> Result<(), StoreError>;
}

pub trait RecordStore {
    /// Insert all rows in one request and return what the store committed.
    fn insert_many(
        &self,
        access_token: &str,
        rows: &[NewDealRow],
    ) -> Result<Vec<SavedDeal>, StoreError>;

    /// All deals owned by `owner_id`, newest first.
    fn select_all(&self, access_token: &str, owner_id: &str)
        -> Result<Vec<SavedDeal>, StoreError>;

    /// Delete one deal matching both id and owner. `Ok(false)` when no row
    /// matched.
    fn delete_one(&self, access_token: &str, id: &str, owner_id: &str)
        -> Result<bool, StoreError>;
}

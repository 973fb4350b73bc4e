use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::deal::{NewDealRow, SavedDeal};
use crate::error::ToolkitError;
use crate::session::Session;
use crate::store::RecordStore;
use crate::ToolkitResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What happened to a bulk save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Every submitted row was stored; staging has been cleared.
    FullSuccess { saved: usize },
    /// The store returned fewer rows than submitted. Rows may have been
    /// committed remotely; staging is kept so the user can reconcile.
    PartialSuccess { saved: usize, attempted: usize },
    Failure { reason: String },
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::FullSuccess { .. })
    }

    /// Collapse into a `Result` for callers that only care about success.
    pub fn into_result(self) -> ToolkitResult<usize> {
        match self {
            SaveOutcome::FullSuccess { saved } => Ok(saved),
            SaveOutcome::PartialSuccess { saved, attempted } => {
                Err(ToolkitError::PartialSave { saved, attempted })
            }
            SaveOutcome::Failure { reason } => Err(ToolkitError::SaveFailed(reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDeal {
    pub temp_id: String,
    pub client_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSaveReport {
    pub outcome: SaveOutcome,
    pub skipped: Vec<SkippedDeal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub attempted: usize,
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Persist every staged deal in one insert.
///
/// Staging is cleared only when the store returns exactly as many rows as
/// were submitted.
pub fn save_staged_bundle(session: &mut Session, store: &impl RecordStore) -> BundleSaveReport {
    let fail = |reason: &str, skipped: Vec<SkippedDeal>| BundleSaveReport {
        outcome: SaveOutcome::Failure {
            reason: reason.to_string(),
        },
        skipped,
    };

    if session.staged().is_empty() {
        return fail("No deals to save.", Vec::new());
    }
    let owner_id = session.owner().user_id.trim().to_string();
    if owner_id.is_empty() {
        return fail("User ID missing.", Vec::new());
    }
    let token = session.owner().access_token.clone();
    if token.trim().is_empty() {
        return fail("Auth token missing.", Vec::new());
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    for deal in session.staged() {
        let reason = if deal.input.client_name.trim().is_empty() {
            Some("missing client name")
        } else if deal.input.deal_size <= Decimal::ZERO {
            Some("deal size must be > 0")
        } else if deal.input.months == 0 {
            Some("months must be > 0")
        } else {
            None
        };
        match reason {
            Some(reason) => {
                tracing::warn!(temp_id = %deal.temp_id, reason, "skipping staged deal");
                skipped.push(SkippedDeal {
                    temp_id: deal.temp_id.clone(),
                    client_name: deal.input.client_name.clone(),
                    reason: reason.to_string(),
                });
            }
            None => rows.push(NewDealRow::from_staged(deal, &owner_id)),
        }
    }
    if rows.is_empty() {
        return fail("No valid deals remaining.", skipped);
    }

    let attempted = rows.len();
    tracing::info!(attempted, skipped = skipped.len(), "saving staged deals");
    let outcome = match store.insert_many(&token, &rows) {
        Err(e) => SaveOutcome::Failure {
            reason: e.to_string(),
        },
        Ok(inserted) if inserted.is_empty() => SaveOutcome::Failure {
            reason: "Bulk save failed: no data returned.".into(),
        },
        Ok(inserted) if inserted.len() != attempted => {
            tracing::warn!(
                saved = inserted.len(),
                attempted,
                "partial bulk save: store may hold a partial commit, staged deals kept"
            );
            SaveOutcome::PartialSuccess {
                saved: inserted.len(),
                attempted,
            }
        }
        Ok(_) => {
            session.clear_staged();
            SaveOutcome::FullSuccess { saved: attempted }
        }
    };

    BundleSaveReport { outcome, skipped }
}

/// All saved deals for the session owner, newest first.
pub fn load_saved_deals(
    session: &Session,
    store: &impl RecordStore,
) -> ToolkitResult<Vec<SavedDeal>> {
    let owner = session.owner();
    if owner.access_token.trim().is_empty() {
        return Err(ToolkitError::NotAuthenticated);
    }
    let deals = store.select_all(&owner.access_token, &owner.user_id)?;
    tracing::debug!(count = deals.len(), "loaded saved deals");
    Ok(deals)
}

/// Delete one saved deal owned by the session user.
pub fn delete_saved_deal(
    session: &Session,
    store: &impl RecordStore,
    deal_id: &str,
) -> ToolkitResult<bool> {
    let owner = session.owner();
    if deal_id.trim().is_empty() {
        return Err(ToolkitError::InvalidInput {
            field: "deal_id".into(),
            reason: "Deal id required.".into(),
        });
    }
    if owner.access_token.trim().is_empty() {
        return Err(ToolkitError::NotAuthenticated);
    }
    Ok(store.delete_one(&owner.access_token, deal_id, &owner.user_id)?)
}

/// Delete several deals one at a time. A failure on one id never stops the
/// rest.
pub fn delete_saved_deals(
    session: &Session,
    store: &impl RecordStore,
    deal_ids: &[String],
) -> DeleteReport {
    let mut deleted = 0;
    let mut failures = Vec::new();
    for id in deal_ids {
        match delete_saved_deal(session, store, id) {
            Ok(true) => deleted += 1,
            Ok(false) => failures.push(DeleteFailure {
                id: id.clone(),
                reason: "no matching deal for this user".into(),
            }),
            Err(e) => failures.push(DeleteFailure {
                id: id.clone(),
                reason: e.to_string(),
            }),
        }
    }
    if !failures.is_empty() {
        tracing::warn!(failed = failures.len(), attempted = deal_ids.len(), "some deletes failed");
    }
    DeleteReport {
        attempted: deal_ids.len(),
        deleted,
        failures,
    }
}

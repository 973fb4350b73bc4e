//! The signed-in user's working state: owner context and staged deals.
//!
//! A [`Session`] is created by [`login`] and consumed by [`logout`]. It is
//! passed explicitly to every operation that needs the owner or the staging
//! area.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ToolkitError;
use crate::profitability::{deal_profit, summarize_staged, DealInput, StagedDeal, StagedSummary};
use crate::store::{AuthSession, IdentityProvider};
use crate::ToolkitResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    owner: AuthSession,
    #[serde(default)]
    staged: Vec<StagedDeal>,
    #[serde(default)]
    next_seq: u64,
}

/// Result of removing several staged deals at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstageReport {
    pub removed: usize,
    pub unknown: Vec<String>,
}

impl Session {
    pub fn new(owner: AuthSession) -> Self {
        Session {
            owner,
            staged: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn owner(&self) -> &AuthSession {
        &self.owner
    }

    pub fn staged(&self) -> &[StagedDeal] {
        &self.staged
    }

    pub fn staged_summary(&self) -> StagedSummary {
        summarize_staged(&self.staged)
    }

    /// Compute the deal's profit and append it to the staging area.
    ///
    /// Deals without a client name or with a non-positive size are rejected
    /// and the staging area is left untouched.
    pub fn stage(&mut self, input: DealInput) -> ToolkitResult<&StagedDeal> {
        let client = input.client_name.trim();
        if client.is_empty() || input.deal_size <= rust_decimal::Decimal::ZERO {
            tracing::warn!(client = %input.client_name, size = %input.deal_size, "deal not staged");
            return Err(ToolkitError::InvalidInput {
                field: "deal".into(),
                reason: "Client & Size required.".into(),
            });
        }
        let profit = deal_profit(&input)?;

        self.next_seq += 1;
        let temp_id = format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            self.next_seq,
            client.replace(' ', "_")
        );
        tracing::debug!(%temp_id, "deal staged");
        self.staged.push(StagedDeal {
            temp_id,
            input,
            profit,
        });
        Ok(&self.staged[self.staged.len() - 1])
    }

    /// Remove one staged deal. Returns whether it was present.
    pub fn unstage(&mut self, temp_id: &str) -> bool {
        let before = self.staged.len();
        self.staged.retain(|d| d.temp_id != temp_id);
        self.staged.len() != before
    }

    pub fn unstage_many(&mut self, temp_ids: &[String]) -> UnstageReport {
        let mut removed = 0;
        let mut unknown = Vec::new();
        for id in temp_ids {
            if self.unstage(id) {
                removed += 1;
            } else {
                unknown.push(id.clone());
            }
        }
        UnstageReport { removed, unknown }
    }

    pub(crate) fn clear_staged(&mut self) {
        self.staged.clear();
    }
}

/// Sign in and open a fresh session.
pub fn login(
    provider: &impl IdentityProvider,
    email: &str,
    password: &str,
) -> ToolkitResult<Session> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ToolkitError::InvalidInput {
            field: "credentials".into(),
            reason: "Email/Password required.".into(),
        });
    }
    let owner = provider.sign_in_with_password(email.trim(), password)?;
    tracing::info!(user_id = %owner.user_id, "signed in");
    Ok(Session::new(owner))
}

/// Sign out and drop the session, discarding anything still staged.
pub fn logout(provider: &impl IdentityProvider, session: Session) -> ToolkitResult<()> {
    if !session.staged.is_empty() {
        tracing::warn!(count = session.staged.len(), "discarding staged deals at logout");
    }
    provider.sign_out(&session.owner.access_token)?;
    tracing::info!(user_id = %session.owner.user_id, "signed out");
    Ok(())
}

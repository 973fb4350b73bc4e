//! Supabase implementation of the identity and record-store seams:
//! GoTrue for password sign-in, PostgREST for the `deals` table.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{AuthSession, IdentityProvider, RecordStore};
use crate::error::StoreError;
use crate::profitability::{NewDealRow, SavedDeal};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DEALS_TABLE: &str = "deals";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public anon key sent as the `apikey` header on every call.
    pub anon_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_table")]
    pub deals_table: String,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_table() -> String {
    DEFAULT_DEALS_TABLE.to_string()
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        SupabaseConfig {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            deals_table: default_table(),
        }
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.url.trim().is_empty() {
            return Err(StoreError::Config("Supabase URL is not set".into()));
        }
        if self.anon_key.trim().is_empty() {
            return Err(StoreError::Config("Supabase anon key is not set".into()));
        }
        Ok(())
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    deals_table: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(SupabaseClient {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key,
            deals_table: config.deals_table,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.deals_table)
    }

    fn authorized(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }
}

impl IdentityProvider for SupabaseClient {
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, StoreError> {
        tracing::debug!(email, "signing in");
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Auth(error_message(response)));
        }
        let body: TokenResponse = check(response)?
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(AuthSession {
            user_id: body.user.id,
            email: body.user.email.or_else(|| Some(email.to_string())),
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        })
    }

    fn sign_out(&self, access_token: &str) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(self.auth_url("logout")), access_token)
            .send()?;
        check(response)?;
        Ok(())
    }
}

impl RecordStore for SupabaseClient {
    fn insert_many(
        &self,
        access_token: &str,
        rows: &[NewDealRow],
    ) -> Result<Vec<SavedDeal>, StoreError> {
        tracing::info!(rows = rows.len(), table = %self.deals_table, "inserting deals");
        let response = self
            .authorized(self.client.post(self.table_url()), access_token)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()?;
        decode_rows(check(response)?)
    }

    fn select_all(
        &self,
        access_token: &str,
        owner_id: &str,
    ) -> Result<Vec<SavedDeal>, StoreError> {
        let owner_filter = format!("eq.{owner_id}");
        let response = self
            .authorized(self.client.get(self.table_url()), access_token)
            .query(&[
                ("select", "*"),
                ("user_id", owner_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()?;
        let deals = decode_rows(check(response)?)?;
        tracing::info!(count = deals.len(), "fetched saved deals");
        Ok(deals)
    }

    fn delete_one(
        &self,
        access_token: &str,
        id: &str,
        owner_id: &str,
    ) -> Result<bool, StoreError> {
        let id_filter = format!("eq.{id}");
        let owner_filter = format!("eq.{owner_id}");
        let response = self
            .authorized(self.client.delete(self.table_url()), access_token)
            .header("Prefer", "return=representation")
            .query(&[("id", id_filter.as_str()), ("user_id", owner_filter.as_str())])
            .send()?;
        let removed: Vec<serde_json::Value> = check(response)?
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        tracing::info!(id, removed = removed.len(), "delete request completed");
        Ok(!removed.is_empty())
    }
}

fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = error_message(response);
        tracing::warn!(status = status.as_u16(), %message, "store request rejected");
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn decode_rows(response: Response) -> Result<Vec<SavedDeal>, StoreError> {
    response
        .json::<Vec<SavedDeal>>()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Pull the human-readable message out of a GoTrue or PostgREST error body.
fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().unwrap_or_default();
    let parsed: Option<serde_json::Value> = serde_json::from_str(&text).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        })
}

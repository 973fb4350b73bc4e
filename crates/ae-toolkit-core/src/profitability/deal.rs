use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

use crate::error::ToolkitError;
use crate::parse::percent_to_rate;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ToolkitResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A deal as entered: rates are whole percentages (3 = 3% per month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInput {
    #[serde(default)]
    pub client_name: String,
    pub deal_size: Money,
    pub monthly_rate_pct: Percent,
    #[serde(default)]
    pub admin_fee_pct: Percent,
    pub months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealProfit {
    pub monthly_profit: Money,
    pub total_profit: Money,
    pub admin_fee_amount: Money,
    pub gross_profit: Money,
}

/// A deal held in the session, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedDeal {
    pub temp_id: String,
    #[serde(flatten)]
    pub input: DealInput,
    #[serde(flatten)]
    pub profit: DealProfit,
}

/// Row shape for the `deals` table. Amounts are sent as JSON numbers.
#[derive(Debug, Clone, Serialize)]
pub struct NewDealRow {
    pub client_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub deal_size: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_rate: Percent,
    #[serde(with = "rust_decimal::serde::float")]
    pub admin_fee: Percent,
    pub months: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_profit: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub admin_fee_amount: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_profit: Money,
    pub user_id: String,
}

impl NewDealRow {
    pub fn from_staged(deal: &StagedDeal, owner_id: &str) -> Self {
        NewDealRow {
            client_name: deal.input.client_name.clone(),
            deal_size: deal.input.deal_size,
            monthly_rate: deal.input.monthly_rate_pct,
            admin_fee: deal.input.admin_fee_pct,
            months: deal.input.months,
            monthly_profit: deal.profit.monthly_profit,
            total_profit: deal.profit.total_profit,
            admin_fee_amount: deal.profit.admin_fee_amount,
            gross_profit: deal.profit.gross_profit,
            user_id: owner_id.to_string(),
        }
    }
}

/// A persisted deal as returned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDeal {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub user_id: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub deal_size: Money,
    /// Monthly rate as a whole percentage; absent rates are skipped in averages.
    #[serde(default)]
    pub monthly_rate: Option<Percent>,
    #[serde(default)]
    pub admin_fee: Option<Percent>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub months: u32,
    #[serde(default, deserialize_with = "default_if_null")]
    pub monthly_profit: Money,
    #[serde(default, deserialize_with = "default_if_null")]
    pub total_profit: Money,
    #[serde(default, deserialize_with = "default_if_null")]
    pub admin_fee_amount: Money,
    #[serde(default, deserialize_with = "default_if_null")]
    pub gross_profit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedSummary {
    pub count: usize,
    pub total_deal_size: Money,
    pub total_gross_profit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSummary {
    pub count: usize,
    pub total_deal_size: Money,
    pub total_gross_profit: Money,
    /// Mean of the recorded monthly rates (whole percentages); zero when none.
    pub average_monthly_rate: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Profit arithmetic for a single deal.
pub fn deal_profit(input: &DealInput) -> ToolkitResult<DealProfit> {
    validate_deal(input)?;

    let monthly_profit = input
        .deal_size
        .checked_mul(percent_to_rate(input.monthly_rate_pct))
        .ok_or_else(|| ToolkitError::overflow("monthly_rate_pct"))?;
    let total_profit = monthly_profit
        .checked_mul(Decimal::from(input.months))
        .ok_or_else(|| ToolkitError::overflow("months"))?;
    let admin_fee_amount = input
        .deal_size
        .checked_mul(percent_to_rate(input.admin_fee_pct))
        .ok_or_else(|| ToolkitError::overflow("admin_fee_pct"))?;
    let gross_profit = total_profit
        .checked_add(admin_fee_amount)
        .ok_or_else(|| ToolkitError::overflow("deal_size"))?;

    Ok(DealProfit {
        monthly_profit,
        total_profit,
        admin_fee_amount,
        gross_profit,
    })
}

/// [`deal_profit`] wrapped in the standard computation envelope.
pub fn calculate_deal_profit(input: &DealInput) -> ToolkitResult<ComputationOutput<DealProfit>> {
    let start = Instant::now();
    let output = deal_profit(input)?;
    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate_pct": input.monthly_rate_pct.to_string(),
        "admin_fee_pct": input.admin_fee_pct.to_string(),
        "months": input.months,
    });
    Ok(with_metadata(
        "Deal Profitability (flat monthly rate + upfront admin fee)",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

pub fn summarize_staged(deals: &[StagedDeal]) -> StagedSummary {
    StagedSummary {
        count: deals.len(),
        total_deal_size: deals.iter().map(|d| d.input.deal_size).sum(),
        total_gross_profit: deals.iter().map(|d| d.profit.gross_profit).sum(),
    }
}

pub fn summarize_saved(deals: &[SavedDeal]) -> SavedSummary {
    let rates: Vec<Percent> = deals.iter().filter_map(|d| d.monthly_rate).collect();
    let average_monthly_rate = if rates.is_empty() {
        Decimal::ZERO
    } else {
        rates.iter().copied().sum::<Decimal>() / Decimal::from(rates.len())
    };
    SavedSummary {
        count: deals.len(),
        total_deal_size: deals.iter().map(|d| d.deal_size).sum(),
        total_gross_profit: deals.iter().map(|d| d.gross_profit).sum(),
        average_monthly_rate,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_deal(input: &DealInput) -> ToolkitResult<()> {
    let mut errors: Vec<String> = Vec::new();
    if input.deal_size <= Decimal::ZERO {
        errors.push("Deal size must be > 0.".into());
    }
    if input.monthly_rate_pct <= Decimal::ZERO {
        errors.push("Monthly rate must be > 0.".into());
    }
    if input.admin_fee_pct < Decimal::ZERO {
        errors.push("Admin fee must be >= 0.".into());
    }
    if input.months < 1 {
        errors.push("Months must be >= 1.".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolkitError::Validation { violations: errors })
    }
}

/// Store ids may be integers or UUID strings.
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id: {other}"))),
    }
}

/// Accepts RFC 3339 timestamps and offset-less ones (taken as UTC).
fn flexible_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

fn default_if_null<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

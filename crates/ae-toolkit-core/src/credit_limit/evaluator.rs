use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::adjustments::{AdjustmentChain, AdjustmentStep};
use crate::error::ToolkitError;
use crate::format::{format_currency, format_ratio};
use crate::parse::{clean_integer, clean_number, clean_optional};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ToolkitResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_INITIAL_BASE_LIMIT: Money = dec!(2_000_000);
const MIN_FINAL_LIMIT: Money = dec!(100_000);
const MAX_FINAL_LIMIT: Money = dec!(2_000_000);

const CONTRACTOR_BASE_RATE: Rate = dec!(0.15);
const REVENUE_BASE_RATE: Rate = dec!(0.05);
const EXPOSURE_REVENUE_SHARE: Rate = dec!(0.3);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndustryType {
    Trading,
    Manufacturing,
    Contractor,
}

impl fmt::Display for IndustryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndustryType::Trading => "Trading",
            IndustryType::Manufacturing => "Manufacturing",
            IndustryType::Contractor => "Contractor",
        };
        f.write_str(name)
    }
}

impl FromStr for IndustryType {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trading" => Ok(IndustryType::Trading),
            "manufacturing" => Ok(IndustryType::Manufacturing),
            "contractor" => Ok(IndustryType::Contractor),
            other => Err(ToolkitError::InvalidInput {
                field: "industry_type".into(),
                reason: format!("unknown industry '{other}' (Trading, Manufacturing, Contractor)"),
            }),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_years() -> Decimal {
    Decimal::ONE
}

fn default_projects() -> i64 {
    1
}

/// A credit application with amounts already parsed. Rates are fractions
/// (0.05 = 5%). Fields that may be left blank on the form are `Option`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditApplication {
    pub requested_limit: Money,
    pub revenue: Money,
    /// Net profit as a fraction of revenue.
    #[serde(default)]
    pub net_profit_pct: Option<Rate>,
    #[serde(default)]
    pub current_assets: Option<Money>,
    #[serde(default)]
    pub current_liabilities: Option<Money>,
    #[serde(default)]
    pub exposure_outstanding: Money,
    #[serde(default)]
    pub industry_type: Option<IndustryType>,
    /// Only consulted for contractors.
    #[serde(default)]
    pub unbilled_revenue: Option<Money>,
    #[serde(default = "default_true")]
    pub is_saudi_owned: bool,
    #[serde(default = "default_years")]
    pub years_of_operation: Decimal,
    /// Customer concentration above 40% of revenue.
    #[serde(default)]
    pub has_customer_concentration: bool,
    #[serde(default = "default_projects")]
    pub number_of_projects: i64,
    #[serde(default)]
    pub has_previous_payments: bool,
    /// Delays beyond 30 days on previous payments.
    #[serde(default)]
    pub had_payment_delays: bool,
}

/// The credit form as typed by the user: every amount is free-form text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditApplicationForm {
    pub requested_limit: Option<String>,
    pub revenue: Option<String>,
    pub net_profit_pct: Option<String>,
    pub current_assets: Option<String>,
    pub current_liabilities: Option<String>,
    pub exposure_outstanding: Option<String>,
    pub industry_type: Option<IndustryType>,
    pub unbilled_revenue: Option<String>,
    pub is_saudi_owned: bool,
    pub years_of_operation: Option<String>,
    pub has_customer_concentration: bool,
    pub number_of_projects: Option<String>,
    pub has_previous_payments: bool,
    pub had_payment_delays: bool,
}

impl CreditApplicationForm {
    /// Clean every text field. Blank optional fields stay `None` so
    /// validation can report them as missing.
    pub fn to_application(&self) -> CreditApplication {
        let unbilled = match self.industry_type {
            Some(IndustryType::Contractor) => clean_optional(self.unbilled_revenue.as_deref(), false),
            _ => None,
        };
        CreditApplication {
            requested_limit: clean_number(self.requested_limit.as_deref(), false),
            revenue: clean_number(self.revenue.as_deref(), false),
            net_profit_pct: clean_optional(self.net_profit_pct.as_deref(), true),
            current_assets: clean_optional(self.current_assets.as_deref(), false),
            current_liabilities: clean_optional(self.current_liabilities.as_deref(), false),
            exposure_outstanding: clean_number(self.exposure_outstanding.as_deref(), false),
            industry_type: self.industry_type,
            unbilled_revenue: unbilled,
            is_saudi_owned: self.is_saudi_owned,
            years_of_operation: clean_number(self.years_of_operation.as_deref(), false),
            has_customer_concentration: self.has_customer_concentration,
            number_of_projects: clean_integer(self.number_of_projects.as_deref()),
            has_previous_payments: self.has_previous_payments,
            had_payment_delays: self.had_payment_delays,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdApplied {
    None,
    Floor,
    Ceiling,
}

/// How the final limit compares with what the client asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitCoverage {
    Headroom { amount: Money },
    Shortfall { amount: Money },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditResult {
    pub requested_limit: Money,
    pub actual_net_profit: Money,
    pub current_ratio: Decimal,
    pub base_limit_unadjusted: Money,
    pub base_limit_basis: String,
    pub base_cap_applied: bool,
    pub capped_base_limit: Money,
    pub adjustments: Vec<AdjustmentStep>,
    pub limit_after_adjustments: Money,
    pub threshold_applied: ThresholdApplied,
    pub threshold_note: String,
    pub final_limit: Money,
    pub coverage: LimitCoverage,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate, check eligibility and size a credit limit.
pub fn evaluate_credit_limit(
    app: &CreditApplication,
) -> ToolkitResult<ComputationOutput<CreditResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_application(app)?;
    let (actual_net_profit, current_ratio) = check_eligibility(app)?;

    // -- Base limit -----------------------------------------------------------
    let (base_unadjusted, basis) = match app.industry_type {
        Some(IndustryType::Contractor) => {
            let unbilled = app.unbilled_revenue.unwrap_or(Decimal::ZERO);
            let base = unbilled * CONTRACTOR_BASE_RATE;
            (
                base,
                format!(
                    "15% Unbilled ({}) = {}",
                    format_currency(unbilled),
                    format_currency(base)
                ),
            )
        }
        _ => {
            let base = app.revenue * REVENUE_BASE_RATE;
            (
                base,
                format!(
                    "5% Revenue ({}) = {}",
                    format_currency(app.revenue),
                    format_currency(base)
                ),
            )
        }
    };
    let base_cap_applied = base_unadjusted > MAX_INITIAL_BASE_LIMIT;
    let capped_base = base_unadjusted.min(MAX_INITIAL_BASE_LIMIT);

    // -- Adjustments ----------------------------------------------------------
    let outcome = adjustment_chain(app, current_ratio).apply(capped_base);
    let adjusted = outcome.end;

    // -- Final thresholds -----------------------------------------------------
    let mut final_limit = adjusted;
    let mut threshold = ThresholdApplied::None;
    let mut note = "No final floor/ceiling applied.".to_string();
    if final_limit < MIN_FINAL_LIMIT {
        final_limit = MIN_FINAL_LIMIT;
        threshold = ThresholdApplied::Floor;
        note = format!("Floor Applied: {}", format_currency(MIN_FINAL_LIMIT));
    } else if final_limit > MAX_FINAL_LIMIT {
        // A base that was already capped at the same value as the final
        // ceiling is not clamped a second time.
        if base_cap_applied && MAX_FINAL_LIMIT == MAX_INITIAL_BASE_LIMIT {
            warnings.push(format!(
                "Final limit {} exceeds the {} ceiling: ceiling not applied because the base limit was already capped",
                format_currency(final_limit),
                format_currency(MAX_FINAL_LIMIT)
            ));
        } else {
            final_limit = MAX_FINAL_LIMIT;
            threshold = ThresholdApplied::Ceiling;
            note = format!("Ceiling Applied: {}", format_currency(MAX_FINAL_LIMIT));
        }
    }

    let coverage = if final_limit < app.requested_limit {
        LimitCoverage::Shortfall {
            amount: app.requested_limit - final_limit,
        }
    } else {
        LimitCoverage::Headroom {
            amount: final_limit - app.requested_limit,
        }
    };

    tracing::debug!(
        base = %capped_base,
        adjusted = %adjusted,
        final_limit = %final_limit,
        steps = outcome.steps.len(),
        "credit limit evaluated"
    );

    let output = CreditResult {
        requested_limit: app.requested_limit,
        actual_net_profit,
        current_ratio,
        base_limit_unadjusted: base_unadjusted,
        base_limit_basis: basis,
        base_cap_applied,
        capped_base_limit: capped_base,
        adjustments: outcome.steps,
        limit_after_adjustments: adjusted,
        threshold_applied: threshold,
        threshold_note: note,
        final_limit,
        coverage,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "max_initial_base_limit": MAX_INITIAL_BASE_LIMIT.to_string(),
        "min_final_limit": MIN_FINAL_LIMIT.to_string(),
        "max_final_limit": MAX_FINAL_LIMIT.to_string(),
        "industry_type": app.industry_type.map(|i| i.to_string()),
    });

    Ok(with_metadata(
        "Credit Limit (revenue base + sequential adjustments)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Human-readable summary of the scoring rules.
pub fn rules_overview() -> &'static str {
    "Base Credit Limit
  - Trading/Manufacturing: 5% of Revenue
  - Contractor: 15% of Unbilled Revenue
  - (Initial Base Limit capped at 2,000,000 SAR)

Negative Adjustments (Applied Sequentially)
  - Exposure > 30% of Revenue: -35%
  - Non-Saudi company: -10%
  - Company < 3 years old: -10%
  - Customer concentration > 40%: -10%
  - Payment delays > 30 days (if prev. payments exist): -10%
  - Number of Projects < 3: -5%

Positive Adjustments (Applied Sequentially)
  - Current Ratio > 2: +5%
  - Years in Business > 10: +5%
  - Previous Timely Payments (no delays, if prev. payments exist): +10%

Limits (Applied Finally)
  - Minimum Credit Limit: 100,000 SAR
  - Maximum Credit Limit: 2,000,000 SAR"
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn adjustment_chain(app: &CreditApplication, current_ratio: Decimal) -> AdjustmentChain {
    let timely = app.has_previous_payments && !app.had_payment_delays;
    let delayed = app.has_previous_payments && app.had_payment_delays;

    AdjustmentChain::new()
        .rule(
            "Exposure > 30% Revenue",
            dec!(0.65),
            app.exposure_outstanding > app.revenue * EXPOSURE_REVENUE_SHARE,
        )
        .rule("Non-Saudi company", dec!(0.90), !app.is_saudi_owned)
        .rule("Company < 3 years old", dec!(0.90), app.years_of_operation < dec!(3))
        .rule(
            "Customer concentration > 40%",
            dec!(0.90),
            app.has_customer_concentration,
        )
        .rule("Payment delays > 30 days", dec!(0.90), delayed)
        .rule("Number of Projects < 3", dec!(0.95), app.number_of_projects < 3)
        .rule(
            format!("Current Ratio > 2 ({})", format_ratio(current_ratio)),
            dec!(1.05),
            current_ratio > dec!(2),
        )
        .rule("Years in Business > 10", dec!(1.05), app.years_of_operation > dec!(10))
        .rule("Previous Timely Payments", dec!(1.10), timely)
}

fn validate_application(app: &CreditApplication) -> ToolkitResult<()> {
    let mut errors: Vec<String> = Vec::new();

    if app.requested_limit <= Decimal::ZERO {
        errors.push("Requested limit must be > 0.".into());
    }
    if app.revenue <= Decimal::ZERO {
        errors.push("Revenue must be > 0.".into());
    }
    if app.exposure_outstanding < Decimal::ZERO {
        errors.push("Exposure outstanding must be >= 0.".into());
    }
    match app.industry_type {
        None => errors.push("Industry type required.".into()),
        Some(IndustryType::Contractor) => match app.unbilled_revenue {
            None => errors.push("Unbilled revenue required.".into()),
            Some(u) if u <= Decimal::ZERO => errors.push("Unbilled revenue must be > 0.".into()),
            Some(_) => {}
        },
        Some(_) => {}
    }
    if app.years_of_operation <= Decimal::ZERO {
        errors.push("Years of operation must be > 0.".into());
    }
    if app.number_of_projects < 1 {
        errors.push("Number of projects must be >= 1.".into());
    }
    match app.net_profit_pct {
        None => errors.push("Net profit % required.".into()),
        Some(p) if p <= Decimal::ZERO => errors.push("Net profit % must be > 0.".into()),
        Some(_) => {}
    }
    if app.current_assets.is_none() {
        errors.push("Current assets required.".into());
    }
    if app.current_liabilities.is_none() {
        errors.push("Current liabilities required.".into());
    }
    if app.current_assets.unwrap_or(Decimal::ZERO) <= Decimal::ZERO {
        errors.push("Current assets must be > 0.".into());
    }
    if app.current_liabilities.unwrap_or(Decimal::ZERO) <= Decimal::ZERO {
        errors.push("Current liabilities must be > 0.".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolkitError::Validation { violations: errors })
    }
}

/// Returns (actual net profit, current ratio) when eligible.
fn check_eligibility(app: &CreditApplication) -> ToolkitResult<(Money, Decimal)> {
    let mut reasons: Vec<String> = Vec::new();

    let actual_net_profit = app
        .revenue
        .checked_mul(app.net_profit_pct.unwrap_or(Decimal::ZERO))
        .ok_or_else(|| ToolkitError::overflow("net_profit_pct"))?;
    if actual_net_profit <= Decimal::ZERO {
        reasons.push("Net profit > 0% required.".into());
    }

    let assets = app.current_assets.unwrap_or(Decimal::ZERO);
    let liabilities = app.current_liabilities.unwrap_or(Decimal::ZERO);
    let current_ratio = if liabilities.is_zero() {
        reasons.push("Valid current assets/liabilities needed.".into());
        Decimal::ZERO
    } else {
        let ratio = assets
            .checked_div(liabilities)
            .ok_or_else(|| ToolkitError::overflow("current_assets"))?;
        if ratio <= Decimal::ONE {
            reasons.push(format!(
                "Current ratio > 1 required (is {}).",
                format_ratio(ratio)
            ));
        }
        ratio
    };

    if reasons.is_empty() {
        Ok((actual_net_profit, current_ratio))
    } else {
        Err(ToolkitError::Ineligible { reasons })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

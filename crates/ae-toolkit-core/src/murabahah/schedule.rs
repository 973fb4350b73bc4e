use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ToolkitError;
use crate::parse::percent_to_rate;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ToolkitResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MIN_PROFIT_RATE_PCT: Percent = dec!(1);
const MAX_PROFIT_RATE_PCT: Percent = dec!(5);
const MIN_PERIOD_MONTHS: u32 = 1;
const MAX_PERIOD_MONTHS: u32 = 12;
const MAX_ADMIN_FEE_PCT: Percent = dec!(5);

/// Scale at which schedule amounts are carried. Keeps every addition and
/// subtraction exact so the principal column sums back to the deal size.
const SCHEDULE_DP: u32 = 10;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MurabahahPlan {
    pub deal_size: Money,
    /// Monthly profit rate as a whole percentage, 1 to 5.
    pub monthly_profit_rate_pct: Percent,
    /// Financing period in months, 1 to 12.
    pub financing_period_months: u32,
    /// Admin fee as a whole percentage of deal size, 0 to 5.
    pub admin_fee_pct: Percent,
}

impl Default for MurabahahPlan {
    fn default() -> Self {
        MurabahahPlan {
            deal_size: dec!(100_000),
            monthly_profit_rate_pct: dec!(2.5),
            financing_period_months: 3,
            admin_fee_pct: dec!(1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRow {
    pub month: u32,
    pub installment: Money,
    pub principal: Money,
    pub profit: Money,
    pub admin_fee_paid: Money,
    pub remaining_principal: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MurabahahResult {
    pub admin_fee_amount: Money,
    /// Admin fee collected over the whole term. Charged once, in month one.
    pub total_admin_fee: Money,
    pub total_profit: Money,
    pub total_earnings: Money,
    pub base_repayment_per_month: Money,
    pub first_month_payment: Money,
    pub subsequent_monthly_payment: Money,
    pub schedule: Vec<MonthRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the Murabahah payment summary and month-by-month schedule.
pub fn calculate_murabahah(
    plan: &MurabahahPlan,
) -> ToolkitResult<ComputationOutput<MurabahahResult>> {
    let start = Instant::now();

    validate_plan(plan)?;

    let months = Decimal::from(plan.financing_period_months);
    let monthly_rate = percent_to_rate(plan.monthly_profit_rate_pct);
    let admin_fee_amount = plan
        .deal_size
        .checked_mul(percent_to_rate(plan.admin_fee_pct))
        .ok_or_else(|| ToolkitError::overflow("admin_fee_pct"))?;
    let total_profit = plan
        .deal_size
        .checked_mul(monthly_rate)
        .and_then(|monthly| monthly.checked_mul(months))
        .ok_or_else(|| ToolkitError::overflow("deal_size"))?;
    let total_earnings = total_profit
        .checked_add(admin_fee_amount)
        .ok_or_else(|| ToolkitError::overflow("deal_size"))?;

    let base_repayment = plan
        .deal_size
        .checked_add(total_profit)
        .and_then(|owed| owed.checked_div(months))
        .ok_or_else(|| ToolkitError::overflow("deal_size"))?
        .round_dp(SCHEDULE_DP);
    let first_month_payment = base_repayment
        .checked_add(admin_fee_amount)
        .ok_or_else(|| ToolkitError::overflow("deal_size"))?;

    let mut schedule = Vec::with_capacity(plan.financing_period_months as usize);
    let mut remaining = plan.deal_size;
    for month in 1..=plan.financing_period_months {
        let profit = (remaining * monthly_rate).round_dp(SCHEDULE_DP);
        let (installment, fee_paid) = if month == 1 {
            (first_month_payment, admin_fee_amount)
        } else {
            (base_repayment, Decimal::ZERO)
        };
        let principal = if month == plan.financing_period_months {
            remaining
        } else {
            (installment - profit - fee_paid).max(Decimal::ZERO)
        };
        remaining -= principal;
        schedule.push(MonthRow {
            month,
            installment,
            principal,
            profit,
            admin_fee_paid: fee_paid,
            remaining_principal: remaining.max(Decimal::ZERO),
        });
    }

    tracing::debug!(
        deal_size = %plan.deal_size,
        months = plan.financing_period_months,
        %total_earnings,
        "murabahah schedule built"
    );

    let output = MurabahahResult {
        admin_fee_amount,
        total_admin_fee: schedule.iter().map(|r| r.admin_fee_paid).sum(),
        total_profit,
        total_earnings,
        base_repayment_per_month: base_repayment,
        first_month_payment,
        subsequent_monthly_payment: base_repayment,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "admin_fee_timing": "month_1",
        "profit_basis": "declining_principal",
        "schedule_scale_dp": SCHEDULE_DP,
    });

    Ok(with_metadata(
        "Murabahah (flat installments, profit on declining principal)",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_plan(plan: &MurabahahPlan) -> ToolkitResult<()> {
    let mut errors: Vec<String> = Vec::new();
    if plan.deal_size <= Decimal::ZERO {
        errors.push("Deal size must be > 0.".into());
    }
    if plan.monthly_profit_rate_pct < MIN_PROFIT_RATE_PCT
        || plan.monthly_profit_rate_pct > MAX_PROFIT_RATE_PCT
    {
        errors.push(format!(
            "Monthly profit rate must be between {MIN_PROFIT_RATE_PCT}% and {MAX_PROFIT_RATE_PCT}%."
        ));
    }
    if plan.financing_period_months < MIN_PERIOD_MONTHS
        || plan.financing_period_months > MAX_PERIOD_MONTHS
    {
        errors.push(format!(
            "Financing period must be between {MIN_PERIOD_MONTHS} and {MAX_PERIOD_MONTHS} months."
        ));
    }
    if plan.admin_fee_pct < Decimal::ZERO || plan.admin_fee_pct > MAX_ADMIN_FEE_PCT {
        errors.push(format!("Admin fee must be between 0% and {MAX_ADMIN_FEE_PCT}%."));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolkitError::Validation { violations: errors })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use clap::Args;
use serde_json::Value;

use ae_toolkit_core::murabahah::{calculate_murabahah, MurabahahPlan};
use ae_toolkit_core::parse::clean_optional;

use crate::input;

/// Arguments for a Murabahah schedule. Omitted or blank flags take the
/// default plan: 100,000 SAR, 2.5% per month, 3 months, 1.5% admin fee.
#[derive(Args)]
pub struct MurabahahArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Deal size (SAR); grouping commas are accepted
    #[arg(long)]
    pub deal_size: Option<String>,

    /// Monthly profit rate in percent (1 to 5)
    #[arg(long, alias = "rate")]
    pub monthly_profit_rate: Option<String>,

    /// Financing period in months (1 to 12)
    #[arg(long)]
    pub months: Option<u32>,

    /// Admin fee in percent of deal size (0 to 5)
    #[arg(long)]
    pub admin_fee: Option<String>,
}

pub fn run_murabahah(args: MurabahahArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan: MurabahahPlan = match input::read_typed(args.input.as_deref())? {
        Some(plan) => plan,
        None => plan_from_flags(&args),
    };

    let result = calculate_murabahah(&plan)?;
    Ok(serde_json::to_value(result)?)
}

fn plan_from_flags(args: &MurabahahArgs) -> MurabahahPlan {
    let defaults = MurabahahPlan::default();
    MurabahahPlan {
        deal_size: clean_optional(args.deal_size.as_deref(), false).unwrap_or(defaults.deal_size),
        monthly_profit_rate_pct: clean_optional(args.monthly_profit_rate.as_deref(), false)
            .unwrap_or(defaults.monthly_profit_rate_pct),
        financing_period_months: args.months.unwrap_or(defaults.financing_period_months),
        admin_fee_pct: clean_optional(args.admin_fee.as_deref(), false)
            .unwrap_or(defaults.admin_fee_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn flags(deal_size: Option<&str>, rate: Option<&str>, admin_fee: Option<&str>) -> MurabahahArgs {
        MurabahahArgs {
            input: None,
            deal_size: deal_size.map(str::to_string),
            monthly_profit_rate: rate.map(str::to_string),
            months: None,
            admin_fee: admin_fee.map(str::to_string),
        }
    }

    #[test]
    fn test_flags_accept_grouped_text() {
        let plan = plan_from_flags(&flags(Some("250,000"), Some("3%"), Some(" 2 ")));
        assert_eq!(plan.deal_size, Decimal::from(250_000));
        assert_eq!(plan.monthly_profit_rate_pct, Decimal::from(3));
        assert_eq!(plan.admin_fee_pct, Decimal::from(2));
        assert_eq!(plan.financing_period_months, 3);
    }

    #[test]
    fn test_missing_or_blank_flags_use_defaults() {
        let plan = plan_from_flags(&flags(None, Some("  "), None));
        let defaults = MurabahahPlan::default();
        assert_eq!(plan.deal_size, defaults.deal_size);
        assert_eq!(plan.monthly_profit_rate_pct, defaults.monthly_profit_rate_pct);
        assert_eq!(plan.admin_fee_pct, defaults.admin_fee_pct);
    }
}

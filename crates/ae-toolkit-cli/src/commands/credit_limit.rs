use clap::Args;
use serde_json::Value;

use ae_toolkit_core::credit_limit::{
    evaluate_credit_limit, CreditApplication, CreditApplicationForm, IndustryType,
};

use crate::input;

/// Arguments for credit limit evaluation. Amounts are free text and may
/// carry thousands separators ("1,500,000") or a percent sign ("8%").
#[derive(Args)]
pub struct CreditLimitArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested credit limit (SAR)
    #[arg(long)]
    pub requested_limit: Option<String>,

    /// Annual revenue (SAR)
    #[arg(long)]
    pub revenue: Option<String>,

    /// Net profit as a percentage of revenue
    #[arg(long)]
    pub net_profit_pct: Option<String>,

    /// Current assets (SAR)
    #[arg(long)]
    pub current_assets: Option<String>,

    /// Current liabilities (SAR)
    #[arg(long)]
    pub current_liabilities: Option<String>,

    /// Exposure outstanding (SAR)
    #[arg(long, alias = "exposure")]
    pub exposure_outstanding: Option<String>,

    /// Industry: trading, manufacturing or contractor
    #[arg(long)]
    pub industry: Option<String>,

    /// Unbilled revenue (SAR), contractors only
    #[arg(long)]
    pub unbilled_revenue: Option<String>,

    /// Company is not Saudi-owned
    #[arg(long)]
    pub non_saudi: bool,

    /// Years of operation
    #[arg(long, alias = "years")]
    pub years_of_operation: Option<String>,

    /// Customer concentration above 40% of revenue
    #[arg(long)]
    pub customer_concentration: bool,

    /// Number of projects
    #[arg(long, alias = "projects")]
    pub number_of_projects: Option<String>,

    /// Has a previous payment history
    #[arg(long)]
    pub previous_payments: bool,

    /// Previous payments were delayed beyond 30 days
    #[arg(long)]
    pub payment_delays: bool,
}

pub fn run_credit_limit(args: CreditLimitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let application: CreditApplication = match input::read_typed(args.input.as_deref())? {
        Some(app) => app,
        None => application_from_flags(&args)?,
    };

    let result = evaluate_credit_limit(&application)?;
    Ok(serde_json::to_value(result)?)
}

fn application_from_flags(
    args: &CreditLimitArgs,
) -> Result<CreditApplication, Box<dyn std::error::Error>> {
    let industry_type = args
        .industry
        .as_deref()
        .map(str::parse::<IndustryType>)
        .transpose()?;

    let form = CreditApplicationForm {
        requested_limit: args.requested_limit.clone(),
        revenue: args.revenue.clone(),
        net_profit_pct: args.net_profit_pct.clone(),
        current_assets: args.current_assets.clone(),
        current_liabilities: args.current_liabilities.clone(),
        exposure_outstanding: args.exposure_outstanding.clone(),
        industry_type,
        unbilled_revenue: args.unbilled_revenue.clone(),
        is_saudi_owned: !args.non_saudi,
        years_of_operation: args.years_of_operation.clone(),
        has_customer_concentration: args.customer_concentration,
        number_of_projects: args.number_of_projects.clone(),
        has_previous_payments: args.previous_payments,
        had_payment_delays: args.payment_delays,
    };
    Ok(form.to_application())
}

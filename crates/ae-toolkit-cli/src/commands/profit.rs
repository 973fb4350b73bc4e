use clap::Args;
use serde_json::{json, Value};

use ae_toolkit_core::parse::{clean_integer, clean_number};
use ae_toolkit_core::profitability::{calculate_deal_profit, DealInput};

use crate::config::AppConfig;
use crate::{input, session_file};

/// Deal fields shared by `profit` and `stage`. Rates are whole percentages
/// ("3" or "3%" is 3% per month).
#[derive(Args)]
pub struct DealFlags {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Client name
    #[arg(long)]
    pub client: Option<String>,

    /// Deal size (SAR)
    #[arg(long)]
    pub deal_size: Option<String>,

    /// Monthly rate in percent
    #[arg(long, alias = "rate")]
    pub monthly_rate: Option<String>,

    /// Admin fee in percent of deal size
    #[arg(long)]
    pub admin_fee: Option<String>,

    /// Number of months
    #[arg(long)]
    pub months: Option<String>,
}

#[derive(Args)]
pub struct ProfitArgs {
    #[command(flatten)]
    pub deal: DealFlags,
}

#[derive(Args)]
pub struct StageArgs {
    #[command(flatten)]
    pub deal: DealFlags,
}

pub fn run_profit(args: ProfitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = deal_input(&args.deal)?;
    let result = calculate_deal_profit(&deal)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stage(args: StageArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let path = settings.session_path();
    let mut session = session_file::load(&path)?;
    let deal = deal_input(&args.deal)?;

    let staged = serde_json::to_value(session.stage(deal)?)?;
    session_file::save(&path, &session)?;

    Ok(json!({
        "staged_deal": staged,
        "summary": session.staged_summary(),
    }))
}

fn deal_input(flags: &DealFlags) -> Result<DealInput, Box<dyn std::error::Error>> {
    if let Some(deal) = input::read_typed(flags.input.as_deref())? {
        return Ok(deal);
    }
    let months = clean_integer(flags.months.as_deref());
    Ok(DealInput {
        client_name: flags.client.clone().unwrap_or_default().trim().to_string(),
        deal_size: clean_number(flags.deal_size.as_deref(), false),
        monthly_rate_pct: clean_number(flags.monthly_rate.as_deref(), false),
        admin_fee_pct: clean_number(flags.admin_fee.as_deref(), false),
        months: u32::try_from(months).map_err(|_| format!("--months must be >= 0 (got {months})"))?,
    })
}

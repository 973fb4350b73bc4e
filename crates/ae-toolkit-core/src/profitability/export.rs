use std::io::Write;

use super::deal::SavedDeal;
use crate::error::ToolkitError;
use crate::format::{format_amount, format_percentage};
use crate::ToolkitResult;

/// Suggested file name for the saved-deals download.
pub const EXPORT_FILE_NAME: &str = "ae_saved_deals.csv";

const HEADER: [&str; 7] = [
    "Saved On",
    "Client Name",
    "Deal Size (SAR)",
    "Monthly Rate",
    "Admin Fee %",
    "Months",
    "Gross Profit (SAR)",
];

const NOT_AVAILABLE: &str = "N/A";

/// Write saved deals as CSV, one row per deal, in the order given.
pub fn write_saved_deals_csv<W: Write>(writer: W, deals: &[SavedDeal]) -> ToolkitResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for deal in deals {
        wtr.write_record([
            deal.created_at.format("%Y-%m-%d %H:%M").to_string(),
            deal.client_name.clone(),
            format_amount(deal.deal_size),
            deal.monthly_rate
                .map(format_percentage)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            deal.admin_fee
                .map(format_percentage)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            deal.months.to_string(),
            format_amount(deal.gross_profit),
        ])?;
    }
    wtr.flush().map_err(|e| ToolkitError::Export(e.to_string()))?;
    Ok(())
}

/// Render saved deals as a CSV string.
pub fn export_saved_deals_csv(deals: &[SavedDeal]) -> ToolkitResult<String> {
    let mut buf = Vec::new();
    write_saved_deals_csv(&mut buf, deals)?;
    String::from_utf8(buf).map_err(|e| ToolkitError::Export(e.to_string()))
}

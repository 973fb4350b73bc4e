//! Deal profitability: per-deal arithmetic plus the staging, bulk-save,
//! load and delete workflow against a user-scoped record store.

pub mod bundle;
pub mod deal;
pub mod export;

pub use bundle::{
    delete_saved_deal, delete_saved_deals, load_saved_deals, save_staged_bundle,
    BundleSaveReport, DeleteFailure, DeleteReport, SaveOutcome, SkippedDeal,
};
pub use deal::{
    calculate_deal_profit, deal_profit, summarize_saved, summarize_staged, DealInput, DealProfit,
    NewDealRow, SavedDeal, SavedSummary, StagedDeal, StagedSummary,
};
pub use export::{export_saved_deals_csv, write_saved_deals_csv, EXPORT_FILE_NAME};

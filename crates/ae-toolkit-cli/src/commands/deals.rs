use clap::Args;
use serde_json::{json, Value};
use std::fs::File;
use std::io::BufWriter;

use ae_toolkit_core::profitability::{
    delete_saved_deals, load_saved_deals, save_staged_bundle, summarize_saved,
    write_saved_deals_csv, EXPORT_FILE_NAME,
};
use ae_toolkit_core::session::{login, logout};
use ae_toolkit_core::store::supabase::SupabaseClient;

use crate::config::AppConfig;
use crate::session_file;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

#[derive(Args)]
pub struct UnstageArgs {
    /// Temporary ids of the staged deals to remove
    #[arg(required = true)]
    pub temp_ids: Vec<String>,
}

#[derive(Args)]
pub struct DealsArgs {
    /// Only print the totals
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Ids of the saved deals to delete
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file
    #[arg(long, default_value = EXPORT_FILE_NAME)]
    pub out: String,
}

fn open_store(settings: &AppConfig) -> Result<SupabaseClient, Box<dyn std::error::Error>> {
    Ok(SupabaseClient::new(settings.supabase()?)?)
}

pub fn run_login(args: LoginArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let store = open_store(settings)?;
    let session = login(&store, &args.email, &args.password)?;
    session_file::save(&settings.session_path(), &session)?;

    Ok(json!({
        "user_id": session.owner().user_id,
        "email": session.owner().email,
    }))
}

pub fn run_logout(settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let path = settings.session_path();
    let session = session_file::load(&path)?;
    let user_id = session.owner().user_id.clone();
    let discarded = session.staged().len();

    // The local session goes even when the provider rejects the sign-out.
    let signed_out = open_store(settings)
        .and_then(|store| logout(&store, session).map_err(Into::into));
    session_file::remove(&path)?;
    signed_out?;

    Ok(json!({
        "user_id": user_id,
        "discarded_staged_deals": discarded,
    }))
}

pub fn run_unstage(args: UnstageArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let path = settings.session_path();
    let mut session = session_file::load(&path)?;
    let report = session.unstage_many(&args.temp_ids);
    session_file::save(&path, &session)?;

    Ok(json!({
        "removed": report.removed,
        "unknown": report.unknown,
        "summary": session.staged_summary(),
    }))
}

pub fn run_staged(settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let session = session_file::load(&settings.session_path())?;
    Ok(json!({
        "summary": session.staged_summary(),
        "staged": session.staged(),
    }))
}

pub fn run_save(settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let path = settings.session_path();
    let mut session = session_file::load(&path)?;
    let store = open_store(settings)?;

    let report = save_staged_bundle(&mut session, &store);
    session_file::save(&path, &session)?;

    report.outcome.clone().into_result()?;
    Ok(serde_json::to_value(report)?)
}

pub fn run_deals(args: DealsArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let session = session_file::load(&settings.session_path())?;
    let deals = load_saved_deals(&session, &open_store(settings)?)?;
    let summary = summarize_saved(&deals);

    if args.summary {
        return Ok(serde_json::to_value(summary)?);
    }
    Ok(json!({
        "summary": summary,
        "deals": deals,
    }))
}

pub fn run_delete(args: DeleteArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let session = session_file::load(&settings.session_path())?;
    let report = delete_saved_deals(&session, &open_store(settings)?, &args.ids);
    Ok(serde_json::to_value(report)?)
}

pub fn run_export(args: ExportArgs, settings: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let session = session_file::load(&settings.session_path())?;
    let deals = load_saved_deals(&session, &open_store(settings)?)?;

    let file = File::create(&args.out)
        .map_err(|e| format!("Failed to create '{}': {}", args.out, e))?;
    write_saved_deals_csv(BufWriter::new(file), &deals)?;

    Ok(json!({
        "path": args.out,
        "count": deals.len(),
    }))
}

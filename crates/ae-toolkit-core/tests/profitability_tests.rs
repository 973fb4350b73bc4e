use std::cell::RefCell;

use ae_toolkit_core::profitability::{
    delete_saved_deals, export_saved_deals_csv, load_saved_deals, save_staged_bundle,
    summarize_saved, DealInput, NewDealRow, SaveOutcome, SavedDeal, SkippedDeal,
};
use ae_toolkit_core::session::Session;
use ae_toolkit_core::store::{AuthSession, RecordStore};
use ae_toolkit_core::{StoreError, ToolkitError};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// In-memory record store
// ===========================================================================

#[derive(Default)]
struct MemoryStore {
    rows: RefCell<Vec<SavedDeal>>,
    /// Commit at most this many rows per insert.
    insert_limit: Option<usize>,
    fail_with: Option<String>,
}

impl MemoryStore {
    fn to_saved(row: &NewDealRow, id: usize) -> SavedDeal {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "user_id": row.user_id,
            "created_at": format!("2025-03-01T09:{:02}:00+00:00", id % 60),
            "client_name": row.client_name,
            "deal_size": row.deal_size.to_string(),
            "monthly_rate": row.monthly_rate.to_string(),
            "admin_fee": row.admin_fee.to_string(),
            "months": row.months,
            "monthly_profit": row.monthly_profit.to_string(),
            "total_profit": row.total_profit.to_string(),
            "admin_fee_amount": row.admin_fee_amount.to_string(),
            "gross_profit": row.gross_profit.to_string(),
        }))
        .unwrap()
    }
}

impl RecordStore for MemoryStore {
    fn insert_many(&self, _token: &str, rows: &[NewDealRow]) -> Result<Vec<SavedDeal>, StoreError> {
        if let Some(msg) = &self.fail_with {
            return Err(StoreError::Api {
                status: 500,
                message: msg.clone(),
            });
        }
        let take = self.insert_limit.unwrap_or(rows.len()).min(rows.len());
        let mut stored = self.rows.borrow_mut();
        let mut inserted = Vec::new();
        for row in &rows[..take] {
            let saved = Self::to_saved(row, stored.len() + 1);
            stored.push(saved.clone());
            inserted.push(saved);
        }
        Ok(inserted)
    }

    fn select_all(&self, _token: &str, owner_id: &str) -> Result<Vec<SavedDeal>, StoreError> {
        let mut deals: Vec<SavedDeal> = self
            .rows
            .borrow()
            .iter()
            .filter(|d| d.user_id == owner_id)
            .cloned()
            .collect();
        deals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(deals)
    }

    fn delete_one(&self, _token: &str, id: &str, owner_id: &str) -> Result<bool, StoreError> {
        if id == "boom" {
            return Err(StoreError::Api {
                status: 503,
                message: "unavailable".into(),
            });
        }
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|d| !(d.id == id && d.user_id == owner_id));
        Ok(rows.len() != before)
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

fn session_for(user_id: &str) -> Session {
    Session::new(AuthSession {
        user_id: user_id.into(),
        email: None,
        access_token: "token".into(),
        refresh_token: None,
    })
}

fn deal(client: &str, size: Decimal) -> DealInput {
    DealInput {
        client_name: client.into(),
        deal_size: size,
        monthly_rate_pct: dec!(3),
        admin_fee_pct: dec!(1.5),
        months: 4,
    }
}

fn staged_session(n: usize) -> Session {
    let mut session = session_for("user-1");
    for i in 0..n {
        session
            .stage(deal(&format!("Client {i}"), dec!(100_000) * Decimal::from(i + 1)))
            .unwrap();
    }
    session
}

/// A session restored from disk whose staging holds deals that `stage`
/// would have refused.
fn restored_session(staged: serde_json::Value) -> Session {
    serde_json::from_value(serde_json::json!({
        "owner": {
            "user_id": "user-1",
            "access_token": "token",
        },
        "staged": staged,
        "next_seq": 3,
    }))
    .unwrap()
}

fn raw_staged(temp_id: &str, client: &str, months: u32) -> serde_json::Value {
    serde_json::json!({
        "temp_id": temp_id,
        "client_name": client,
        "deal_size": "100000",
        "monthly_rate_pct": "3",
        "admin_fee_pct": "1.5",
        "months": months,
        "monthly_profit": "3000",
        "total_profit": "12000",
        "admin_fee_amount": "1500",
        "gross_profit": "13500",
    })
}

// ===========================================================================
// Bulk save
// ===========================================================================

#[test]
fn test_full_save_clears_staging() {
    let store = MemoryStore::default();
    let mut session = staged_session(3);
    let report = save_staged_bundle(&mut session, &store);
    assert_eq!(report.outcome, SaveOutcome::FullSuccess { saved: 3 });
    assert!(report.skipped.is_empty());
    assert!(session.staged().is_empty());
    assert_eq!(store.rows.borrow().len(), 3);
}

#[test]
fn test_count_mismatch_keeps_staging() {
    let store = MemoryStore {
        insert_limit: Some(2),
        ..MemoryStore::default()
    };
    let mut session = staged_session(3);
    let report = save_staged_bundle(&mut session, &store);
    assert_eq!(
        report.outcome,
        SaveOutcome::PartialSuccess {
            saved: 2,
            attempted: 3
        }
    );
    assert_eq!(session.staged().len(), 3);
    assert!(matches!(
        report.outcome.into_result(),
        Err(ToolkitError::PartialSave { saved: 2, attempted: 3 })
    ));
}

#[test]
fn test_invalid_staged_deals_are_skipped_and_reported() {
    let store = MemoryStore::default();
    let mut session = restored_session(serde_json::json!([
        raw_staged("tmp-1", "Al Noor Trading", 4),
        raw_staged("tmp-2", "Zero Term Co", 0),
        raw_staged("tmp-3", "  ", 4),
    ]));
    let report = save_staged_bundle(&mut session, &store);

    assert_eq!(report.outcome, SaveOutcome::FullSuccess { saved: 1 });
    assert_eq!(
        report.skipped,
        vec![
            SkippedDeal {
                temp_id: "tmp-2".into(),
                client_name: "Zero Term Co".into(),
                reason: "months must be > 0".into(),
            },
            SkippedDeal {
                temp_id: "tmp-3".into(),
                client_name: "  ".into(),
                reason: "missing client name".into(),
            },
        ]
    );
    let stored = store.rows.borrow();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].client_name, "Al Noor Trading");
    assert_eq!(stored[0].months, 4);
}

#[test]
fn test_all_invalid_staging_fails_and_is_kept() {
    let store = MemoryStore::default();
    let mut session = restored_session(serde_json::json!([
        raw_staged("tmp-1", "", 4),
        raw_staged("tmp-2", "Zero Term Co", 0),
    ]));
    let report = save_staged_bundle(&mut session, &store);

    assert_eq!(
        report.outcome,
        SaveOutcome::Failure {
            reason: "No valid deals remaining.".into()
        }
    );
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(session.staged().len(), 2);
    assert!(store.rows.borrow().is_empty());
}

#[test]
fn test_empty_response_is_failure() {
    let store = MemoryStore {
        insert_limit: Some(0),
        ..MemoryStore::default()
    };
    let mut session = staged_session(2);
    let report = save_staged_bundle(&mut session, &store);
    assert_eq!(
        report.outcome,
        SaveOutcome::Failure {
            reason: "Bulk save failed: no data returned.".into()
        }
    );
    assert_eq!(session.staged().len(), 2);
}

#[test]
fn test_store_error_is_reported_verbatim() {
    let store = MemoryStore {
        fail_with: Some("duplicate key value".into()),
        ..MemoryStore::default()
    };
    let mut session = staged_session(1);
    let report = save_staged_bundle(&mut session, &store);
    match report.outcome {
        SaveOutcome::Failure { reason } => assert!(reason.contains("duplicate key value")),
        other => panic!("Expected Failure, got {other:?}"),
    }
    assert_eq!(session.staged().len(), 1);
}

#[test]
fn test_nothing_staged_fails_without_store_call() {
    let store = MemoryStore::default();
    let mut session = session_for("user-1");
    let report = save_staged_bundle(&mut session, &store);
    assert_eq!(
        report.outcome,
        SaveOutcome::Failure {
            reason: "No deals to save.".into()
        }
    );
    assert!(store.rows.borrow().is_empty());
}

#[test]
fn test_missing_token_fails() {
    let store = MemoryStore::default();
    let mut session = Session::new(AuthSession {
        user_id: "user-1".into(),
        email: None,
        access_token: "  ".into(),
        refresh_token: None,
    });
    session.stage(deal("A", dec!(1_000))).unwrap();
    let report = save_staged_bundle(&mut session, &store);
    assert!(!report.outcome.is_success());
    assert_eq!(session.staged().len(), 1);
}

// ===========================================================================
// Load, delete, export
// ===========================================================================

#[test]
fn test_load_is_owner_scoped_and_newest_first() {
    let store = MemoryStore::default();
    let mut mine = staged_session(2);
    save_staged_bundle(&mut mine, &store);
    let mut theirs = session_for("user-2");
    theirs.stage(deal("Other", dec!(50_000))).unwrap();
    save_staged_bundle(&mut theirs, &store);

    let deals = load_saved_deals(&mine, &store).unwrap();
    assert_eq!(deals.len(), 2);
    assert_eq!(deals[0].client_name, "Client 1");
    assert_eq!(deals[1].client_name, "Client 0");

    let summary = summarize_saved(&deals);
    assert_eq!(summary.total_deal_size, dec!(300_000));
    // 100k and 200k at 3% for 4 months plus 1.5% fee
    assert_eq!(summary.total_gross_profit, dec!(40_500));
    assert_eq!(summary.average_monthly_rate, dec!(3));
}

#[test]
fn test_delete_batch_continues_past_failures() {
    let store = MemoryStore::default();
    let mut session = staged_session(2);
    save_staged_bundle(&mut session, &store);

    let ids = vec![
        "1".to_string(),
        "boom".to_string(),
        "99".to_string(),
        "2".to_string(),
    ];
    let report = delete_saved_deals(&session, &store, &ids);
    assert_eq!(report.attempted, 4);
    assert_eq!(report.deleted, 2);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(failed, vec!["boom", "99"]);
    assert!(store.rows.borrow().is_empty());
}

#[test]
fn test_delete_respects_owner() {
    let store = MemoryStore::default();
    let mut owner = staged_session(1);
    save_staged_bundle(&mut owner, &store);

    let intruder = session_for("user-2");
    let report = delete_saved_deals(&intruder, &store, &["1".to_string()]);
    assert_eq!(report.deleted, 0);
    assert_eq!(store.rows.borrow().len(), 1);
}

#[test]
fn test_export_after_load() {
    let store = MemoryStore::default();
    let mut session = session_for("user-1");
    session.stage(deal("Gulf Steel, LLC", dec!(1_500_000))).unwrap();
    save_staged_bundle(&mut session, &store);

    let deals = load_saved_deals(&session, &store).unwrap();
    let csv = export_saved_deals_csv(&deals).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Saved On,Client Name,Deal Size (SAR),Monthly Rate,Admin Fee %,Months,Gross Profit (SAR)")
    );
    assert_eq!(
        lines.next(),
        Some("2025-03-01 09:01,\"Gulf Steel, LLC\",\"1,500,000\",3.0%,1.5%,4,\"202,500\"")
    );
    assert_eq!(lines.next(), None);
}

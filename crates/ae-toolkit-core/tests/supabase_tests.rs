#![cfg(feature = "supabase")]

use ae_toolkit_core::profitability::{save_staged_bundle, DealInput, SaveOutcome};
use ae_toolkit_core::session::{login, logout};
use ae_toolkit_core::store::supabase::{SupabaseClient, SupabaseConfig};
use ae_toolkit_core::store::RecordStore;
use ae_toolkit_core::{StoreError, ToolkitError};
use httpmock::prelude::*;
use rust_decimal_macros::dec;

const ANON_KEY: &str = "anon-key";

fn client_for(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(SupabaseConfig::new(server.base_url(), ANON_KEY)).unwrap()
}

fn saved_row(id: u64, client: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "user-1",
        "created_at": "2025-03-01T09:30:00.123456+00:00",
        "client_name": client,
        "deal_size": 200000,
        "monthly_rate": 3,
        "admin_fee": 1.5,
        "months": 4,
        "monthly_profit": 6000,
        "total_profit": 24000,
        "admin_fee_amount": 3000,
        "gross_profit": 27000
    })
}

fn mock_sign_in(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/auth/v1/token")
            .query_param("grant_type", "password")
            .header("apikey", ANON_KEY)
            .json_body(serde_json::json!({"email": "ae@example.com", "password": "secret"}));
        then.status(200).json_body(serde_json::json!({
            "access_token": "jwt-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "user": {"id": "user-1", "email": "ae@example.com"}
        }));
    })
}

#[test]
fn test_password_sign_in_and_sign_out() {
    let server = MockServer::start();
    let sign_in = mock_sign_in(&server);
    let sign_out = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/v1/logout")
            .header("authorization", "Bearer jwt-1");
        then.status(204);
    });

    let client = client_for(&server);
    let session = login(&client, "ae@example.com", "secret").unwrap();
    assert_eq!(session.owner().user_id, "user-1");
    assert_eq!(session.owner().access_token, "jwt-1");
    logout(&client, session).unwrap();

    sign_in.assert();
    sign_out.assert();
}

#[test]
fn test_bad_credentials_map_to_auth_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/v1/token");
        then.status(400).json_body(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }));
    });

    let client = client_for(&server);
    match login(&client, "ae@example.com", "wrong").unwrap_err() {
        ToolkitError::Store(StoreError::Auth(msg)) => assert_eq!(msg, "Invalid login credentials"),
        other => panic!("Expected Auth error, got {other:?}"),
    }
}

#[test]
fn test_bulk_insert_returns_representation() {
    let server = MockServer::start();
    mock_sign_in(&server);
    let insert = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/deals")
            .header("prefer", "return=representation")
            .header("authorization", "Bearer jwt-1")
            .body_contains("\"client_name\":\"Al Noor\"")
            .body_contains("\"user_id\":\"user-1\"");
        then.status(201)
            .json_body(serde_json::json!([saved_row(1, "Al Noor"), saved_row(2, "Gulf Steel")]));
    });

    let client = client_for(&server);
    let mut session = login(&client, "ae@example.com", "secret").unwrap();
    for name in ["Al Noor", "Gulf Steel"] {
        session
            .stage(DealInput {
                client_name: name.into(),
                deal_size: dec!(200_000),
                monthly_rate_pct: dec!(3),
                admin_fee_pct: dec!(1.5),
                months: 4,
            })
            .unwrap();
    }

    let report = save_staged_bundle(&mut session, &client);
    assert_eq!(report.outcome, SaveOutcome::FullSuccess { saved: 2 });
    assert!(session.staged().is_empty());
    insert.assert();
}

#[test]
fn test_select_filters_by_owner_and_orders_newest_first() {
    let server = MockServer::start();
    let select = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/deals")
            .query_param("select", "*")
            .query_param("user_id", "eq.user-1")
            .query_param("order", "created_at.desc");
        then.status(200).json_body(serde_json::json!([saved_row(7, "Al Noor")]));
    });

    let deals = client_for(&server).select_all("jwt-1", "user-1").unwrap();
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].id, "7");
    assert_eq!(deals[0].gross_profit, dec!(27000));
    select.assert();
}

#[test]
fn test_delete_reports_whether_a_row_matched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE)
            .path("/rest/v1/deals")
            .query_param("id", "eq.7")
            .query_param("user_id", "eq.user-1");
        then.status(200).json_body(serde_json::json!([saved_row(7, "Al Noor")]));
    });
    server.mock(|when, then| {
        when.method(DELETE)
            .path("/rest/v1/deals")
            .query_param("id", "eq.8");
        then.status(200).json_body(serde_json::json!([]));
    });

    let client = client_for(&server);
    assert!(client.delete_one("jwt-1", "7", "user-1").unwrap());
    assert!(!client.delete_one("jwt-1", "8", "user-1").unwrap());
}

#[test]
fn test_api_error_message_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/deals");
        then.status(401).json_body(serde_json::json!({
            "code": "PGRST301",
            "message": "JWT expired"
        }));
    });

    match client_for(&server).select_all("stale", "user-1").unwrap_err() {
        StoreError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "JWT expired");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

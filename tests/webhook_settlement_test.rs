mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use warehub_api::errors::ServiceError;
use warehub_api::services::settlements::{SettlementOutcome, StockReceipt, StockReceiptLine};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TestApp;

/// Creates a purchase request and submits it to the mocked hub, returning
/// its reference.
async fn pending_request(app: &TestApp, items: Value) -> String {
    let (status, created) = app
        .request(
            Method::POST,
            "/api/purchase/request",
            Some(json!({"warehouse_id": 1, "items": items})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["data"]["id"].as_i64().expect("created id");
    let reference = created["data"]["reference"]
        .as_str()
        .expect("reference")
        .to_string();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/purchase/request/{id}"),
            Some(json!({"status": "PENDING"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    reference
}

async fn hub_app() -> (MockServer, TestApp) {
    let hub = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/request/purchase"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&hub)
        .await;
    let app = TestApp::with_hub(&hub.uri(), "test-secret").await;
    (hub, app)
}

async fn total_stock(app: &TestApp) -> (u64, Value) {
    let (status, body) = app.request(Method::GET, "/api/stocks", None).await;
    assert_eq!(status, StatusCode::OK);
    let total = body["meta"]["total"].as_u64().expect("total");
    (total, body["data"].clone())
}

#[tokio::test]
async fn settlement_applies_stock_and_completes_the_request() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 1, "quantity": 5}])).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({
                "reference": reference,
                "details": [{"sku_barcode": "ICYMINT", "qty": 5}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Stock received and updated successfully");

    let (_, listed) = app.request(Method::GET, "/api/purchase/request", None).await;
    assert_eq!(listed["data"][0]["status"], "COMPLETED");

    let (total, rows) = total_stock(&app).await;
    assert_eq!(total, 1);
    assert_eq!(rows[0]["quantity"], 5);
    assert_eq!(rows[0]["product_sku"], "ICYMINT");
    assert_eq!(rows[0]["warehouse_name"], "Central Warehouse Jakarta");
}

#[tokio::test]
async fn settlement_accumulates_onto_existing_stock_rows() {
    let (_hub, app) = hub_app().await;

    let first = pending_request(&app, json!([{"product_id": 1, "quantity": 3}])).await;
    app.request(
        Method::POST,
        "/api/webhook/receive-stock",
        Some(json!({
            "reference": first,
            "details": [{"sku_barcode": "ICYMINT", "qty": 3}]
        })),
    )
    .await;

    let second = pending_request(&app, json!([{"product_id": 1, "quantity": 4}])).await;
    app.request(
        Method::POST,
        "/api/webhook/receive-stock",
        Some(json!({
            "reference": second,
            "details": [{"sku_barcode": "ICYMINT", "qty": 4}]
        })),
    )
    .await;

    let (total, rows) = total_stock(&app).await;
    assert_eq!(total, 1);
    assert_eq!(rows[0]["quantity"], 7);
}

#[tokio::test]
async fn replayed_settlement_is_an_idempotent_no_op() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 1, "quantity": 5}])).await;

    let payload = json!({
        "reference": reference,
        "details": [{"sku_barcode": "ICYMINT", "qty": 5}]
    });

    let (status, _) = app
        .request(Method::POST, "/api/webhook/receive-stock", Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::POST, "/api/webhook/receive-stock", Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Purchase Request already completed");

    let (_, rows) = total_stock(&app).await;
    assert_eq!(rows[0]["quantity"], 5);
}

#[tokio::test]
async fn rejection_finalizes_without_touching_stock() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 2, "quantity": 9}])).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({
                "reference": reference,
                "details": [{"sku_barcode": "APPLEBERRY", "qty": 9}],
                "status_request": "REQUEST_REJECTED"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Purchase Request rejected by vendor");

    let (_, listed) = app.request(Method::GET, "/api/purchase/request", None).await;
    assert_eq!(listed["data"][0]["status"], "REJECTED");

    let (total, _) = total_stock(&app).await;
    assert_eq!(total, 0);
}

#[tokio::test]
async fn rejected_request_replay_reports_already_rejected() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 2, "quantity": 9}])).await;

    let payload = json!({
        "reference": reference,
        "status_request": "REQUEST_REJECTED"
    });
    app.request(Method::POST, "/api/webhook/receive-stock", Some(payload.clone()))
        .await;

    let (status, body) = app
        .request(Method::POST, "/api/webhook/receive-stock", Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Purchase Request already rejected");
}

#[tokio::test]
async fn unknown_sku_aborts_the_whole_settlement() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(
        &app,
        json!([
            {"product_id": 1, "quantity": 3},
            {"product_id": 2, "quantity": 2}
        ]),
    )
    .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({
                "reference": reference,
                "details": [
                    {"sku_barcode": "ICYMINT", "qty": 3},
                    {"sku_barcode": "NO-SUCH-SKU", "qty": 2}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("NO-SUCH-SKU"));

    // Nothing was applied, including the valid first line.
    let (total, _) = total_stock(&app).await;
    assert_eq!(total, 0);

    let (_, listed) = app.request(Method::GET, "/api/purchase/request", None).await;
    assert_eq!(listed["data"][0]["status"], "PENDING");
}

#[tokio::test]
async fn settlement_of_unknown_reference_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({
                "reference": "PR99999",
                "details": [{"sku_barcode": "ICYMINT", "qty": 1}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_reference_is_rejected_as_invalid_payload() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({"details": [{"sku_barcode": "ICYMINT", "qty": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("Invalid payload format"));
}

#[tokio::test]
async fn empty_details_without_rejection_signal_is_invalid() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 1, "quantity": 1}])).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({"reference": reference, "details": []})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_positive_qty_is_rejected_without_touching_stock() {
    let (_hub, app) = hub_app().await;

    let first = pending_request(&app, json!([{"product_id": 1, "quantity": 5}])).await;
    app.request(
        Method::POST,
        "/api/webhook/receive-stock",
        Some(json!({
            "reference": first,
            "details": [{"sku_barcode": "ICYMINT", "qty": 5}]
        })),
    )
    .await;

    let second = pending_request(&app, json!([{"product_id": 1, "quantity": 3}])).await;

    for qty in [-3, 0] {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/webhook/receive-stock",
                Some(json!({
                    "reference": second,
                    "details": [{"sku_barcode": "ICYMINT", "qty": qty}]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .expect("error message")
            .contains("qty must be positive"));
    }

    // The ledger never shrinks and the request is still settleable.
    let (_, rows) = total_stock(&app).await;
    assert_eq!(rows[0]["quantity"], 5);

    let (_, listed) = app.request(Method::GET, "/api/purchase/request", None).await;
    let row = listed["data"]
        .as_array()
        .expect("list rows")
        .iter()
        .find(|r| r["reference"] == second.as_str())
        .expect("second request listed");
    assert_eq!(row["status"], "PENDING");
}

#[tokio::test]
async fn concurrent_settlements_of_one_reference_apply_stock_once() {
    let (_hub, app) = hub_app().await;
    let reference = pending_request(&app, json!([{"product_id": 1, "quantity": 5}])).await;

    let receipt = || StockReceipt {
        reference: reference.clone(),
        details: vec![StockReceiptLine {
            sku_barcode: "ICYMINT".to_string(),
            qty: 5,
        }],
        status_request: None,
    };

    let service = app.state.services.settlements.clone();
    let (first, second) = tokio::join!(service.settle(receipt()), service.settle(receipt()));

    let results = [first, second];
    let completed = results
        .iter()
        .filter(|r| matches!(r, Ok(SettlementOutcome::Completed)))
        .count();
    assert_eq!(completed, 1);
    for result in results {
        match result {
            Ok(SettlementOutcome::Completed) | Ok(SettlementOutcome::AlreadyFinal(_)) => {}
            // The loser of the guarded status transition rolls back.
            Err(ServiceError::Conflict(_)) => {}
            other => panic!("unexpected settlement result: {other:?}"),
        }
    }

    let (total, rows) = total_stock(&app).await;
    assert_eq!(total, 1);
    assert_eq!(rows[0]["quantity"], 5);
}

#[tokio::test]
async fn draft_request_cannot_be_settled() {
    let app = TestApp::new().await;

    let (_, created) = app
        .request(
            Method::POST,
            "/api/purchase/request",
            Some(json!({"warehouse_id": 1, "items": [{"product_id": 1, "quantity": 1}]})),
        )
        .await;
    let reference = created["data"]["reference"].as_str().expect("reference");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/webhook/receive-stock",
            Some(json!({
                "reference": reference,
                "details": [{"sku_barcode": "ICYMINT", "qty": 1}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Purchase Request is not in PENDING status");
}

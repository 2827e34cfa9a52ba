//! Quotation manager tests: completeness, conflict detection and the
//! concurrent-submission race.

mod common;

use axum::http::StatusCode;
use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::{decimal_field, response_json, TestApp};
use supplyline_api::{
    commands::procurement::{QuotedItem, SubmitQuotationCommand},
    errors::ServiceError,
};

#[tokio::test]
async fn every_line_item_must_be_priced() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "North Node",
            None,
            json!([
                { "name": "Tomato", "unit": "KG", "quantity": 10 },
                { "name": "Potato", "unit": "KG", "quantity": 20 },
            ]),
        )
        .await;

    // Pricing only one of two items is an incomplete quotation.
    let response = app
        .quote(
            request_id,
            vendor_id,
            json!([{ "name": "Tomato", "quotedPrice": 20 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Potato"));

    // The failed call left the ledger unchanged.
    let view = app.get_request(request_id, vendor_id, "vendor").await;
    assert_eq!(view["status"], "requested");
    assert!(view["vendorId"].is_null());
    assert_eq!(decimal_field(&view, "totalQuotedAmount"), dec!(0));

    // A complete quotation lands and computes the total.
    let response = app
        .quote(
            request_id,
            vendor_id,
            json!([
                { "name": "Tomato", "quotedPrice": 20 },
                { "name": "Potato", "quotedPrice": 15 },
            ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body, "totalQuotedAmount"), dec!(500));
}

#[tokio::test]
async fn negative_prices_and_unknown_items_are_rejected() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "North Node",
            None,
            json!([{ "name": "Tomato", "unit": "KG", "quantity": 10 }]),
        )
        .await;

    let response = app
        .quote(
            request_id,
            vendor_id,
            json!([{ "name": "Tomato", "quotedPrice": -1 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .quote(
            request_id,
            vendor_id,
            json!([
                { "name": "Tomato", "quotedPrice": 20 },
                { "name": "Cabbage", "quotedPrice": 9 },
            ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Cabbage"));
}

#[tokio::test]
async fn second_submission_conflicts_instead_of_overwriting() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_a = Uuid::new_v4();
    let vendor_b = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "North Node",
            None,
            json!([{ "name": "Tomato", "unit": "KG", "quantity": 10 }]),
        )
        .await;

    let response = app
        .quote(
            request_id,
            vendor_a,
            json!([{ "name": "Tomato", "quotedPrice": 20 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .quote(
            request_id,
            vendor_b,
            json!([{ "name": "Tomato", "quotedPrice": 18 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The winning quote is untouched.
    let view = app.get_request(request_id, vendor_a, "vendor").await;
    assert_eq!(view["vendorId"], vendor_a.to_string());
    assert_eq!(decimal_field(&view, "totalQuotedAmount"), dec!(200));
}

#[tokio::test]
async fn concurrent_submissions_produce_exactly_one_winner() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_a = Uuid::new_v4();
    let vendor_b = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "North Node",
            None,
            json!([{ "name": "Tomato", "unit": "KG", "quantity": 10 }]),
        )
        .await;

    let service = app.state.services.procurement.clone();
    let command_a = SubmitQuotationCommand {
        request_id,
        vendor_id: vendor_a,
        items: vec![QuotedItem {
            name: "Tomato".to_string(),
            quoted_price: dec!(20),
        }],
    };
    let command_b = SubmitQuotationCommand {
        request_id,
        vendor_id: vendor_b,
        items: vec![QuotedItem {
            name: "Tomato".to_string(),
            quoted_price: dec!(18),
        }],
    };

    let (result_a, result_b) = tokio::join!(
        service.submit_quotation(command_a),
        service.submit_quotation(command_b),
    );

    // Exactly one quoted outcome; the loser fails visibly.
    let (winner_total, loser) = match (&result_a, &result_b) {
        (Ok(win), Err(lose)) => (win.total_quoted_amount, lose),
        (Err(lose), Ok(win)) => (win.total_quoted_amount, lose),
        other => panic!("expected exactly one winner, got {:?}", other),
    };
    assert_matches!(
        loser,
        ServiceError::ConflictingQuotation(_) | ServiceError::StaleState(_)
    );

    // The stored aggregate reflects the winner's quote only.
    let view = app.get_request(request_id, franchise_id, "franchise").await;
    assert_eq!(view["status"], "quoted");
    assert_eq!(decimal_field(&view, "totalQuotedAmount"), winner_total);
}

//! End-to-end tests for the complete procurement lifecycle:
//! create → quote → approve → pack/weigh → dispatch → receipt → settlement.

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::{decimal_field, response_json, TestApp};

#[tokio::test]
async fn full_lifecycle_with_damaged_goods_settlement() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    // Franchise raises a request for 10 KG of tomatoes.
    let request_id = app
        .create_request(
            franchise_id,
            "North Node",
            Some("R. Kaur"),
            json!([{ "name": "Tomato", "unit": "KG", "quantity": 10 }]),
        )
        .await;

    let view = app.get_request(request_id, franchise_id, "franchise").await;
    assert_eq!(view["status"], "requested");
    assert!(view["vendorId"].is_null());

    // Vendor quotes 20 per KG: total must be 200.
    let response = app
        .quote(
            request_id,
            vendor_id,
            json!([{ "name": "Tomato", "quotedPrice": 20 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "quoted");
    assert_eq!(decimal_field(&body, "totalQuotedAmount"), dec!(200));

    // Approval and packing.
    assert_eq!(
        app.approve(request_id, franchise_id).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.begin_packing(request_id, vendor_id).await.status(),
        StatusCode::OK
    );

    // Checklist alone does not advance the status.
    let response = app.packing_check(request_id, vendor_id, "Tomato").await;
    let body = response_json(response).await;
    assert_eq!(body["status"], "preparing");
    assert_eq!(body["advanced"], false);

    // Weight completes the precondition; the engine advances the request.
    let response = app.record_weight(request_id, vendor_id, json!(9.8)).await;
    let body = response_json(response).await;
    assert_eq!(body["status"], "ready_for_pickup");
    assert_eq!(body["advanced"], true);

    // Dispatch completes the vendor leg and issues a delivery challan.
    let response = app.dispatch(request_id, vendor_id).await;
    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");

    // Franchise receives 9, one of them damaged.
    let response = app
        .record_receipt(
            request_id,
            franchise_id,
            json!([{ "name": "Tomato", "receivedQuantity": 9, "damagedQuantity": 1 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let settlement = response_json(response).await;
    assert_eq!(decimal_field(&settlement, "receivedValue"), dec!(180));
    assert_eq!(decimal_field(&settlement, "damagedLoss"), dec!(20));
    assert_eq!(decimal_field(&settlement, "netSettlement"), dec!(180));
    assert_eq!(settlement["discrepancyFlag"], true);

    // Settlement figures stick on the aggregate.
    let view = app.get_request(request_id, franchise_id, "franchise").await;
    assert_eq!(view["status"], "completed");
    assert_eq!(decimal_field(&view, "netSettlement"), dec!(180));
    assert_eq!(view["discrepancyFlag"], true);
    assert_eq!(view["items"][0]["receivedQuantity"], 9);
    assert_eq!(view["items"][0]["damagedQuantity"], 1);
}

#[tokio::test]
async fn illegal_transitions_fail_with_conflict_and_leave_status_unchanged() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "East Node",
            None,
            json!([{ "name": "Onion", "unit": "KG", "quantity": 5 }]),
        )
        .await;

    // Approving before any quote exists is off the transition table.
    let response = app.approve(request_id, franchise_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("quoted"));
    assert!(body["message"].as_str().unwrap().contains("requested"));

    // Dispatching from requested is equally illegal, but the vendor is
    // not even bound yet, so the engine refuses at the assignment check.
    let response = app.dispatch(request_id, vendor_id).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Status is unchanged throughout.
    let view = app.get_request(request_id, franchise_id, "franchise").await;
    assert_eq!(view["status"], "requested");
}

#[tokio::test]
async fn weight_must_be_positive_and_single_shot() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "West Node",
            None,
            json!([
                { "name": "Rice", "unit": "KG", "quantity": 25 },
                { "name": "Oil", "unit": "LTR", "quantity": 10 },
            ]),
        )
        .await;
    app.quote(
        request_id,
        vendor_id,
        json!([
            { "name": "Rice", "quotedPrice": 80 },
            { "name": "Oil", "quotedPrice": 150 },
        ]),
    )
    .await;
    app.approve(request_id, franchise_id).await;
    app.begin_packing(request_id, vendor_id).await;

    // Zero and negative weights are rejected.
    let response = app.record_weight(request_id, vendor_id, json!(0)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let response = app.record_weight(request_id, vendor_id, json!(-2.5)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // First valid recording lands; not all items are packed yet so the
    // request stays in preparing.
    let response = app.record_weight(request_id, vendor_id, json!(35.2)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "preparing");

    // Weight is recorded once per request.
    let response = app.record_weight(request_id, vendor_id, json!(36.0)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("weight already recorded"));

    // Finishing the checklist advances the request with the original
    // weight intact.
    app.packing_check(request_id, vendor_id, "Rice").await;
    let response = app.packing_check(request_id, vendor_id, "Oil").await;
    let body = response_json(response).await;
    assert_eq!(body["status"], "ready_for_pickup");

    let view = app.get_request(request_id, vendor_id, "vendor").await;
    assert_eq!(decimal_field(&view, "actualWeight"), dec!(35.2));
}

#[tokio::test]
async fn rejection_is_terminal() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "East Node",
            None,
            json!([{ "name": "Ginger", "unit": "KG", "quantity": 6 }]),
        )
        .await;
    app.quote(
        request_id,
        vendor_id,
        json!([{ "name": "Ginger", "quotedPrice": 90 }]),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            &format!("/procurement/franchise/requests/{}/reject", request_id),
            franchise_id,
            "franchise",
            Some(json!({ "reason": "price too high" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "rejected");

    // Terminal: neither approval nor a fresh quote is accepted, but the
    // request remains queryable for audit.
    let response = app.approve(request_id, franchise_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = app
        .quote(
            request_id,
            Uuid::new_v4(),
            json!([{ "name": "Ginger", "quotedPrice": 70 }]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let view = app.get_request(request_id, franchise_id, "franchise").await;
    assert_eq!(view["status"], "rejected");
}

#[tokio::test]
async fn dispatch_waits_for_the_full_packing_precondition() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "East Node",
            None,
            json!([{ "name": "Garlic", "unit": "KG", "quantity": 7 }]),
        )
        .await;
    app.quote(
        request_id,
        vendor_id,
        json!([{ "name": "Garlic", "quotedPrice": 60 }]),
    )
    .await;
    app.approve(request_id, franchise_id).await;
    app.begin_packing(request_id, vendor_id).await;
    app.packing_check(request_id, vendor_id, "Garlic").await;

    // Checklist is done but no weight yet: still preparing, so dispatch
    // is off the table.
    let response = app.dispatch(request_id, vendor_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("ready_for_pickup"));

    app.record_weight(request_id, vendor_id, json!(7.1)).await;
    let response = app.dispatch(request_id, vendor_id).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_cancels_from_any_non_terminal_state_but_not_terminal() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    let request_id = app
        .create_request(
            franchise_id,
            "South Node",
            None,
            json!([{ "name": "Sugar", "unit": "KG", "quantity": 12 }]),
        )
        .await;

    // Only admins may cancel.
    let response = app
        .request(
            Method::POST,
            &format!("/procurement/admin/requests/{}/cancel", request_id),
            franchise_id,
            "franchise",
            Some(json!({ "reason": "duplicate" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            &format!("/procurement/admin/requests/{}/cancel", request_id),
            admin_id,
            "admin",
            Some(json!({ "reason": "duplicate" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "cancelled");

    // Terminal: a second cancel is refused.
    let response = app
        .request(
            Method::POST,
            &format!("/procurement/admin/requests/{}/cancel", request_id),
            admin_id,
            "admin",
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_aliases_are_normalized_in_franchise_listing() {
    let app = TestApp::new().await;
    let franchise_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();

    let requested = app
        .create_request(
            franchise_id,
            "Alias Node",
            None,
            json!([{ "name": "Salt", "unit": "KG", "quantity": 4 }]),
        )
        .await;
    let quoted = app
        .create_request(
            franchise_id,
            "Alias Node",
            None,
            json!([{ "name": "Flour", "unit": "KG", "quantity": 8 }]),
        )
        .await;
    app.quote(
        quoted,
        vendor_id,
        json!([{ "name": "Flour", "quotedPrice": 42 }]),
    )
    .await;

    // `assigned` is the legacy label for `requested`.
    let response = app
        .request(
            Method::GET,
            "/procurement/franchise/requests?status=assigned",
            franchise_id,
            "franchise",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = response_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], requested.to_string());
    assert_eq!(rows[0]["status"], "requested");

    // `bidding` is the legacy label for `quoted`.
    let response = app
        .request(
            Method::GET,
            "/procurement/franchise/requests?status=bidding",
            franchise_id,
            "franchise",
            None,
        )
        .await;
    let rows = response_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], quoted.to_string());

    // Unknown labels are rejected, not silently empty.
    let response = app
        .request(
            Method::GET,
            "/procurement/franchise/requests?status=shipped",
            franchise_id,
            "franchise",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vendor_views_split_active_and_all_time_assignments() {
    let app = TestApp::new().await;
    let vendor_id = Uuid::new_v4();

    // One completed, one still in flight.
    let franchise_a = Uuid::new_v4();
    let done = app
        .create_request(
            franchise_a,
            "Node A",
            None,
            json!([{ "name": "Tea", "unit": "BOX", "quantity": 3 }]),
        )
        .await;
    app.quote(
        done,
        vendor_id,
        json!([{ "name": "Tea", "quotedPrice": 120 }]),
    )
    .await;
    app.approve(done, franchise_a).await;
    app.begin_packing(done, vendor_id).await;
    app.packing_check(done, vendor_id, "Tea").await;
    app.record_weight(done, vendor_id, json!(4.5)).await;
    app.dispatch(done, vendor_id).await;

    let franchise_id = Uuid::new_v4();
    let active = app
        .create_request(
            franchise_id,
            "Node B",
            None,
            json!([{ "name": "Coffee", "unit": "BOX", "quantity": 2 }]),
        )
        .await;
    app.quote(
        active,
        vendor_id,
        json!([{ "name": "Coffee", "quotedPrice": 300 }]),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            "/procurement/vendor/active-dispatch",
            vendor_id,
            "vendor",
            None,
        )
        .await;
    let rows = response_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], active.to_string());

    let response = app
        .request(
            Method::GET,
            "/procurement/vendor/my-assignments",
            vendor_id,
            "vendor",
            None,
        )
        .await;
    let rows = response_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&done.to_string().as_str()));
    assert!(ids.contains(&active.to_string().as_str()));
}

mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use procurement_api::events::Event;
use serde_json::{json, Value};

fn order_payload(app: &TestApp, vendor: &str, expected: &str, create_in_wms: bool) -> Value {
    json!({
        "vendor_name": vendor,
        "order_date": "2024-06-01",
        "expected_delivery_date": expected,
        "createInWMS": create_in_wms,
        "purchase_order_line_items": [
            { "item_id": app.catalog.small_box.id, "quantity": 10, "unit_cost": 1.5 },
            { "item_id": app.catalog.tape.id, "quantity": 4, "unit_cost": 2.25 }
        ]
    })
}

#[tokio::test]
async fn create_returns_order_with_line_items() {
    let app = TestApp::new().await;

    let created = app
        .create_order(order_payload(&app, "Acme", "2024-06-10", false))
        .await;

    assert_eq!(created["vendor_name"], "Acme");
    assert_eq!(created["order_date"], "2024-06-01");
    assert_eq!(created["expected_delivery_date"], "2024-06-10");
    assert_eq!(created["createInWMS"], false);
    assert!(created["wms_purchase_order_id"].is_null());

    let lines = created["purchase_order_line_items"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["purchase_order_id"], created["id"]);
    assert_eq!(lines[0]["unit_cost"], 1.5);
}

#[tokio::test]
async fn create_in_wms_defaults_to_false() {
    let app = TestApp::new().await;

    let created = app
        .create_order(json!({
            "vendor_name": "Acme",
            "order_date": "2024-06-01",
            "expected_delivery_date": "2024-06-03T00:00:00.000Z",
            "purchase_order_line_items": []
        }))
        .await;

    assert_eq!(created["createInWMS"], false);
    assert_eq!(created["expected_delivery_date"], "2024-06-03");
}

#[tokio::test]
async fn create_publishes_created_event_with_flag() {
    let app = TestApp::new().await;

    let created = app
        .create_order(order_payload(&app, "Acme", "2024-06-10", true))
        .await;
    let id = created["id"].as_i64().unwrap() as i32;

    let events = app.wait_for_events(1).await;
    assert_eq!(
        events.first(),
        Some(&Event::PurchaseOrderCreated {
            purchase_order_id: id,
            create_in_wms: true,
        })
    );
}

#[tokio::test]
async fn flagged_order_is_handed_to_wms_and_external_id_stored() {
    let app = TestApp::new().await;

    let created = app
        .create_order(order_payload(&app, "Acme", "2024-06-10", true))
        .await;
    let id = created["id"].as_i64().unwrap();

    let mut stored = Value::Null;
    for _ in 0..100 {
        let response = app
            .request(Method::GET, &format!("/api/purchase-orders/{id}"), None)
            .await;
        stored = json_body(response).await;
        if !stored["wms_purchase_order_id"].is_null() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(stored["wms_purchase_order_id"], format!("WMS-PO-{id}"));
    let payloads = app.wms.payloads();
    assert_eq!(payloads.len(), 1);
    let skus: Vec<_> = payloads[0].line_items.iter().map(|l| l.sku.as_str()).collect();
    assert_eq!(skus, ["BOX-S", "TAPE"]);
}

#[tokio::test]
async fn unflagged_order_never_reaches_wms() {
    let app = TestApp::new().await;

    app.create_order(order_payload(&app, "Acme", "2024-06-10", false))
        .await;
    app.wait_for_events(1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(app.wms.payloads().is_empty());
}

#[tokio::test]
async fn create_rejects_invalid_payloads() {
    let app = TestApp::new().await;

    let blank_vendor = app
        .request(
            Method::POST,
            "/api/purchase-orders",
            Some(json!({
                "vendor_name": "",
                "order_date": "2024-06-01",
                "expected_delivery_date": "2024-06-10"
            })),
        )
        .await;
    assert_eq!(blank_vendor.status(), StatusCode::BAD_REQUEST);

    let unknown_item = app
        .request(
            Method::POST,
            "/api/purchase-orders",
            Some(json!({
                "vendor_name": "Acme",
                "order_date": "2024-06-01",
                "expected_delivery_date": "2024-06-10",
                "purchase_order_line_items": [{ "item_id": 9999, "quantity": 1, "unit_cost": 1.0 }]
            })),
        )
        .await;
    assert_eq!(unknown_item.status(), StatusCode::BAD_REQUEST);
    let body = json_body(unknown_item).await;
    assert!(body["message"].as_str().unwrap().contains("Invalid data provided"));

    let listed = json_body(app.request(Method::GET, "/api/purchase-orders", None).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_rejects_unreadable_dates_with_error_body() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/purchase-orders",
            Some(json!({
                "vendor_name": "Acme",
                "order_date": "2024-13-01",
                "expected_delivery_date": "2024-06-10"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("order_date"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn update_missing_required_field_is_bad_request() {
    let app = TestApp::new().await;
    let created = app
        .create_order(order_payload(&app, "Acme", "2024-06-10", false))
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/purchase-orders/{id}"),
            Some(json!({
                "vendor_name": "Acme",
                "order_date": "2024-06-01",
                "purchase_order_line_items": []
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("expected_delivery_date"));

    let stored = json_body(
        app.request(Method::GET, &format!("/api/purchase-orders/{id}"), None)
            .await,
    )
    .await;
    assert_eq!(stored["expected_delivery_date"], "2024-06-10");
}

#[tokio::test]
async fn get_missing_order_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/purchase-orders/4242", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Purchase Order with ID 4242 not found"));
}

#[tokio::test]
async fn delete_removes_order_and_line_items() {
    let app = TestApp::new().await;
    let created = app
        .create_order(order_payload(&app, "Acme", "2024-06-10", false))
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/api/purchase-orders/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/purchase-orders/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let events = app.wait_for_events(2).await;
    assert_eq!(events.last(), Some(&Event::PurchaseOrderDeleted(id as i32)));
}

#[tokio::test]
async fn deleting_missing_order_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::DELETE, "/api/purchase-orders/987", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_sorts_by_expected_delivery_and_sums_line_items() {
    let app = TestApp::new().await;
    let small_box = app.catalog.small_box.id;
    let tape = app.catalog.tape.id;

    let late = app
        .create_order(json!({
            "vendor_name": "Late",
            "order_date": "2024-06-01",
            "expected_delivery_date": "2024-07-20",
            "purchase_order_line_items": [
                { "item_id": small_box, "quantity": 3, "unit_cost": 1.1 },
                { "item_id": tape, "quantity": 2, "unit_cost": 2.2 }
            ]
        }))
        .await;
    let early = app
        .create_order(json!({
            "vendor_name": "Early",
            "order_date": "2024-06-01",
            "expected_delivery_date": "2024-06-05",
            "purchase_order_line_items": [
                { "item_id": small_box, "quantity": 5, "unit_cost": 4.0 }
            ]
        }))
        .await;
    let empty = app
        .create_order(json!({
            "vendor_name": "Empty",
            "order_date": "2024-06-01",
            "expected_delivery_date": "2024-06-15"
        }))
        .await;

    let response = app
        .request(Method::GET, "/api/purchase-orders?page=1&limit=10", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response).await;

    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["hasNextPage"], false);

    let data = page["data"].as_array().unwrap();
    let ids: Vec<_> = data.iter().map(|o| o["id"].clone()).collect();
    assert_eq!(ids, vec![early["id"].clone(), empty["id"].clone(), late["id"].clone()]);

    assert_eq!(data[0]["totalQuantity"], 5);
    assert_eq!(data[0]["totalUnitCost"], 4.0);
    assert_eq!(data[0]["totalCost"], 20.0);

    assert_eq!(data[1]["totalQuantity"], 0);
    assert_eq!(data[1]["totalCost"], 0.0);

    assert_eq!(data[2]["totalQuantity"], 5);
    assert_eq!(data[2]["totalUnitCost"], 3.3);
    assert_eq!(data[2]["totalCost"], 7.7);
    assert!(data[2].get("purchase_order_line_items").is_none());
}

#[tokio::test]
async fn listing_paginates_and_reports_next_page() {
    let app = TestApp::new().await;
    for day in 1..=5 {
        app.create_order(json!({
            "vendor_name": format!("Vendor {day}"),
            "order_date": "2024-06-01",
            "expected_delivery_date": format!("2024-06-{:02}", day + 10)
        }))
        .await;
    }

    let second = json_body(
        app.request(Method::GET, "/api/purchase-orders?page=2&limit=2", None)
            .await,
    )
    .await;
    assert_eq!(second["totalPages"], 3);
    assert_eq!(second["hasNextPage"], true);
    let vendors: Vec<_> = second["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["vendor_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(vendors, ["Vendor 3", "Vendor 4"]);

    let past_end = json_body(
        app.request(Method::GET, "/api/purchase-orders?page=9&limit=2", None)
            .await,
    )
    .await;
    assert_eq!(past_end["data"].as_array().unwrap().len(), 0);
    assert_eq!(past_end["totalPages"], 3);
    assert_eq!(past_end["hasNextPage"], false);

    let defaults = json_body(app.request(Method::GET, "/api/purchase-orders", None).await).await;
    assert_eq!(defaults["currentPage"], 1);
    assert_eq!(defaults["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn listing_rejects_out_of_range_parameters() {
    let app = TestApp::new().await;

    for uri in [
        "/api/purchase-orders?page=0",
        "/api/purchase-orders?limit=0",
        "/api/purchase-orders?limit=101",
        "/api/purchase-orders?page=18446744073709551615&limit=10",
        "/api/purchase-orders?page=922337203685477582&limit=10",
    ] {
        let response = app.request(Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn catalog_endpoints_group_items() {
    let app = TestApp::new().await;

    let groups = json_body(app.request(Method::GET, "/api/parent-items", None).await).await;
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["name"], "Boxes");
    let box_skus: Vec<_> = groups[0]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["sku"].as_str().unwrap())
        .collect();
    assert_eq!(box_skus, ["BOX-L", "BOX-S"]);

    let items = json_body(app.request(Method::GET, "/api/items", None).await).await;
    assert_eq!(items.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");
    assert_eq!(body["document_conversion_enabled"], false);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert!(doc["paths"]["/api/purchase-orders/{id}"].is_object());
}

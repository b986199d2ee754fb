mod common;

use axum::http::Method;
use serde_json::json;

use common::{response_json, TestApp};

#[tokio::test]
async fn item_lifecycle() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    // Create with an explicit balance.
    let created = app
        .create_item(
            &token,
            json!({ "name": "Milk", "balance": 10, "minStock": 3 }),
        )
        .await;
    assert_eq!(created["name"], "Milk");
    assert_eq!(created["itemKey"], "milk");
    assert_eq!(created["balance"], 10);
    assert_eq!(created["minStock"], 3);
    let id = created["id"].as_str().unwrap().to_string();

    // Fetch it back.
    let response = app
        .request(
            Method::GET,
            &format!("/api/inventory/{}", id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);
    let fetched = response_json(response).await;
    assert_eq!(fetched["itemKey"], "milk");

    // Listed for the owner.
    let response = app
        .request(Method::GET, "/api/inventory", None, Some(&token))
        .await;
    let listed = response_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Delete, then the id is gone.
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/inventory/{}", id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Item deleted successfully");

    let response = app
        .request(
            Method::GET,
            &format!("/api/inventory/{}", id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn item_key_strips_separator_runs() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let created = app
        .create_item(&token, json!({ "name": "Milk & Eggs!", "minStock": 1 }))
        .await;
    assert_eq!(created["itemKey"], "milkeggs");

    let created = app
        .create_item(&token, json!({ "name": "Ice-Cream #1", "minStock": 1 }))
        .await;
    assert_eq!(created["itemKey"], "icecream1");
}

#[tokio::test]
async fn balance_defaults_to_zero_and_trend_data_to_two_year_buckets() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let created = app
        .create_item(&token, json!({ "name": "Coffee", "minStock": 2 }))
        .await;
    assert_eq!(created["balance"], 0);

    let trend = created["trendData"].as_object().unwrap();
    assert_eq!(trend.len(), 2);
    let this_year = chrono::Utc::now().format("%Y").to_string();
    assert!(trend.contains_key(&this_year));
    assert!(trend[&this_year].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn provided_trend_data_is_kept_as_is() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let created = app
        .create_item(
            &token,
            json!({
                "name": "Tea",
                "minStock": 1,
                "trendData": { "2024": { "1": 42, "2": 38 } },
            }),
        )
        .await;
    assert_eq!(created["trendData"]["2024"]["1"], 42);
    assert_eq!(created["trendData"]["2024"]["2"], 38);
}

#[tokio::test]
async fn create_validation_failures_are_bad_requests() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    // Blank name.
    let response = app
        .request(
            Method::POST,
            "/api/inventory",
            Some(json!({ "name": "   ", "minStock": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Minimum stock below one.
    let response = app
        .request(
            Method::POST,
            "/api/inventory",
            Some(json!({ "name": "Milk", "minStock": 0 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Negative balance.
    let response = app
        .request(
            Method::POST,
            "/api/inventory",
            Some(json!({ "name": "Milk", "balance": -1, "minStock": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn same_key_conflicts_for_one_user_but_not_across_users() {
    let app = TestApp::new().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.create_item(&alice, json!({ "name": "Milk & Eggs!", "minStock": 1 }))
        .await;

    // Different spelling, same derived key, same owner: conflict.
    let response = app
        .request(
            Method::POST,
            "/api/inventory",
            Some(json!({ "name": "milk EGGS", "minStock": 1 })),
            Some(&alice),
        )
        .await;
    assert_eq!(response.status(), 409);

    // Same name for a different owner succeeds.
    let created = app
        .create_item(&bob, json!({ "name": "Milk & Eggs!", "minStock": 1 }))
        .await;
    assert_eq!(created["itemKey"], "milkeggs");
}

#[tokio::test]
async fn partial_update_touches_only_present_fields() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let created = app
        .create_item(
            &token,
            json!({
                "name": "Milk",
                "balance": 10,
                "minStock": 3,
                "imageUrl": "/uploads/milk.jpg",
            }),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/inventory/{}", id),
            Some(json!({ "balance": 3 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);

    let updated = response_json(response).await;
    assert_eq!(updated["balance"], 3);
    assert_eq!(updated["name"], "Milk");
    assert_eq!(updated["itemKey"], "milk");
    assert_eq!(updated["minStock"], 3);
    assert_eq!(updated["imageUrl"], "/uploads/milk.jpg");
    assert_eq!(
        updated["trendData"].as_object().unwrap().len(),
        created["trendData"].as_object().unwrap().len()
    );
}

#[tokio::test]
async fn rename_recomputes_key_without_uniqueness_check() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    app.create_item(&token, json!({ "name": "Milk", "minStock": 1 }))
        .await;
    let other = app
        .create_item(&token, json!({ "name": "Oats", "minStock": 1 }))
        .await;
    let other_id = other["id"].as_str().unwrap().to_string();

    // Renaming onto an existing key succeeds; uniqueness is creation-only.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/inventory/{}", other_id),
            Some(json!({ "name": "MILK" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);

    let renamed = response_json(response).await;
    assert_eq!(renamed["itemKey"], "milk");

    let response = app
        .request(
            Method::GET,
            "/api/inventory/search?query=milk",
            None,
            Some(&token),
        )
        .await;
    let matches = response_json(response).await;
    assert_eq!(matches.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_of_missing_item_is_not_found() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/inventory/{}", uuid::Uuid::new_v4()),
            Some(json!({ "balance": 3 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn items_are_invisible_to_other_users() {
    let app = TestApp::new().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let created = app
        .create_item(&alice, json!({ "name": "Milk", "minStock": 1 }))
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    // Bob's view: the item does not exist, on any operation.
    let response = app
        .request(
            Method::GET,
            &format!("/api/inventory/{}", id),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/inventory/{}", id),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/inventory/{}/stock", id),
            Some(json!({ "quantity": -5 })),
            Some(&bob),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(Method::GET, "/api/inventory", None, Some(&bob))
        .await;
    assert!(response_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stock_adjustment_is_additive_not_absolute() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    let created = app
        .create_item(
            &token,
            json!({ "name": "Milk", "balance": 10, "minStock": 3 }),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/inventory/{}/stock", id);

    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({ "quantity": -5 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["balance"], 5);

    // Applying the same delta again lands at 0, not 5.
    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({ "quantity": -5 })),
            Some(&token),
        )
        .await;
    assert_eq!(response_json(response).await["balance"], 0);

    // The delta is not floor-checked; the balance may go negative.
    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({ "quantity": -3 })),
            Some(&token),
        )
        .await;
    assert_eq!(response_json(response).await["balance"], -3);
}

#[tokio::test]
async fn low_stock_boundary_is_inclusive() {
    let app = TestApp::new().await;
    let token = app.register_user("alice").await;

    app.create_item(
        &token,
        json!({ "name": "At threshold", "balance": 3, "minStock": 3 }),
    )
    .await;
    app.create_item(
        &token,
        json!({ "name": "Below threshold", "balance": 1, "minStock": 3 }),
    )
    .await;
    app.create_item(
        &token,
        json!({ "name": "Comfortable", "balance": 10, "minStock": 3 }),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/inventory/low-stock", None, Some(&token))
        .await;
    assert_eq!(response.status(), 200);

    let low = response_json(response).await;
    let names: Vec<&str> = low
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"At threshold"));
    assert!(names.contains(&"Below threshold"));
}

#[tokio::test]
async fn search_is_case_insensitive_and_scoped() {
    let app = TestApp::new().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.create_item(&alice, json!({ "name": "Whole Milk", "minStock": 1 }))
        .await;
    app.create_item(&alice, json!({ "name": "Oat Milk", "minStock": 1 }))
        .await;
    app.create_item(&alice, json!({ "name": "Coffee", "minStock": 1 }))
        .await;
    app.create_item(&bob, json!({ "name": "Milk", "minStock": 1 }))
        .await;

    let response = app
        .request(
            Method::GET,
            "/api/inventory/search?query=MILK",
            None,
            Some(&alice),
        )
        .await;
    let matches = response_json(response).await;
    assert_eq!(matches.as_array().unwrap().len(), 2);

    // Empty query matches everything the user owns.
    let response = app
        .request(
            Method::GET,
            "/api/inventory/search?query=",
            None,
            Some(&alice),
        )
        .await;
    let matches = response_json(response).await;
    assert_eq!(matches.as_array().unwrap().len(), 3);

    let response = app
        .request(
            Method::GET,
            "/api/inventory/search?query=nothing-here",
            None,
            Some(&alice),
        )
        .await;
    let matches = response_json(response).await;
    assert!(matches.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

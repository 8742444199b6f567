//! Integration tests for the celebrant admin endpoints.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: TEST_DATABASE_URL=postgres://... cargo test --test admin_integration

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    create_celebrant, create_item, guest_email, item_counters, request, send, setup, token_for,
    TestContext,
};
use domain::models::{CreateItemRequest, UpdateItemRequest, UpdateSettingsRequest};
use domain::services::{PendingMutation, PendingWriteQueue, WriteOwner};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wishlist_api::services::AdminWriter;

async fn seed_reservation(
    ctx: &TestContext,
    celebrant_id: Uuid,
    item_id: Uuid,
    email: &str,
    wine: bool,
) {
    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/reservations",
        None,
        Some(json!({
            "celebrant_id": celebrant_id,
            "guest_name": "Guest",
            "guest_email": email,
            "selected_items": [{"id": item_id, "title": "Item"}],
            "include_wine": wine,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}

async fn seed_donation(
    ctx: &TestContext,
    celebrant_id: Uuid,
    email: &str,
    amount: f64,
    currency: &str,
) {
    let (status, body) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/donations",
        None,
        Some(json!({
            "celebrant_id": celebrant_id,
            "guest_name": "Donor",
            "guest_email": email,
            "amount": amount,
            "currency": currency,
            "transfer_type": "belarus",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}

async fn get(ctx: &TestContext, uri: &str, token: &str) -> (StatusCode, Value) {
    send(&ctx.app, Method::GET, uri, Some(token), None).await
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let ctx = setup().await;

    let (status, body) = send(&ctx.app, Method::GET, "/api/v1/admin/settings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &ctx.app,
        Method::GET,
        "/api/v1/admin/items",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_same_subject_maps_to_same_account() {
    let ctx = setup().await;
    let subject = format!("subject-{}", Uuid::new_v4().simple());

    let (_, first) = get(&ctx, "/api/v1/admin/settings", &token_for(&subject)).await;
    let (_, second) = get(&ctx, "/api/v1/admin/settings", &token_for(&subject)).await;
    assert_eq!(first["celebrant_id"], second["celebrant_id"]);
}

#[tokio::test]
async fn test_admin_responses_are_not_cached() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;

    let response = ctx
        .app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/admin/settings",
            Some(&celebrant.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_defaults_and_update() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;

    let (status, settings) = get(&ctx, "/api/v1/admin/settings", &celebrant.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["name"], "");
    assert_eq!(settings["enable_wine_selection"], false);
    assert_eq!(settings["enable_money_gift"], true);

    let (status, updated) = send(
        &ctx.app,
        Method::PUT,
        "/api/v1/admin/settings",
        Some(&celebrant.token),
        Some(json!({
            "name": "Sarah",
            "age": 30,
            "wishlist_title": "Sarah's 30th",
            "enable_wine_selection": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["name"], "Sarah");
    assert_eq!(updated["age"], 30);
    assert_eq!(updated["enable_wine_selection"], true);
    // Share id is not client editable.
    assert_eq!(updated["celebrant_id"], celebrant.share_id.as_str());
}

#[tokio::test]
async fn test_settings_validation() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;

    for body in [
        json!({"name": ""}),
        json!({"name": "a".repeat(101)}),
        json!({"name": "Sarah", "age": 151}),
    ] {
        let (status, response) = send(
            &ctx.app,
            Method::PUT,
            "/api/v1/admin/settings",
            Some(&celebrant.token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", response);
        assert_eq!(response["error"], "validation_error");
    }
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
async fn test_item_lifecycle() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Headphones", 2).await;

    let (status, list) = get(&ctx, "/api/v1/admin/items", &celebrant.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["quantity"], 2);
    assert_eq!(list["items"][0]["reserved"], 0);

    let uri = format!("/api/v1/admin/items/{}", item_id);
    let (status, updated) = send(
        &ctx.app,
        Method::PATCH,
        &uri,
        Some(&celebrant.token),
        Some(json!({"title": "Noise Cancelling Headphones", "category": "tech"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["title"], "Noise Cancelling Headphones");
    assert_eq!(updated["quantity"], 2);

    let (status, _) = send(&ctx.app, Method::DELETE, &uri, Some(&celebrant.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&ctx.app, Method::DELETE, &uri, Some(&celebrant.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_item_update_cannot_touch_stock() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Watch", 1).await;
    let uri = format!("/api/v1/admin/items/{}", item_id);

    let (status, _) = send(
        &ctx.app,
        Method::PATCH,
        &uri,
        Some(&celebrant.token),
        Some(json!({"quantity": 10})),
    )
    .await;
    assert!(status.is_client_error());

    let (status, body) = send(
        &ctx.app,
        Method::PATCH,
        &uri,
        Some(&celebrant.token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    assert_eq!(item_counters(&ctx.pool, item_id).await, (1, 0));
}

#[tokio::test]
async fn test_items_are_scoped_to_celebrant() {
    let ctx = setup().await;
    let owner = create_celebrant(&ctx).await;
    let intruder = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &owner, "Necklace", 1).await;

    let uri = format!("/api/v1/admin/items/{}", item_id);
    let (status, _) = send(
        &ctx.app,
        Method::PATCH,
        &uri,
        Some(&intruder.token),
        Some(json!({"title": "Mine now"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&ctx.app, Method::DELETE, &uri, Some(&intruder.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = get(&ctx, "/api/v1/admin/items", &intruder.token).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_item_create_validation() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;

    for body in [
        json!({"title": "", "quantity": 1}),
        json!({"title": "Zero", "quantity": 0}),
        json!({"title": "Bad image", "image": "ftp://example.com/a.png"}),
    ] {
        let (status, response) = send(
            &ctx.app,
            Method::POST,
            "/api/v1/admin/items",
            Some(&celebrant.token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", response);
    }
}

// ============================================================================
// Dashboard, listings and export
// ============================================================================

#[tokio::test]
async fn test_dashboard_totals() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Vase", 5).await;

    seed_reservation(&ctx, celebrant.celebrant_id, item_id, "anna@example.com", true).await;
    seed_reservation(&ctx, celebrant.celebrant_id, item_id, "ben@example.com", false).await;
    seed_donation(&ctx, celebrant.celebrant_id, "ANNA@example.com", 15.0, "USD").await;
    seed_donation(&ctx, celebrant.celebrant_id, "carl@example.com", 5.25, "USD").await;

    let (status, summary) = get(&ctx, "/api/v1/admin/dashboard", &celebrant.token).await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(summary["total_reservations"], 2);
    assert_eq!(summary["total_donations"], 2);
    assert_eq!(summary["total_guests"], 3);
    assert_eq!(summary["wine_add_ons"], 1);
    assert_eq!(summary["flower_add_ons"], 0);
    assert_eq!(summary["donation_totals"][0]["currency"], "USD");
    assert_eq!(summary["donation_totals"][0]["amount"], 20.25);
    assert_eq!(summary["transfer_types"]["belarus"], 2);
    assert_eq!(summary["items"][0]["reserved"], 2);
    assert_eq!(summary["items"][0]["available"], 3);
}

#[tokio::test]
async fn test_reservation_pagination() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Candles", 10).await;
    for _ in 0..5 {
        seed_reservation(&ctx, celebrant.celebrant_id, item_id, &guest_email(), false).await;
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let uri = match &cursor {
            Some(c) => format!("/api/v1/admin/reservations?limit=2&cursor={}", c),
            None => "/api/v1/admin/reservations?limit=2".to_string(),
        };
        let (status, page) = get(&ctx, &uri, &celebrant.token).await;
        assert_eq!(status, StatusCode::OK, "{}", page);

        let reservations = page["reservations"].as_array().unwrap();
        assert!(reservations.len() <= 2);
        seen.extend(reservations.iter().map(|r| r["id"].as_str().unwrap().to_string()));

        match page["next_cursor"].as_str() {
            Some(next) => cursor = Some(next.to_string()),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn test_invalid_cursor_is_rejected() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;

    let (status, body) = send(
        &ctx.app,
        Method::GET,
        "/api/v1/admin/donations?cursor=not-a-cursor",
        Some(&celebrant.token),
        None,
    )
    .await;
    assert!(status.is_client_error(), "{}", body);
}

#[tokio::test]
async fn test_export_is_an_attachment() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Mug", 3).await;
    seed_reservation(&ctx, celebrant.celebrant_id, item_id, "dora@example.com", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/admin/export",
            Some(&celebrant.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"birthday-wishlist-data-"));
    assert!(disposition.ends_with(".json\""));

    let document = common::response_json(response).await;
    assert_eq!(document["reservations"].as_array().unwrap().len(), 1);
    assert_eq!(document["summary"]["total_reservations"], 1);
    assert_eq!(
        document["celebrant_settings"]["celebrant_id"],
        celebrant.share_id.as_str()
    );
}

// ============================================================================
// Pending write replay
// ============================================================================

#[tokio::test]
async fn test_pending_writes_replay_in_order() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let queue = PendingWriteQueue::in_memory();
    let owner = WriteOwner::account(&celebrant.subject, celebrant.celebrant_id);
    let item_id = Uuid::new_v4();

    let create: CreateItemRequest =
        serde_json::from_value(json!({"title": "Queued Item", "quantity": 2})).unwrap();
    queue
        .enqueue(
            owner.clone(),
            PendingMutation::CreateItem {
                item_id,
                request: create,
            },
        )
        .await
        .unwrap();
    queue
        .enqueue(
            owner.clone(),
            PendingMutation::UpdateItem {
                item_id,
                request: UpdateItemRequest {
                    title: Some("Renamed While Offline".to_string()),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
    let settings: UpdateSettingsRequest =
        serde_json::from_value(json!({"name": "Offline Name"})).unwrap();
    queue
        .enqueue(owner, PendingMutation::UpdateSettings { request: settings })
        .await
        .unwrap();

    let writer = AdminWriter::new(ctx.pool.clone());
    let report = queue.replay(&writer).await.unwrap();
    assert_eq!(report.applied, 3);
    assert_eq!(report.remaining, 0);
    assert!(queue.is_empty().await);

    let (_, list) = get(&ctx, "/api/v1/admin/items", &celebrant.token).await;
    assert_eq!(list["items"][0]["id"], item_id.to_string());
    assert_eq!(list["items"][0]["title"], "Renamed While Offline");

    let (_, settings) = get(&ctx, "/api/v1/admin/settings", &celebrant.token).await;
    assert_eq!(settings["name"], "Offline Name");
}

#[tokio::test]
async fn test_replay_drops_update_of_deleted_item() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let queue = PendingWriteQueue::in_memory();
    let owner = WriteOwner::account(&celebrant.subject, celebrant.celebrant_id);
    let missing = Uuid::new_v4();

    queue
        .enqueue(
            owner.clone(),
            PendingMutation::UpdateItem {
                item_id: missing,
                request: UpdateItemRequest {
                    title: Some("Nope".to_string()),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
    queue
        .enqueue(owner, PendingMutation::DeleteItem { item_id: missing })
        .await
        .unwrap();

    let report = queue.replay(&AdminWriter::new(ctx.pool.clone())).await.unwrap();
    assert_eq!(report.dropped, 1);
    assert_eq!(report.applied, 1);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_replay_creates_account_for_unresolved_owner() {
    let ctx = setup().await;
    let subject = format!("offline-subject-{}", Uuid::new_v4().simple());
    let queue = PendingWriteQueue::in_memory();
    let owner = WriteOwner::subject(&subject, Some(format!("{}@example.com", subject)));
    let item_id = Uuid::new_v4();

    let settings: UpdateSettingsRequest =
        serde_json::from_value(json!({"name": "Queued Before Sign In"})).unwrap();
    let create: CreateItemRequest =
        serde_json::from_value(json!({"title": "Queued Gift", "quantity": 1})).unwrap();
    queue
        .enqueue(owner.clone(), PendingMutation::UpdateSettings { request: settings })
        .await
        .unwrap();
    queue
        .enqueue(
            owner,
            PendingMutation::CreateItem {
                item_id,
                request: create,
            },
        )
        .await
        .unwrap();

    let report = queue.replay(&AdminWriter::new(ctx.pool.clone())).await.unwrap();
    assert_eq!(report.applied, 2);
    assert!(queue.is_empty().await);

    let (email,): (Option<String>,) =
        sqlx::query_as("SELECT email FROM celebrants WHERE auth_subject = $1")
            .bind(&subject)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(email, Some(format!("{}@example.com", subject)));

    let token = token_for(&subject);
    let (status, settings) = get(&ctx, "/api/v1/admin/settings", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["name"], "Queued Before Sign In");

    let (_, list) = get(&ctx, "/api/v1/admin/items", &token).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["id"], item_id.to_string());
}

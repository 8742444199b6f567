//! Integration tests for guest reservations.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: TEST_DATABASE_URL=postgres://... cargo test --test reservations_integration

mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{
    create_celebrant, create_item, guest_email, guest_name, item_counters, send, setup,
    TestCelebrant, TestContext,
};
use domain::services::NotificationType;
use serde_json::{json, Value};
use uuid::Uuid;

fn reservation_body(celebrant: &TestCelebrant, items: &[(Uuid, &str)]) -> Value {
    json!({
        "celebrant_id": celebrant.celebrant_id,
        "guest_name": guest_name(),
        "guest_email": guest_email(),
        "selected_items": items
            .iter()
            .map(|(id, title)| json!({"id": id, "title": title}))
            .collect::<Vec<_>>(),
        "include_wine": true,
        "include_flowers": false,
    })
}

async fn reserve(ctx: &TestContext, body: Value) -> (StatusCode, Value) {
    send(&ctx.app, Method::POST, "/api/v1/reservations", None, Some(body)).await
}

async fn reservation_count(ctx: &TestContext, celebrant_id: Uuid) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reservations WHERE celebrant_id = $1")
            .bind(celebrant_id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    count
}

#[tokio::test]
async fn test_single_unit_reserved_once_then_out_of_stock() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Vintage Camera", 1).await;
    assert_eq!(item_counters(&ctx.pool, item_id).await, (1, 0));

    let body = reservation_body(&celebrant, &[(item_id, "Vintage Camera")]);
    let (status, body) = reserve(&ctx, body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);
    assert!(body["reservation_id"].as_str().is_some());
    assert_eq!(item_counters(&ctx.pool, item_id).await, (0, 1));

    let body = reservation_body(&celebrant, &[(item_id, "Vintage Camera")]);
    let (status, body) = reserve(&ctx, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "out_of_stock");
    assert!(body["message"].as_str().unwrap().contains("Vintage Camera"));
    assert_eq!(item_counters(&ctx.pool, item_id).await, (0, 1));
    assert_eq!(reservation_count(&ctx, celebrant.celebrant_id).await, 1);
}

#[tokio::test]
async fn test_out_of_stock_item_leaves_whole_reservation_unapplied() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let available = create_item(&ctx, &celebrant, "Board Game", 3).await;
    let gone = create_item(&ctx, &celebrant, "Concert Tickets", 1).await;

    let body = reservation_body(&celebrant, &[(gone, "Concert Tickets")]);
    let (status, _) = reserve(&ctx, body).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = reserve(
        &ctx,
        reservation_body(&celebrant, &[(available, "Board Game"), (gone, "Concert Tickets")]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "out_of_stock");

    assert_eq!(item_counters(&ctx.pool, available).await, (3, 0));
    assert_eq!(item_counters(&ctx.pool, gone).await, (0, 1));
    assert_eq!(reservation_count(&ctx, celebrant.celebrant_id).await, 1);
}

#[tokio::test]
async fn test_unknown_item_is_rejected() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let real = create_item(&ctx, &celebrant, "Scarf", 2).await;

    let (status, body) = reserve(
        &ctx,
        reservation_body(&celebrant, &[(real, "Scarf"), (Uuid::new_v4(), "Ghost")]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item_not_found");
    assert_eq!(item_counters(&ctx.pool, real).await, (2, 0));
}

#[tokio::test]
async fn test_item_of_another_celebrant_is_not_found() {
    let ctx = setup().await;
    let owner = create_celebrant(&ctx).await;
    let other = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &owner, "Bike", 1).await;

    let (status, body) = reserve(&ctx, reservation_body(&other, &[(item_id, "Bike")])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item_not_found");
    assert_eq!(item_counters(&ctx.pool, item_id).await, (1, 0));
}

#[tokio::test]
async fn test_validation_failures() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Book", 1).await;

    let mut missing_name = reservation_body(&celebrant, &[(item_id, "Book")]);
    missing_name["guest_name"] = json!("");
    let (status, body) = reserve(&ctx, missing_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let mut bad_email = reservation_body(&celebrant, &[(item_id, "Book")]);
    bad_email["guest_email"] = json!("not-an-email");
    let (status, _) = reserve(&ctx, bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_celebrant = reservation_body(&celebrant, &[(item_id, "Book")]);
    no_celebrant.as_object_mut().unwrap().remove("celebrant_id");
    let (status, body) = reserve(&ctx, no_celebrant).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("celebrant_id"));

    let (status, _) = reserve(&ctx, reservation_body(&celebrant, &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = reserve(
        &ctx,
        reservation_body(&celebrant, &[(item_id, "Book"), (item_id, "Book")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(item_counters(&ctx.pool, item_id).await, (1, 0));
    assert_eq!(reservation_count(&ctx, celebrant.celebrant_id).await, 0);
}

#[tokio::test]
async fn test_reservation_through_share_id() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Perfume", 2).await;

    let mut body = reservation_body(&celebrant, &[(item_id, "Perfume")]);
    body.as_object_mut().unwrap().remove("celebrant_id");
    let uri = format!("/api/v1/wishlists/{}/reservations", celebrant.share_id);
    let (status, response) = send(&ctx.app, Method::POST, &uri, None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    assert_eq!(item_counters(&ctx.pool, item_id).await, (1, 1));

    let (status, _) = send(
        &ctx.app,
        Method::POST,
        "/api/v1/wishlists/doesnotexist/reservations",
        None,
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_reservations_decrement_exactly_once() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Limited Print", 1).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let app = ctx.app.clone();
            let body = reservation_body(&celebrant, &[(item_id, "Limited Print")]);
            tokio::spawn(async move {
                send(&app, Method::POST, "/api/v1/reservations", None, Some(body))
                    .await
                    .0
            })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT | StatusCode::SERVICE_UNAVAILABLE => {}
            other => panic!("Unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(item_counters(&ctx.pool, item_id).await, (0, 1));
    assert_eq!(reservation_count(&ctx, celebrant.celebrant_id).await, 1);
}

#[tokio::test]
async fn test_reservation_notifies_after_commit() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Teapot", 1).await;

    let (status, body) = reserve(&ctx, reservation_body(&celebrant, &[(item_id, "Teapot")])).await;
    assert_eq!(status, StatusCode::CREATED);
    let reservation_id = Uuid::parse_str(body["reservation_id"].as_str().unwrap()).unwrap();

    // Notifications run on a detached task.
    for _ in 0..50 {
        if !ctx.notifier.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(
        ctx.notifier.sent(),
        vec![(NotificationType::ReservationConfirmed, reservation_id)]
    );
}

#[tokio::test]
async fn test_reserved_snapshot_keeps_title_after_rename() {
    let ctx = setup().await;
    let celebrant = create_celebrant(&ctx).await;
    let item_id = create_item(&ctx, &celebrant, "Old Title", 2).await;

    let (status, _) = reserve(&ctx, reservation_body(&celebrant, &[(item_id, "Old Title")])).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &ctx.app,
        Method::PATCH,
        &format!("/api/v1/admin/items/{}", item_id),
        Some(&celebrant.token),
        Some(json!({"title": "New Title"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, page) = send(
        &ctx.app,
        Method::GET,
        "/api/v1/admin/reservations",
        Some(&celebrant.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["reservations"][0]["selected_items"][0]["title"], "Old Title");
}

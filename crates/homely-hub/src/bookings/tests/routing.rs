use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::bookings::domain::BookingStatus;
use crate::bookings::policy::BookingPolicy;
use crate::bookings::router::{availability_handler, request_handler, AvailabilityQuery};
use crate::bookings::BookingService;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn future_request_body(check_in: &str, check_out: &str) -> Value {
    json!({
        "property_id": LAKESIDE,
        "guest_id": "guest-sam",
        "check_in": check_in,
        "check_out": check_out,
        "guests": 2,
    })
}

#[tokio::test]
async fn create_route_returns_created_booking() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let router = booking_router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/bookings",
            future_request_body("2099-06-01", "2099-06-05"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["nights"], json!(4));
    assert_eq!(payload["check_in"], json!("2099-06-01"));
    assert_eq!(payload["pricing"]["total"], json!(59_000));
}

#[tokio::test]
async fn overlapping_request_returns_conflict_with_ids() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let router = booking_router_with_service(service);

    let first = router
        .clone()
        .oneshot(post_json(
            "/api/v1/bookings",
            future_request_body("2099-06-01", "2099-06-05"),
        ))
        .await
        .expect("route executes");
    let first_id = read_json_body(first).await["id"].clone();

    let response = router
        .oneshot(post_json(
            "/api/v1/bookings",
            future_request_body("2099-06-04", "2099-06-06"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["conflicting_bookings"], json!([first_id]));
}

#[tokio::test]
async fn zero_night_request_is_unprocessable() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let response = request_handler::<MemoryRepository, MemoryCatalog, MemoryNotifier>(
        State(Arc::new(service)),
        axum::Json(request(date(2099, 6, 1), date(2099, 6, 1))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("at least one night"));
}

#[tokio::test]
async fn unknown_property_returns_not_found() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let mut body = future_request_body("2099-06-01", "2099-06-05");
    body["property_id"] = json!("prop-missing");

    let response = booking_router_with_service(service)
        .oneshot(post_json("/api/v1/bookings", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transition_route_applies_host_acceptance() {
    let (service, _, notifier) = build_service(BookingPolicy::default());
    let service = Arc::new(service);
    let booking = service
        .request_booking(request(date(2099, 6, 1), date(2099, 6, 5)), may_first())
        .expect("booking");
    let router = crate::bookings::booking_router(service.clone());

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/bookings/{}/transitions", booking.id),
            json!({ "status": "confirmed", "actor": "host" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("confirmed"));
    assert_eq!(payload["history"][0]["actor"], json!("host"));

    let rejected = router
        .oneshot(post_json(
            &format!("/api/v1/bookings/{}/transitions", booking.id),
            json!({ "status": "pending", "actor": "admin" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(
        notifier.templates(),
        vec!["booking_requested", "booking_confirmed"]
    );
    assert_eq!(
        service.get(&booking.id).expect("stored").status,
        BookingStatus::Confirmed
    );
}

#[tokio::test]
async fn booking_lookup_routes() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let service = Arc::new(service);
    let booking = service
        .request_booking(request(date(2099, 7, 1), date(2099, 7, 3)), may_first())
        .expect("booking");
    let router = crate::bookings::booking_router(service);

    let found = router
        .clone()
        .oneshot(get(&format!("/api/v1/bookings/{}", booking.id)))
        .await
        .expect("route executes");
    assert_eq!(found.status(), StatusCode::OK);

    let missing = router
        .clone()
        .oneshot(get("/api/v1/bookings/bkg-missing"))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let by_property = router
        .clone()
        .oneshot(get(&format!("/api/v1/properties/{LAKESIDE}/bookings")))
        .await
        .expect("route executes");
    let payload = read_json_body(by_property).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));

    let by_guest = router
        .clone()
        .oneshot(get("/api/v1/guests/guest-sam/bookings"))
        .await
        .expect("route executes");
    let payload = read_json_body(by_guest).await;
    assert_eq!(payload[0]["id"], json!(booking.id.0));

    let by_host = router
        .clone()
        .oneshot(get("/api/v1/hosts/host-ana/bookings"))
        .await
        .expect("route executes");
    assert_eq!(by_host.status(), StatusCode::OK);
    let payload = read_json_body(by_host).await;
    assert_eq!(payload[0]["host_id"], json!("host-ana"));

    let other_host = router
        .oneshot(get("/api/v1/hosts/host-lee/bookings"))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(other_host).await, json!([]));
}

#[tokio::test]
async fn availability_handler_reports_free_and_busy_ranges() {
    let (service, _, _) = build_service(BookingPolicy::new(true, true, 1_000));
    let service = Arc::new(service);
    service
        .request_booking(request(june(1), june(5)), may_first())
        .expect("booking");

    let busy = availability_handler::<MemoryRepository, MemoryCatalog, MemoryNotifier>(
        State(service.clone()),
        Path(LAKESIDE.to_string()),
        Query(AvailabilityQuery {
            check_in: june(4),
            check_out: june(6),
        }),
    )
    .await;
    assert_eq!(busy.status(), StatusCode::OK);
    let payload = read_json_body(busy).await;
    assert_eq!(payload["available"], json!(false));

    let free = availability_handler::<MemoryRepository, MemoryCatalog, MemoryNotifier>(
        State(service.clone()),
        Path(LAKESIDE.to_string()),
        Query(AvailabilityQuery {
            check_in: june(5),
            check_out: june(8),
        }),
    )
    .await;
    let payload = read_json_body(free).await;
    assert_eq!(payload["available"], json!(true));
    assert_eq!(payload["conflicts"], json!([]));

    let invalid = availability_handler::<MemoryRepository, MemoryCatalog, MemoryNotifier>(
        State(service),
        Path(LAKESIDE.to_string()),
        Query(AvailabilityQuery {
            check_in: june(5),
            check_out: june(5),
        }),
    )
    .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn availability_route_reads_query_string() {
    let (service, _, _) = build_service(BookingPolicy::new(true, true, 1_000));
    let service = Arc::new(service);
    let booking = service
        .request_booking(request(date(2099, 6, 1), date(2099, 6, 5)), may_first())
        .expect("booking");
    let router = crate::bookings::booking_router(service);
    let uri = |check_in: &str, check_out: &str| {
        format!(
            "/api/v1/properties/{LAKESIDE}/availability?check_in={check_in}&check_out={check_out}"
        )
    };

    let busy = router
        .clone()
        .oneshot(get(&uri("2099-06-04", "2099-06-06")))
        .await
        .expect("route executes");
    assert_eq!(busy.status(), StatusCode::OK);
    let payload = read_json_body(busy).await;
    assert_eq!(payload["available"], json!(false));
    assert_eq!(payload["conflicts"], json!([booking.id.0]));

    let adjacent = router
        .clone()
        .oneshot(get(&uri("2099-06-05", "2099-06-08")))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(adjacent).await["available"], json!(true));

    let missing_dates = router
        .clone()
        .oneshot(get(&format!("/api/v1/properties/{LAKESIDE}/availability")))
        .await
        .expect("route executes");
    assert_eq!(missing_dates.status(), StatusCode::BAD_REQUEST);

    let posted = router
        .oneshot(post_json(
            &format!("/api/v1/properties/{LAKESIDE}/availability"),
            json!({ "check_in": "2099-06-04", "check_out": "2099-06-06" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(posted.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn repository_outage_maps_to_internal_error() {
    let service = Arc::new(BookingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryCatalog::with_listings([listing(LAKESIDE)])),
        Arc::new(MemoryNotifier::default()),
        BookingPolicy::default(),
    ));

    let response = request_handler::<UnavailableRepository, MemoryCatalog, MemoryNotifier>(
        State(service),
        axum::Json(request(date(2099, 6, 1), date(2099, 6, 5))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_actor_is_rejected_by_extractor() {
    let (service, _, _) = build_service(BookingPolicy::default());
    let service = Arc::new(service);
    let booking = service
        .request_booking(request(date(2099, 6, 1), date(2099, 6, 5)), may_first())
        .expect("booking");

    let response = crate::bookings::booking_router(service.clone())
        .oneshot(post_json(
            &format!("/api/v1/bookings/{}/transitions", booking.id),
            json!({ "status": "confirmed", "actor": "landlord" }),
        ))
        .await
        .expect("route executes");

    assert!(response.status().is_client_error());
    assert_eq!(
        service.get(&booking.id).expect("stored").status,
        BookingStatus::Pending
    );
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ActorRole, BookingId, BookingRequest, BookingStatus, GuestId, HostId, PropertyId,
};
use super::repository::{BookingNotifier, BookingRepository, PropertyCatalog, RepositoryError};
use super::service::{BookingService, BookingServiceError};

/// Body of a status-change request.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
    pub actor: ActorRole,
}

/// Query string of an availability probe: `?check_in=YYYY-MM-DD&check_out=YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Router builder exposing booking endpoints.
pub fn booking_router<R, P, N>(service: Arc<BookingService<R, P, N>>) -> Router
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    Router::new()
        .route("/api/v1/bookings", post(request_handler::<R, P, N>))
        .route("/api/v1/bookings/:booking_id", get(booking_handler::<R, P, N>))
        .route(
            "/api/v1/bookings/:booking_id/transitions",
            post(transition_handler::<R, P, N>),
        )
        .route(
            "/api/v1/properties/:property_id/bookings",
            get(property_bookings_handler::<R, P, N>),
        )
        .route(
            "/api/v1/properties/:property_id/availability",
            get(availability_handler::<R, P, N>),
        )
        .route(
            "/api/v1/guests/:guest_id/bookings",
            get(guest_bookings_handler::<R, P, N>),
        )
        .route(
            "/api/v1/hosts/:host_id/bookings",
            get(host_bookings_handler::<R, P, N>),
        )
        .with_state(service)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// HTTP status for a booking service error.
pub fn status_for(error: &BookingServiceError) -> StatusCode {
    match error {
        BookingServiceError::InvalidDateRange(_)
        | BookingServiceError::InvalidGuestCount { .. }
        | BookingServiceError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BookingServiceError::PropertyNotFound(_)
        | BookingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        BookingServiceError::AvailabilityConflict(_)
        | BookingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        BookingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: BookingServiceError) -> Response {
    let status = status_for(&error);
    let payload = match &error {
        BookingServiceError::AvailabilityConflict(conflict) => json!({
            "error": error.to_string(),
            "conflicting_bookings": conflict.conflicting,
        }),
        _ => json!({ "error": error.to_string() }),
    };

    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn request_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    axum::Json(request): axum::Json<BookingRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    match service.request_booking(request, today()) {
        Ok(booking) => (StatusCode::CREATED, axum::Json(booking)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn booking_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    match service.get(&BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, axum::Json(booking)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(booking_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let id = BookingId(booking_id);
    match service.transition_booking(&id, request.status, request.actor, today()) {
        Ok(booking) => (StatusCode::OK, axum::Json(booking)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn property_bookings_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    match service.bookings_for_property(&PropertyId(property_id)) {
        Ok(bookings) => (StatusCode::OK, axum::Json(bookings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn availability_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(property_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    let property_id = PropertyId(property_id);
    match service.check_availability(&property_id, query.check_in, query.check_out) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn guest_bookings_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(guest_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    match service.bookings_for_guest(&GuestId(guest_id)) {
        Ok(bookings) => (StatusCode::OK, axum::Json(bookings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn host_bookings_handler<R, P, N>(
    State(service): State<Arc<BookingService<R, P, N>>>,
    Path(host_id): Path<String>,
) -> Response
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    match service.bookings_for_host(&HostId(host_id)) {
        Ok(bookings) => (StatusCode::OK, axum::Json(bookings)).into_response(),
        Err(error) => error_response(error),
    }
}

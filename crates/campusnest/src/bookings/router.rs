use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{Actor, BookingId};
use super::intake::BookingSubmission;
use super::lifecycle::TransitionError;
use super::repository::{
    Authenticator, BookingNotifier, BookingRecord, BookingStore, OwnershipDirectory,
};
use super::service::{BookingService, BookingServiceError};

/// HTTP surface bundling the booking service with its authenticator.
pub struct BookingApi<S, D, N, A> {
    service: Arc<BookingService<S, D, N>>,
    auth: Arc<A>,
}

impl<S, D, N, A> BookingApi<S, D, N, A> {
    pub fn new(service: Arc<BookingService<S, D, N>>, auth: Arc<A>) -> Self {
        Self { service, auth }
    }
}

/// Router builder exposing the booking lifecycle endpoints.
pub fn booking_router<S, D, N, A>(api: Arc<BookingApi<S, D, N, A>>) -> Router
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    Router::new()
        .route(
            "/api/v1/bookings",
            post(request_handler::<S, D, N, A>).get(list_handler::<S, D, N, A>),
        )
        .route(
            "/api/v1/bookings/:booking_id",
            get(read_handler::<S, D, N, A>),
        )
        .route(
            "/api/v1/bookings/:booking_id/approve",
            post(approve_handler::<S, D, N, A>),
        )
        .route(
            "/api/v1/bookings/:booking_id/reject",
            post(reject_handler::<S, D, N, A>),
        )
        .route(
            "/api/v1/bookings/:booking_id/cancel",
            post(cancel_handler::<S, D, N, A>),
        )
        .with_state(api)
}

pub(crate) async fn request_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<BookingSubmission>,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    record_response(
        StatusCode::CREATED,
        api.service.request_booking(&actor, submission),
    )
}

pub(crate) async fn list_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match api.service.bookings_for(&actor) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(BookingRecord::view).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn read_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = BookingId(booking_id);
    record_response(StatusCode::OK, api.service.booking(&actor, &id))
}

pub(crate) async fn approve_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = BookingId(booking_id);
    record_response(StatusCode::OK, api.service.approve_booking(&actor, &id))
}

pub(crate) async fn reject_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = BookingId(booking_id);
    record_response(StatusCode::OK, api.service.reject_booking(&actor, &id))
}

pub(crate) async fn cancel_handler<S, D, N, A>(
    State(api): State<Arc<BookingApi<S, D, N, A>>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
    A: Authenticator + 'static,
{
    let actor = match authenticate(&api, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = BookingId(booking_id);
    record_response(StatusCode::OK, api.service.cancel_booking(&actor, &id))
}

fn authenticate<S, D, N, A>(
    api: &BookingApi<S, D, N, A>,
    headers: &HeaderMap,
) -> Result<Actor, Response>
where
    A: Authenticator + 'static,
{
    api.auth.authenticate(bearer_token(headers)).map_err(|error| {
        let payload = json!({
            "error": error.to_string(),
        });
        (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn record_response(
    status: StatusCode,
    outcome: Result<BookingRecord, BookingServiceError>,
) -> Response {
    match outcome {
        Ok(record) => (status, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &BookingServiceError) -> StatusCode {
    match error {
        BookingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BookingServiceError::Denied(_) => StatusCode::FORBIDDEN,
        BookingServiceError::Transition(TransitionError::Forbidden { .. }) => {
            StatusCode::FORBIDDEN
        }
        BookingServiceError::Transition(TransitionError::InvalidState { .. }) => {
            StatusCode::CONFLICT
        }
        BookingServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingServiceError::DuplicateRequest | BookingServiceError::Conflict => {
            StatusCode::CONFLICT
        }
        BookingServiceError::Notify(_) | BookingServiceError::Unavailable(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: BookingServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), axum::Json(payload)).into_response()
}

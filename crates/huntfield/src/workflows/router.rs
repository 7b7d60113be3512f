use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::VerificationConfig;
use crate::workflows::booking::{
    Actor, BookingId, BookingService, BookingServiceError, CatalogError, DateRange, FieldCatalog,
    FieldDraft, FieldId, RequestContext, StoreError,
};
use crate::workflows::hunt::{
    AnimalTagIssuer, HuntService, HuntServiceError, ReportDraft, ReportId, TagError,
};

/// Shared state behind the core HTTP surface.
pub struct CoreState {
    pub bookings: Arc<BookingService>,
    pub hunts: Arc<HuntService>,
    pub catalog: Arc<FieldCatalog>,
    pub issuer: AnimalTagIssuer,
    pub verification: VerificationConfig,
}

/// Router exposing the booking and hunt operations plus the public tag
/// verification lookup.
pub fn core_router(state: Arc<CoreState>) -> Router {
    Router::new()
        .route("/api/v1/bookings", post(create_booking))
        .route("/api/v1/bookings/:booking_id", get(get_booking))
        .route("/api/v1/bookings/:booking_id/approve", post(approve_booking))
        .route("/api/v1/bookings/:booking_id/deny", post(deny_booking))
        .route("/api/v1/bookings/:booking_id/cancel", post(cancel_booking))
        .route("/api/v1/bookings/:booking_id/start-day", post(start_day))
        .route("/api/v1/bookings/:booking_id/finish-hunt", post(finish_hunt))
        .route("/api/v1/reports/:report_id/review", post(attach_review))
        .route("/api/v1/fields", post(register_field).get(list_fields))
        .route("/api/v1/fields/:field_id", delete(delete_field))
        .route("/api/v1/fields/import", post(import_roster))
        .route("/api/v1/tags/:tag_number", get(verify_tag))
        .with_state(state)
}

fn context(actor: Actor, today: Option<NaiveDate>) -> RequestContext {
    RequestContext::new(actor, today.unwrap_or_else(|| Local::now().date_naive()))
}

fn error_body(kind: &'static str, message: String) -> Json<serde_json::Value> {
    Json(json!({ "kind": kind, "error": message }))
}

fn store_error_response(err: &StoreError) -> Response {
    match err {
        StoreError::NotFound => {
            (StatusCode::NOT_FOUND, error_body("not_found", err.to_string())).into_response()
        }
        StoreError::Conflict => {
            (StatusCode::CONFLICT, error_body("conflict", err.to_string())).into_response()
        }
        StoreError::Unavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("internal", err.to_string()),
        )
            .into_response(),
    }
}

fn booking_error_response(err: BookingServiceError) -> Response {
    match &err {
        BookingServiceError::Access(_) => (
            StatusCode::FORBIDDEN,
            error_body("authorization", err.to_string()),
        )
            .into_response(),
        BookingServiceError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("validation", err.to_string()),
        )
            .into_response(),
        BookingServiceError::State(_) => {
            (StatusCode::CONFLICT, error_body("state", err.to_string())).into_response()
        }
        BookingServiceError::Availability(_) => (
            StatusCode::CONFLICT,
            error_body("availability", err.to_string()),
        )
            .into_response(),
        BookingServiceError::Store(store) => store_error_response(store),
        BookingServiceError::Payment(_) => (
            StatusCode::BAD_GATEWAY,
            error_body("payment", err.to_string()),
        )
            .into_response(),
    }
}

fn hunt_error_response(err: HuntServiceError) -> Response {
    match &err {
        HuntServiceError::Access(_) => (
            StatusCode::FORBIDDEN,
            error_body("authorization", err.to_string()),
        )
            .into_response(),
        HuntServiceError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("validation", err.to_string()),
        )
            .into_response(),
        HuntServiceError::State(_) => {
            (StatusCode::CONFLICT, error_body("state", err.to_string())).into_response()
        }
        HuntServiceError::Quota(_) => {
            (StatusCode::CONFLICT, error_body("quota", err.to_string())).into_response()
        }
        HuntServiceError::Store(store) => store_error_response(store),
        HuntServiceError::Tag(TagError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            error_body("not_found", err.to_string()),
        )
            .into_response(),
        HuntServiceError::Tag(TagError::Store(store)) => store_error_response(store),
    }
}

fn catalog_error_response(err: CatalogError) -> Response {
    match &err {
        CatalogError::Access(_) => (
            StatusCode::FORBIDDEN,
            error_body("authorization", err.to_string()),
        )
            .into_response(),
        CatalogError::Validation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("validation", err.to_string()),
        )
            .into_response(),
        CatalogError::Store(store) => store_error_response(store),
    }
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    field_id: String,
    start: NaiveDate,
    end: NaiveDate,
    party_size: u32,
}

async fn create_booking(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    let dates = match DateRange::new(payload.start, payload.end) {
        Ok(dates) => dates,
        Err(err) => return booking_error_response(err.into()),
    };
    match state.bookings.create_booking(
        &ctx,
        &FieldId(payload.field_id),
        dates,
        payload.party_size,
    ) {
        Ok(booking) => (StatusCode::CREATED, Json(booking.to_view())).into_response(),
        Err(err) => booking_error_response(err),
    }
}

async fn get_booking(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
) -> Response {
    match state.bookings.get(&BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, Json(booking.to_view())).into_response(),
        Err(err) => booking_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
}

async fn approve_booking(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ActionRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state.bookings.approve(&ctx, &BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, Json(booking.to_view())).into_response(),
        Err(err) => booking_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct DenyRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    reason: String,
}

async fn deny_booking(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<DenyRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state
        .bookings
        .deny(&ctx, &BookingId(booking_id), &payload.reason)
    {
        Ok(booking) => (StatusCode::OK, Json(booking.to_view())).into_response(),
        Err(err) => booking_error_response(err),
    }
}

async fn cancel_booking(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ActionRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state.bookings.cancel(&ctx, &BookingId(booking_id)) {
        Ok(booking) => (StatusCode::OK, Json(booking.to_view())).into_response(),
        Err(err) => booking_error_response(err),
    }
}

async fn start_day(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ActionRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state.hunts.start_day(&ctx, &BookingId(booking_id)) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => hunt_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct FinishHuntRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    report: ReportDraft,
}

async fn finish_hunt(
    State(state): State<Arc<CoreState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<FinishHuntRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state
        .hunts
        .finish_hunt(&ctx, &BookingId(booking_id), payload.report)
    {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(err) => hunt_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    rating: u8,
    text: String,
}

async fn attach_review(
    State(state): State<Arc<CoreState>>,
    Path(report_id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state
        .hunts
        .attach_review(&ctx, &ReportId(report_id), payload.rating, payload.text)
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => hunt_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct RegisterFieldRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    field: FieldDraft,
}

async fn register_field(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<RegisterFieldRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state.catalog.register_field(&ctx, payload.field) {
        Ok(field) => (StatusCode::CREATED, Json(field)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn list_fields(State(state): State<Arc<CoreState>>) -> Response {
    match state.catalog.list() {
        Ok(fields) => (StatusCode::OK, Json(fields)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn delete_field(
    State(state): State<Arc<CoreState>>,
    Path(field_id): Path<String>,
    Json(payload): Json<ActionRequest>,
) -> Response {
    let ctx = context(payload.actor, payload.today);
    match state.catalog.delete_field(&ctx, &FieldId(field_id)) {
        Ok(deleted) => (StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct RosterImportRequest {
    actor: Actor,
    #[serde(default)]
    today: Option<NaiveDate>,
    csv: String,
}

async fn import_roster(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<RosterImportRequest>,
) -> Response {
    use crate::workflows::roster::{RosterImportError, RosterImporter};
    use std::io::Cursor;

    let ctx = context(payload.actor, payload.today);
    let importer = RosterImporter::new(&state.catalog);
    match importer.from_reader(&ctx, Cursor::new(payload.csv.into_bytes())) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(RosterImportError::Forbidden(err)) => (
            StatusCode::FORBIDDEN,
            error_body("authorization", err.to_string()),
        )
            .into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("validation", err.to_string()),
        )
            .into_response(),
    }
}

async fn verify_tag(
    State(state): State<Arc<CoreState>>,
    Path(tag_number): Path<String>,
) -> Response {
    let Ok(number) = Uuid::parse_str(tag_number.trim()) else {
        return (
            StatusCode::NOT_FOUND,
            error_body("not_found", format!("no animal tag {tag_number} on record")),
        )
            .into_response();
    };

    match state.issuer.verify(&number) {
        Ok(tag) => {
            let link = state.verification.link_for(&tag.tag_number);
            let mut body = serde_json::to_value(&tag).unwrap_or_else(|_| json!({}));
            if let Some(object) = body.as_object_mut() {
                object.insert("verify_url".to_string(), json!(link));
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(TagError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            error_body("not_found", format!("no animal tag {number} on record")),
        )
            .into_response(),
        Err(TagError::Store(store)) => store_error_response(&store),
    }
}

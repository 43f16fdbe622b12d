use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::api_response::ApiResponse;
use crate::dto::booking_dto::{BookingFilters, BookingResponse, CreateBookingRequest};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::ApiJson;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking).delete(delete_booking))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/complete", post(complete_booking))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(filters): Query<BookingFilters>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.list(filters).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.create(request).await?))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.confirm(id).await?))
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.complete(id).await?))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.delete(id).await?))
}

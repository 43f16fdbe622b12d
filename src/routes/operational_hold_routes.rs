use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::operational_hold_controller::OperationalHoldController;
use crate::dto::api_response::ApiResponse;
use crate::dto::operational_hold_dto::{
    CreateOperationalHoldRequest, OperationalHoldFilters, OperationalHoldResponse, UpdateOperationalHoldRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::ApiJson;

pub fn create_operational_hold_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_holds).post(create_hold))
        .route("/reasons", get(list_reasons))
        .route("/:id", get(get_hold).put(update_hold).delete(delete_hold))
}

async fn list_reasons() -> Json<Vec<&'static str>> {
    Json(OperationalHoldController::reasons())
}

async fn list_holds(
    State(state): State<AppState>,
    Query(filters): Query<OperationalHoldFilters>,
) -> Result<Json<Vec<OperationalHoldResponse>>, AppError> {
    let controller = OperationalHoldController::new(&state);
    Ok(Json(controller.list(filters).await?))
}

async fn get_hold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OperationalHoldResponse>, AppError> {
    let controller = OperationalHoldController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_hold(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOperationalHoldRequest>,
) -> Result<Json<ApiResponse<OperationalHoldResponse>>, AppError> {
    let controller = OperationalHoldController::new(&state);
    Ok(Json(controller.create(request).await?))
}

async fn update_hold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateOperationalHoldRequest>,
) -> Result<Json<ApiResponse<OperationalHoldResponse>>, AppError> {
    let controller = OperationalHoldController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_hold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = OperationalHoldController::new(&state);
    Ok(Json(controller.delete(id).await?))
}

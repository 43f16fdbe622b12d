use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::controllers::vehicle_detail_controller::VehicleDetailController;
use crate::dto::api_response::ApiResponse;
use crate::dto::vehicle_detail_dto::VehicleDetailResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters, VehicleResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::ApiJson;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.list(filters).await?;
    Ok(Json(response))
}

async fn create_vehicle(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

/// Detalle agregado: calendario, alertas e informes de daños
async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleDetailResponse>, AppError> {
    let controller = VehicleDetailController::new(&state);
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

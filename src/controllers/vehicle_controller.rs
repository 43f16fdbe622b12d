use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters, VehicleResponse};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::media_storage::{remove_all, MediaStorage};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};

pub struct VehicleController {
    repository: VehicleRepository,
    media: Arc<dyn MediaStorage>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: VehicleRepository::new(state.pool.clone()),
            media: state.media.clone(),
        }
    }

    pub async fn list(&self, filters: VehicleFilters) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.repository.list(&filters).await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        let vehicle = self.repository.create(&request).await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehicle created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        let vehicle = self.repository.update(id, &request).await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehicle updated successfully",
        ))
    }

    /// Bloqueado mientras haya reservas abiertas
    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Vehicle", id));
        }

        if self.repository.has_open_bookings(id).await? {
            return Err(AppError::Conflict(
                "Vehicle has pending, confirmed or active bookings and cannot be deleted".to_string(),
            ));
        }

        let image_keys = self.repository.delete_with_history(id).await?;
        if !image_keys.is_empty() {
            info!("🧹 Limpiando {} imágenes del vehículo {}", image_keys.len(), id);
            remove_all(self.media.as_ref(), &image_keys).await;
        }

        Ok(ApiResponse::deleted("Vehicle deleted successfully"))
    }
}

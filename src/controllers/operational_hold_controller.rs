use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::operational_hold_dto::{
    CreateOperationalHoldRequest, OperationalHoldFilters, OperationalHoldResponse, UpdateOperationalHoldRequest,
};
use crate::models::operational_hold::CONVENTIONAL_HOLD_REASONS;
use crate::repositories::{OperationalHoldRepository, VehicleRepository};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::ensure_chronological;

pub struct OperationalHoldController {
    repository: OperationalHoldRepository,
    vehicles: VehicleRepository,
}

impl OperationalHoldController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: OperationalHoldRepository::new(state.pool.clone()),
            vehicles: VehicleRepository::new(state.pool.clone()),
        }
    }

    pub fn reasons() -> Vec<&'static str> {
        CONVENTIONAL_HOLD_REASONS.to_vec()
    }

    pub async fn list(&self, filters: OperationalHoldFilters) -> Result<Vec<OperationalHoldResponse>, AppError> {
        let holds = self.repository.list(&filters).await?;
        Ok(holds.into_iter().map(OperationalHoldResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<OperationalHoldResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(OperationalHoldResponse::from)
            .ok_or_else(|| not_found_error("Operational hold", id))
    }

    async fn ensure_vehicle(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        match self.vehicles.find_by_id(vehicle_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found_error("Vehicle", vehicle_id)),
        }
    }

    pub async fn create(
        &self,
        request: CreateOperationalHoldRequest,
    ) -> Result<ApiResponse<OperationalHoldResponse>, AppError> {
        request.validate()?;
        ensure_chronological(request.start_date, request.end_date, "end_date")?;
        self.ensure_vehicle(request.vehicle_id).await?;

        let id = self.repository.create_with_maintenance(&request).await?;
        let hold = self.get_by_id(id).await?;

        Ok(ApiResponse::success_with_message(hold, "Operational hold created successfully"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateOperationalHoldRequest,
    ) -> Result<ApiResponse<OperationalHoldResponse>, AppError> {
        request.validate_all()?;
        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            ensure_chronological(start, end, "end_date")?;
        }
        if let Some(vehicle_id) = request.vehicle_id {
            self.ensure_vehicle(vehicle_id).await?;
        }

        self.repository.update_with_maintenance(id, &request).await?;
        let hold = self.get_by_id(id).await?;

        Ok(ApiResponse::success_with_message(hold, "Operational hold updated successfully"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.repository.delete_cascade(id).await?;
        Ok(ApiResponse::deleted("Operational hold deleted successfully"))
    }
}

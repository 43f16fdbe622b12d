use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::booking_dto::{BookingFilters, BookingResponse, CreateBookingRequest};
use crate::models::booking::BookingTransition;
use crate::repositories::booking_repository::price_line_items;
use crate::repositories::{BookingRepository, VehicleRepository};
use crate::services::catalog_service::CatalogProvider;
use crate::services::media_storage::{remove_all, MediaStorage};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::ensure_chronological;

pub struct BookingController {
    repository: BookingRepository,
    vehicles: VehicleRepository,
    catalog: Arc<dyn CatalogProvider>,
    media: Arc<dyn MediaStorage>,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: BookingRepository::new(state.pool.clone()),
            vehicles: VehicleRepository::new(state.pool.clone()),
            catalog: state.catalog.clone(),
            media: state.media.clone(),
        }
    }

    pub async fn list(&self, filters: BookingFilters) -> Result<Vec<BookingResponse>, AppError> {
        let bookings = self.repository.list(&filters).await?;

        // Los listados no llevan líneas de extras
        Ok(bookings
            .into_iter()
            .map(|booking| BookingResponse::new(booking, Vec::new()))
            .collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<BookingResponse, AppError> {
        let booking = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", id))?;
        let extras = self.repository.extras_for(id).await?;

        Ok(BookingResponse::new(booking, extras))
    }

    pub async fn create(&self, request: CreateBookingRequest) -> Result<ApiResponse<BookingResponse>, AppError> {
        request.validate()?;
        ensure_chronological(request.start_date, request.end_date, "end_date")?;

        if self.vehicles.find_by_id(request.vehicle_id).await?.is_none() {
            return Err(not_found_error("Vehicle", request.vehicle_id));
        }

        let extra_ids: Vec<Uuid> = request.extras.iter().map(|line| line.extra_id).collect();
        let catalog_extras = self.catalog.extras_by_ids(&extra_ids).await?;
        let line_items = price_line_items(&request, &catalog_extras)?;

        let id = self.repository.create(&request, &line_items).await?;
        let booking = self.get_by_id(id).await?;

        Ok(ApiResponse::success_with_message(booking, "Booking created successfully"))
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: BookingTransition,
    ) -> Result<BookingResponse, AppError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", id))?;

        let next = current.booking.status.transition(transition)?;
        self.repository.update_status(id, next).await?;
        info!("📅 Reserva {}: {} -> {}", id, current.booking.status.as_str(), next.as_str());

        self.get_by_id(id).await
    }

    pub async fn confirm(&self, id: Uuid) -> Result<ApiResponse<BookingResponse>, AppError> {
        let booking = self.transition(id, BookingTransition::Confirm).await?;
        Ok(ApiResponse::success_with_message(booking, "Booking confirmed"))
    }

    pub async fn complete(&self, id: Uuid) -> Result<ApiResponse<BookingResponse>, AppError> {
        let booking = self.transition(id, BookingTransition::Complete).await?;
        Ok(ApiResponse::success_with_message(booking, "Booking completed"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", id))?;

        if !current.booking.status.is_deletable() {
            return Err(AppError::Conflict(format!(
                "Bookings in status '{}' cannot be deleted",
                current.booking.status.as_str()
            )));
        }

        let image_keys = self.repository.delete(id).await?;
        remove_all(self.media.as_ref(), &image_keys).await;

        Ok(ApiResponse::deleted("Booking deleted successfully"))
    }
}

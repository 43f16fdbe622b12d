//! Agregador del detalle de vehículo
//!
//! Carga el vehículo y, en paralelo, todas sus relaciones. Un fallo al
//! cargar una relación se registra y se sirve como colección vacía / null;
//! solo la ausencia del propio vehículo es un error.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::dto::damage_report_dto::DamageReportResponse;
use crate::dto::vehicle_detail_dto::VehicleDetailResponse;
use crate::dto::vehicle_dto::VehicleResponse;
use crate::repositories::{BookingRepository, DamageReportRepository, OperationalHoldRepository, VehicleRepository};
use crate::services::catalog_service::CatalogProvider;
use crate::services::timeline_service::{build_alerts, build_schedule, VehicleTimeline};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError};

/// Degrada un fallo de carga de relación al valor por defecto
fn or_empty<T: Default>(relation: &str, vehicle_id: Uuid, result: Result<T, AppError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("⚠️ No se pudo cargar {} del vehículo {}: {}", relation, vehicle_id, e);
        T::default()
    })
}

pub struct VehicleDetailController {
    vehicles: VehicleRepository,
    bookings: BookingRepository,
    holds: OperationalHoldRepository,
    damage_reports: DamageReportRepository,
    catalog: Arc<dyn CatalogProvider>,
}

impl VehicleDetailController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: VehicleRepository::new(state.pool.clone()),
            bookings: BookingRepository::new(state.pool.clone()),
            holds: OperationalHoldRepository::new(state.pool.clone()),
            damage_reports: DamageReportRepository::new(state.pool.clone()),
            catalog: state.catalog.clone(),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<VehicleDetailResponse, AppError> {
        let vehicle = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;

        let location_id = vehicle.current_location_id;
        let load_location = async {
            match location_id {
                Some(location_id) => self.vehicles.find_location(location_id).await,
                None => Ok(None),
            }
        };

        let (bookings, holds, reports, model_details, current_location) = futures::join!(
            self.bookings.find_for_vehicle(id),
            self.holds.find_for_vehicle(id),
            self.damage_reports.find_for_vehicle(id),
            self.catalog.model_details(vehicle.vehicle_model_id),
            load_location,
        );

        let bookings = or_empty("bookings", id, bookings);
        let holds = or_empty("operational holds", id, holds);
        let reports = or_empty("damage reports", id, reports);
        let model_details = or_empty("model details", id, model_details);
        let current_location = or_empty("current location", id, current_location);

        let plain_reports: Vec<_> = reports.iter().map(|entry| entry.report.clone()).collect();
        let timeline = VehicleTimeline::assemble(bookings, holds, &plain_reports);

        let schedule_events = build_schedule(&timeline);
        let alerts_and_health = build_alerts(&timeline);
        debug!(
            "📆 Vehículo {}: {} eventos, {} alertas",
            id,
            schedule_events.len(),
            alerts_and_health.len()
        );

        Ok(VehicleDetailResponse {
            vehicle: VehicleResponse::from(vehicle),
            model_details,
            current_location,
            schedule_events,
            alerts_and_health,
            damage_reports_listing: reports.into_iter().map(DamageReportResponse::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_relation_degrades_to_empty() {
        let failed: Result<Vec<u32>, AppError> = Err(AppError::Internal("boom".to_string()));
        assert!(or_empty("bookings", Uuid::nil(), failed).is_empty());

        let missing: Result<Option<u32>, AppError> = Err(AppError::Internal("boom".to_string()));
        assert_eq!(or_empty("location", Uuid::nil(), missing), None);

        let loaded: Result<Vec<u32>, AppError> = Ok(vec![1, 2]);
        assert_eq!(or_empty("bookings", Uuid::nil(), loaded), vec![1, 2]);
    }
}

use serde::Serialize;

use crate::dto::damage_report_dto::DamageReportResponse;
use crate::dto::vehicle_dto::VehicleResponse;
use crate::models::catalog::{Location, ModelDetails};
use crate::services::timeline_service::{AlertEntry, ScheduleEvent};

// Response del detalle agregado de un vehículo
#[derive(Debug, Serialize)]
pub struct VehicleDetailResponse {
    #[serde(flatten)]
    pub vehicle: VehicleResponse,
    pub model_details: Option<ModelDetails>,
    pub current_location: Option<Location>,
    pub schedule_events: Vec<ScheduleEvent>,
    pub alerts_and_health: Vec<AlertEntry>,
    pub damage_reports_listing: Vec<DamageReportResponse>,
}

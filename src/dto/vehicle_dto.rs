use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::serde_helpers::deserialize_present;
use crate::utils::validation::{validate_license_plate, validate_vin};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    pub vehicle_model_id: Uuid,

    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,

    #[validate(custom = "validate_vin")]
    pub vin: String,

    pub status: Option<VehicleStatus>,

    #[validate(range(min = 0))]
    pub mileage: Option<i32>,

    pub acquisition_date: NaiveDate,

    pub current_location_id: Option<Uuid>,
}

// Request para actualizar un vehículo (parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    pub vehicle_model_id: Option<Uuid>,

    #[validate(custom = "validate_license_plate")]
    pub license_plate: Option<String>,

    #[validate(custom = "validate_vin")]
    pub vin: Option<String>,

    pub status: Option<VehicleStatus>,

    #[validate(range(min = 0))]
    pub mileage: Option<i32>,

    pub acquisition_date: Option<NaiveDate>,

    /// `null` desasigna la ubicación; ausente la conserva
    #[serde(default, deserialize_with = "deserialize_present")]
    pub current_location_id: Option<Option<Uuid>>,
}

// Filtros del listado
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub vehicle_model_id: Uuid,
    pub license_plate: String,
    pub vin: String,
    pub status: VehicleStatus,
    pub mileage: i32,
    pub acquisition_date: NaiveDate,
    pub current_location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            vehicle_model_id: vehicle.vehicle_model_id,
            license_plate: vehicle.license_plate,
            vin: vehicle.vin,
            status: vehicle.status,
            mileage: vehicle.mileage,
            acquisition_date: vehicle.acquisition_date,
            current_location_id: vehicle.current_location_id,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

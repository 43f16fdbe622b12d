//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y su estado.
//! Mapea exactamente a la tabla `vehicles` con primary key 'id'.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status.
/// Es un campo manual: no se deriva del calendario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Unavailable,
    Retired,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
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

//! Modelo de OperationalHold
//!
//! Ventanas de indisponibilidad del vehículo que no son alquileres
//! (mantenimiento, limpieza, inspección, traslado...).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::maintenance_record::MaintenanceRecord;

/// Motivos habituales que ofrece la consola; `reason` sigue siendo texto libre
pub const CONVENTIONAL_HOLD_REASONS: [&str; 6] = [
    "Maintenance",
    "Inspection",
    "Cleaning",
    "Temporary Unavailability",
    "Relocation",
    "Other",
];

/// OperationalHold principal - mapea a la tabla operational_holds
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OperationalHold {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Retención junto con su ficha de mantenimiento (0 o 1)
#[derive(Debug, Clone)]
pub struct HoldWithMaintenance {
    pub hold: OperationalHold,
    pub maintenance_record: Option<MaintenanceRecord>,
}

impl OperationalHold {
    /// `true` cuando el motivo, sin espacios y en minúsculas, es "cleaning"
    pub fn is_cleaning(&self) -> bool {
        self.reason.trim().eq_ignore_ascii_case("cleaning")
    }
}

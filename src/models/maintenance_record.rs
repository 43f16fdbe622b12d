//! Modelo de MaintenanceRecord
//!
//! Detalle de mantenimiento propiedad de una única retención operativa.
//! Nunca existe sin su retención.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub operational_hold_id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Atributos de mantenimiento normalizados, listos para escribir
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceInput {
    pub description: String,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

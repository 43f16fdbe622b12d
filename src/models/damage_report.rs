//! Modelo de DamageReport
//!
//! Incidencias de daños ligadas a una reserva, con sus imágenes adjuntas.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

/// Estado del informe - mapea al ENUM damage_report_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "damage_report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DamageReportStatus {
    PendingAssessment,
    UnderAssessment,
    AssessmentComplete,
    RepairInProgress,
    ResolvedPaid,
    ResolvedNoCost,
    Closed,
}

impl std::str::FromStr for DamageReportStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending_assessment" => Ok(Self::PendingAssessment),
            "under_assessment" => Ok(Self::UnderAssessment),
            "assessment_complete" => Ok(Self::AssessmentComplete),
            "repair_in_progress" => Ok(Self::RepairInProgress),
            "resolved_paid" => Ok(Self::ResolvedPaid),
            "resolved_no_cost" => Ok(Self::ResolvedNoCost),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown damage report status '{}'", other)),
        }
    }
}

/// DamageReport principal - mapea a la tabla damage_reports
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DamageReport {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reported_by_user_id: Uuid,
    pub reported_at: Option<DateTime<Utc>>,
    pub description: String,
    pub status: DamageReportStatus,
    pub repair_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Imagen adjunta - mapea a damage_report_images
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DamageReportImage {
    pub id: Uuid,
    pub damage_report_id: Uuid,
    pub url: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Informe con sus imágenes ordenadas por `uploaded_at`
#[derive(Debug, Clone)]
pub struct DamageReportWithImages {
    pub report: DamageReport,
    pub images: Vec<DamageReportImage>,
}

/// Imagen ya guardada en el almacenamiento, pendiente de registrar
#[derive(Debug, Clone, PartialEq)]
pub struct NewDamageReportImage {
    pub url: String,
    pub storage_key: String,
    pub caption: Option<String>,
}

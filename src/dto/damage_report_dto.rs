//! DTOs de informes de daños
//!
//! Los formularios llegan como multipart; el handler vuelca los campos en
//! `DamageReportForm` y aquí se convierten a tipos con validación por campo.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::damage_report::{DamageReport, DamageReportImage, DamageReportStatus, DamageReportWithImages};
use crate::utils::errors::{field_error, AppError};
use crate::utils::validation::{parse_admin_datetime, validate_non_negative};

const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Fichero recibido en `images[]`
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Campos de texto y ficheros tal y como llegan del multipart
#[derive(Debug, Clone, Default)]
pub struct DamageReportForm {
    pub fields: HashMap<String, String>,
    pub image_ids_to_delete: Vec<String>,
    pub captions: Vec<String>,
    pub images: Vec<UploadedImage>,
}

/// Alta validada
#[derive(Debug, Clone, PartialEq)]
pub struct NewDamageReport {
    pub booking_id: Uuid,
    pub reported_by_user_id: Uuid,
    pub reported_at: Option<DateTime<Utc>>,
    pub description: String,
    pub status: DamageReportStatus,
    pub repair_cost: Option<Decimal>,
}

/// Cambios validados; `None` conserva el valor actual
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageReportChanges {
    pub booking_id: Option<Uuid>,
    pub reported_by_user_id: Option<Uuid>,
    pub reported_at: Option<Option<DateTime<Utc>>>,
    pub description: Option<String>,
    pub status: Option<DamageReportStatus>,
    pub repair_cost: Option<Option<Decimal>>,
    pub image_ids_to_delete: Vec<Uuid>,
}

impl DamageReportChanges {
    pub fn apply_to(&self, current: &DamageReport) -> NewDamageReport {
        NewDamageReport {
            booking_id: self.booking_id.unwrap_or(current.booking_id),
            reported_by_user_id: self.reported_by_user_id.unwrap_or(current.reported_by_user_id),
            reported_at: self.reported_at.unwrap_or(current.reported_at),
            description: self.description.clone().unwrap_or_else(|| current.description.clone()),
            status: self.status.unwrap_or(current.status),
            repair_cost: self.repair_cost.unwrap_or(current.repair_cost),
        }
    }
}

/// Acumula errores por campo para devolverlos todos a la vez
#[derive(Default)]
struct FieldErrors(validator::ValidationErrors);

impl FieldErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.add(field, field_error(message));
    }

    fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

impl DamageReportForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    fn uuid_field(&self, name: &'static str, errors: &mut FieldErrors) -> Option<Uuid> {
        let raw = self.text(name).filter(|v| !v.is_empty())?;
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(name, format!("{} must be a valid UUID", name));
                None
            }
        }
    }

    /// Campo presente: `Some(None)` si vino vacío
    fn reported_at(&self, errors: &mut FieldErrors) -> Option<Option<DateTime<Utc>>> {
        let raw = self.text("reported_at")?;
        if raw.is_empty() {
            return Some(None);
        }
        match parse_admin_datetime(raw) {
            Ok(value) => Some(Some(value)),
            Err(_) => {
                errors.add("reported_at", "reported_at must use the YYYY-MM-DD HH:MM:SS format");
                None
            }
        }
    }

    fn repair_cost(&self, errors: &mut FieldErrors) -> Option<Option<Decimal>> {
        let raw = self.text("repair_cost")?;
        if raw.is_empty() {
            return Some(None);
        }
        match Decimal::from_str(raw) {
            Ok(cost) if validate_non_negative(cost).is_ok() => Some(Some(cost)),
            Ok(_) => {
                errors.add("repair_cost", "repair_cost must be zero or greater");
                None
            }
            Err(_) => {
                errors.add("repair_cost", "repair_cost must be a number");
                None
            }
        }
    }

    fn status(&self, errors: &mut FieldErrors) -> Option<DamageReportStatus> {
        let raw = self.text("status").filter(|v| !v.is_empty())?;
        match DamageReportStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(message) => {
                errors.add("status", message);
                None
            }
        }
    }

    fn description(&self, errors: &mut FieldErrors) -> Option<String> {
        let raw = self.text("description")?;
        if raw.is_empty() {
            errors.add("description", "description must not be blank");
            return None;
        }
        if raw.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.add("description", format!("description must be at most {} characters", DESCRIPTION_MAX_CHARS));
            return None;
        }
        Some(raw.to_string())
    }

    /// Validación del alta: todos los errores de campo a la vez
    pub fn parse_create(&self) -> Result<NewDamageReport, AppError> {
        let mut errors = FieldErrors::default();

        let booking_id = self.uuid_field("booking_id", &mut errors);
        let reported_by_user_id = self.uuid_field("reported_by_user_id", &mut errors);
        let reported_at = self.reported_at(&mut errors).flatten();
        let description = self.description(&mut errors);
        let status = self.status(&mut errors).unwrap_or(DamageReportStatus::PendingAssessment);
        let repair_cost = self.repair_cost(&mut errors).flatten();

        if booking_id.is_none() && self.text("booking_id").map_or(true, str::is_empty) {
            errors.add("booking_id", "booking_id is required");
        }
        if reported_by_user_id.is_none() && self.text("reported_by_user_id").map_or(true, str::is_empty) {
            errors.add("reported_by_user_id", "reported_by_user_id is required");
        }
        if description.is_none() && self.text("description").is_none() {
            errors.add("description", "description is required");
        }

        errors.finish()?;

        match (booking_id, reported_by_user_id, description) {
            (Some(booking_id), Some(reported_by_user_id), Some(description)) => Ok(NewDamageReport {
                booking_id,
                reported_by_user_id,
                reported_at,
                description,
                status,
                repair_cost,
            }),
            _ => Err(AppError::Internal("damage report form passed validation with missing fields".to_string())),
        }
    }

    /// Validación de la edición
    pub fn parse_update(&self) -> Result<DamageReportChanges, AppError> {
        let mut errors = FieldErrors::default();

        let changes = DamageReportChanges {
            booking_id: self.uuid_field("booking_id", &mut errors),
            reported_by_user_id: self.uuid_field("reported_by_user_id", &mut errors),
            reported_at: self.reported_at(&mut errors),
            description: self.description(&mut errors),
            status: self.status(&mut errors),
            repair_cost: self.repair_cost(&mut errors),
            image_ids_to_delete: self
                .image_ids_to_delete
                .iter()
                .filter_map(|raw| match Uuid::parse_str(raw.trim()) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        errors.add("image_ids_to_delete", format!("'{}' is not a valid image id", raw));
                        None
                    }
                })
                .collect(),
        };

        errors.finish()?;
        Ok(changes)
    }

    /// Pie de foto para la imagen en la posición `index`
    pub fn caption_for(&self, index: usize) -> Option<String> {
        self.captions
            .get(index)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

// Filtros del listado
#[derive(Debug, Default, Deserialize)]
pub struct DamageReportFilters {
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DamageReportImageResponse {
    pub id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DamageReportImage> for DamageReportImageResponse {
    fn from(image: DamageReportImage) -> Self {
        Self {
            id: image.id,
            url: image.url,
            caption: image.caption,
            uploaded_at: image.uploaded_at,
        }
    }
}

// Response de informe de daños
#[derive(Debug, Serialize)]
pub struct DamageReportResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reported_by_user_id: Uuid,
    pub reported_at: Option<DateTime<Utc>>,
    pub description: String,
    pub status: DamageReportStatus,
    pub repair_cost: Option<Decimal>,
    pub images: Vec<DamageReportImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DamageReportWithImages> for DamageReportResponse {
    fn from(entry: DamageReportWithImages) -> Self {
        let DamageReportWithImages { report, images } = entry;

        Self {
            id: report.id,
            booking_id: report.booking_id,
            reported_by_user_id: report.reported_by_user_id,
            reported_at: report.reported_at,
            description: report.description,
            status: report.status,
            repair_cost: report.repair_cost,
            images: images.into_iter().map(DamageReportImageResponse::from).collect(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del back office
//! y su conversión a respuestas HTTP apropiadas.

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrorsKind;

use crate::services::media_storage::StorageError;

/// Código SQLSTATE de Postgres para violación de restricción UNIQUE
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Código SQLSTATE de Postgres para violación de clave foránea
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable state: {0}")]
    UnprocessableState(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl AppError {
    /// Status HTTP asociado a cada variante
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::UnprocessableState(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    code: "DB_ERROR".to_string(),
                }
            }

            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(field_messages(&e))),
                    code: "VALIDATION_ERROR".to_string(),
                }
            }

            AppError::NotFound(msg) => {
                tracing::warn!("Resource not found: {}", msg);
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: "NOT_FOUND".to_string(),
                }
            }

            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: "CONFLICT".to_string(),
                }
            }

            AppError::UnprocessableState(msg) => {
                tracing::warn!("Invalid state transition: {}", msg);
                ErrorResponse {
                    error: "Unprocessable State".to_string(),
                    message: msg,
                    details: None,
                    code: "INVALID_STATE".to_string(),
                }
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: "BAD_REQUEST".to_string(),
                }
            }

            AppError::Storage(e) => {
                tracing::error!("❌ Storage error: {}", e);
                ErrorResponse {
                    error: "Storage Error".to_string(),
                    message: "An error occurred while storing uploaded files".to_string(),
                    details: None,
                    code: "STORAGE_ERROR".to_string(),
                }
            }

            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                    code: "INTERNAL_ERROR".to_string(),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Aplana `ValidationErrors` a un mapa campo -> mensajes legibles.
/// Los errores anidados usan rutas con punto (`maintenance_record_attributes.cost`, `extras[0].quantity`).
pub fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut messages = BTreeMap::new();
    collect_field_messages(errors, None, &mut messages);
    messages
}

fn collect_field_messages(
    errors: &validator::ValidationErrors,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                let entry = out.entry(path.clone()).or_default();
                entry.extend(errs.iter().map(|err| {
                    err.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", path, err.code))
                }));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_field_messages(nested, Some(path.as_str()), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_messages(nested, Some(format!("{}[{}]", path, index).as_str()), out);
                }
            }
        }
    }
}

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: impl Into<String>) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, field_error(message));
    AppError::Validation(errors)
}

/// Construye un `ValidationError` con mensaje legible
pub fn field_error(message: impl Into<String>) -> validator::ValidationError {
    let mut error = validator::ValidationError::new("custom");
    error.message = Some(Cow::Owned(message.into()));
    error
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Traduce violaciones UNIQUE de Postgres a `Conflict`, el resto queda como error de base de datos
pub fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    let is_unique = error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == PG_UNIQUE_VIOLATION)
        .unwrap_or(false);

    if is_unique {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(error)
    }
}

/// Campo cuya FK falló, a partir del nombre de restricción por defecto de Postgres
/// (`<tabla>_<columna>_fkey`). `None` si no es una violación de FK.
pub fn violated_reference(
    code: Option<&str>,
    constraint: Option<&str>,
    fields: &[&'static str],
) -> Option<&'static str> {
    if code != Some(PG_FOREIGN_KEY_VIOLATION) {
        return None;
    }

    let constraint = constraint.unwrap_or_default();
    fields
        .iter()
        .copied()
        .find(|field| constraint.ends_with(&format!("_{}_fkey", field)))
        .or_else(|| fields.first().copied())
}

/// Traduce violaciones de FK a un error de validación sobre el campo referenciado
pub fn map_foreign_key_violation(error: sqlx::Error, fields: &[&'static str]) -> AppError {
    let field = error.as_database_error().and_then(|db| {
        let code = db.code();
        violated_reference(code.as_deref(), db.constraint(), fields)
    });

    match field {
        Some(field) => validation_error(field, format!("{} references a record that does not exist", field)),
        None => AppError::Database(error),
    }
}

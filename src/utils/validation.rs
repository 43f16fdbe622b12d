//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos que el derive de `validator` no cubre.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppError};

/// Formato de fecha/hora que usa la consola de administración (`YYYY-MM-DD HH:MM:SS`)
pub const ADMIN_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validar y convertir `YYYY-MM-DD HH:MM:SS` (hora UTC) a datetime.
/// También acepta RFC3339 porque el storefront envía ese formato.
pub fn parse_admin_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, ADMIN_DATETIME_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"YYYY-MM-DD HH:MM:SS".to_string());
            error.message = Some("must use the YYYY-MM-DD HH:MM:SS format".into());
            error
        })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        error.message = Some("must be zero or greater".into());
        return Err(error);
    }
    Ok(())
}

/// Adaptador para `#[validate(custom = ...)]` sobre importes
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.len() < 2 || clean_plate.len() > 12 || !clean_plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        error.message = Some("is not a valid license plate".into());
        return Err(error);
    }
    Ok(())
}

/// Validar VIN: 17 caracteres alfanuméricos sin I, O ni Q
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 17
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c.to_ascii_uppercase(), 'I' | 'O' | 'Q'));

    if !valid {
        let mut error = ValidationError::new("vin");
        error.add_param("value".into(), &value.to_string());
        error.message = Some("must be 17 characters without I, O or Q".into());
        return Err(error);
    }
    Ok(())
}

/// Comprueba que `end` sea estrictamente posterior a `start`
pub fn ensure_chronological(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    end_field: &'static str,
) -> Result<(), AppError> {
    if end <= start {
        return Err(validation_error(
            end_field,
            format!("{} must be after start_date", end_field),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_datetime() {
        let parsed = parse_admin_datetime("2024-01-11 09:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 11, 9, 30, 0).unwrap());

        let rfc = parse_admin_datetime("2024-01-11T09:30:00Z").unwrap();
        assert_eq!(rfc, parsed);

        assert!(parse_admin_datetime("11/01/2024").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("Oil change").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(12050, 2)).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("AB-123-CD").is_ok());
        assert!(validate_license_plate("A").is_err());
        assert!(validate_license_plate("AB#123").is_err());
    }

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1HGCM82633A004352").is_ok());
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A00435O").is_err());
    }

    #[test]
    fn test_ensure_chronological() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
        assert!(ensure_chronological(start, end, "end_date").is_ok());
        assert!(ensure_chronological(end, start, "end_date").is_err());
        assert!(ensure_chronological(start, start, "end_date").is_err());
    }
}

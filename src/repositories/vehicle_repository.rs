use sqlx::PgPool;
use uuid::Uuid;
use chrono::Utc;
use tracing::info;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters};
use crate::models::booking::BookingStatus;
use crate::models::catalog::Location;
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::{map_foreign_key_violation, map_unique_violation, not_found_error, AppError};

const VEHICLE_COLUMNS: &str = "id, vehicle_model_id, license_plate, vin, status, mileage, acquisition_date, current_location_id, created_at, updated_at";

const DUPLICATED_VEHICLE: &str = "A vehicle with this license plate or VIN already exists";

const VEHICLE_REFERENCES: &[&str] = &["vehicle_model_id", "current_location_id"];

/// Matrícula/VIN duplicados -> 409, modelo o ubicación inexistentes -> 422
fn map_write_error(error: sqlx::Error) -> AppError {
    match map_foreign_key_violation(error, VEHICLE_REFERENCES) {
        AppError::Database(error) => map_unique_violation(error, DUPLICATED_VEHICLE),
        mapped => mapped,
    }
}

/// Lista SQL de estados abiertos (`'a', 'b', ...`)
fn open_statuses_sql() -> String {
    BookingStatus::OPEN
        .iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE ($1::vehicle_status IS NULL OR status = $1) ORDER BY created_at DESC",
            VEHICLE_COLUMNS
        ))
        .bind(filters.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn create(&self, request: &CreateVehicleRequest) -> Result<Vehicle, AppError> {
        let now = Utc::now();

        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (id, vehicle_model_id, license_plate, vin, status, mileage, acquisition_date, current_location_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(request.vehicle_model_id)
        .bind(request.license_plate.trim())
        .bind(request.vin.trim().to_uppercase())
        .bind(request.status.unwrap_or(VehicleStatus::Available))
        .bind(request.mileage.unwrap_or(0))
        .bind(request.acquisition_date)
        .bind(request.current_location_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        info!("🚗 Vehículo creado: {} ({})", vehicle.license_plate, vehicle.id);
        Ok(vehicle)
    }

    pub async fn update(&self, id: Uuid, request: &UpdateVehicleRequest) -> Result<Vehicle, AppError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;

        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles
            SET vehicle_model_id = $2, license_plate = $3, vin = $4, status = $5, mileage = $6,
                acquisition_date = $7, current_location_id = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .bind(request.vehicle_model_id.unwrap_or(current.vehicle_model_id))
        .bind(
            request
                .license_plate
                .as_deref()
                .map(|plate| plate.trim().to_string())
                .unwrap_or(current.license_plate),
        )
        .bind(
            request
                .vin
                .as_deref()
                .map(|vin| vin.trim().to_uppercase())
                .unwrap_or(current.vin),
        )
        .bind(request.status.unwrap_or(current.status))
        .bind(request.mileage.unwrap_or(current.mileage))
        .bind(request.acquisition_date.unwrap_or(current.acquisition_date))
        .bind(request.current_location_id.unwrap_or(current.current_location_id))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(vehicle)
    }

    /// Reservas pendientes, confirmadas o activas
    pub async fn has_open_bookings(&self, id: Uuid) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE vehicle_id = $1 AND status IN ({}))",
            open_statuses_sql()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Borra el vehículo con todo su historial en una transacción.
    /// Devuelve las claves de las imágenes de daños, que se borran tras el commit.
    pub async fn delete_with_history(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let image_keys: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT i.storage_key
            FROM damage_report_images i
            JOIN damage_reports d ON d.id = i.damage_report_id
            JOIN bookings b ON b.id = d.booking_id
            WHERE b.vehicle_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM maintenance_records WHERE vehicle_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM operational_holds WHERE vehicle_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM damage_reports WHERE booking_id IN (SELECT id FROM bookings WHERE vehicle_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bookings WHERE vehicle_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found_error("Vehicle", id));
        }

        tx.commit().await?;
        info!("🗑️ Vehículo {} eliminado junto con su historial", id);

        Ok(image_keys.into_iter().map(|(key,)| key).collect())
    }

    pub async fn find_location(&self, location_id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, address_line, city, country FROM locations WHERE id = $1",
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }
}

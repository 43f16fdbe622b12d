use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use chrono::Utc;
use tracing::{debug, info};

use crate::dto::operational_hold_dto::{CreateOperationalHoldRequest, OperationalHoldFilters, UpdateOperationalHoldRequest};
use crate::models::maintenance_record::{MaintenanceInput, MaintenanceRecord};
use crate::models::operational_hold::{HoldWithMaintenance, OperationalHold};
use crate::services::maintenance_sync_service::{plan_on_create, plan_on_update, MaintenanceSync};
use crate::utils::errors::{map_foreign_key_violation, not_found_error, AppError};
use crate::utils::validation::ensure_chronological;

const HOLD_COLUMNS: &str = "id, vehicle_id, booking_id, created_by_user_id, start_date, end_date, reason, notes, created_at, updated_at";

const HOLD_REFERENCES: &[&str] = &["vehicle_id", "booking_id"];

const RECORD_COLUMNS: &str = "id, operational_hold_id, vehicle_id, description, cost, notes, created_at, updated_at";

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub struct OperationalHoldRepository {
    pool: PgPool,
}

impl OperationalHoldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filters: &OperationalHoldFilters) -> Result<Vec<HoldWithMaintenance>, AppError> {
        let holds = sqlx::query_as::<_, OperationalHold>(&format!(
            "SELECT {} FROM operational_holds WHERE ($1::uuid IS NULL OR vehicle_id = $1) ORDER BY start_date DESC",
            HOLD_COLUMNS
        ))
        .bind(filters.vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_records(holds).await
    }

    /// Todas las retenciones de un vehículo, sin paginar
    pub async fn find_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<HoldWithMaintenance>, AppError> {
        self.list(&OperationalHoldFilters { vehicle_id: Some(vehicle_id) }).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<HoldWithMaintenance>, AppError> {
        let hold = sqlx::query_as::<_, OperationalHold>(&format!(
            "SELECT {} FROM operational_holds WHERE id = $1",
            HOLD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(hold) = hold else {
            return Ok(None);
        };

        Ok(self.attach_records(vec![hold]).await?.pop())
    }

    async fn attach_records(&self, holds: Vec<OperationalHold>) -> Result<Vec<HoldWithMaintenance>, AppError> {
        if holds.is_empty() {
            return Ok(Vec::new());
        }

        let hold_ids: Vec<Uuid> = holds.iter().map(|hold| hold.id).collect();
        let records = sqlx::query_as::<_, MaintenanceRecord>(&format!(
            "SELECT {} FROM maintenance_records WHERE operational_hold_id = ANY($1)",
            RECORD_COLUMNS
        ))
        .bind(&hold_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_hold: HashMap<Uuid, MaintenanceRecord> = records
            .into_iter()
            .map(|record| (record.operational_hold_id, record))
            .collect();

        Ok(holds
            .into_iter()
            .map(|hold| HoldWithMaintenance {
                maintenance_record: by_hold.remove(&hold.id),
                hold,
            })
            .collect())
    }

    /// Crea la retención y, si procede, su ficha de mantenimiento
    pub async fn create_with_maintenance(&self, request: &CreateOperationalHoldRequest) -> Result<Uuid, AppError> {
        let plan = plan_on_create(&request.maintenance_intent());
        let hold_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO operational_holds (id, vehicle_id, booking_id, created_by_user_id, start_date, end_date, reason, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(hold_id)
        .bind(request.vehicle_id)
        .bind(request.booking_id)
        .bind(request.created_by_user_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.reason.trim())
        .bind(trimmed(request.notes.as_deref()))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, HOLD_REFERENCES))?;

        apply_sync(&mut tx, hold_id, request.vehicle_id, &plan).await?;

        tx.commit().await?;
        info!("🔧 Retención {} creada para el vehículo {}", hold_id, request.vehicle_id);

        Ok(hold_id)
    }

    /// Actualiza la retención y sincroniza su ficha en la misma transacción.
    /// El rango de fechas se valida sobre los valores ya combinados.
    pub async fn update_with_maintenance(
        &self,
        id: Uuid,
        request: &UpdateOperationalHoldRequest,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, OperationalHold>(&format!(
            "SELECT {} FROM operational_holds WHERE id = $1 FOR UPDATE",
            HOLD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found_error("Operational hold", id))?;

        let start_date = request.start_date.unwrap_or(current.start_date);
        let end_date = request.end_date.unwrap_or(current.end_date);
        ensure_chronological(start_date, end_date, "end_date")?;

        let vehicle_id = request.vehicle_id.unwrap_or(current.vehicle_id);
        let notes = match &request.notes {
            Some(notes) => trimmed(notes.as_deref()),
            None => current.notes,
        };

        let current_record = sqlx::query_as::<_, MaintenanceRecord>(&format!(
            "SELECT {} FROM maintenance_records WHERE operational_hold_id = $1 FOR UPDATE",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let plan = plan_on_update(&request.maintenance_intent(), current_record.as_ref());
        debug!("🔧 Sincronización de mantenimiento para {}: {:?}", id, plan);

        sqlx::query(
            r#"
            UPDATE operational_holds
            SET vehicle_id = $2, booking_id = $3, start_date = $4, end_date = $5, reason = $6, notes = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(vehicle_id)
        .bind(request.booking_id.unwrap_or(current.booking_id))
        .bind(start_date)
        .bind(end_date)
        .bind(
            request
                .reason
                .as_deref()
                .map(|reason| reason.trim().to_string())
                .unwrap_or(current.reason),
        )
        .bind(notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, HOLD_REFERENCES))?;

        apply_sync(&mut tx, id, vehicle_id, &plan).await?;

        // La ficha sigue al vehículo de su retención
        if vehicle_id != current.vehicle_id {
            sqlx::query("UPDATE maintenance_records SET vehicle_id = $2 WHERE operational_hold_id = $1")
                .bind(id)
                .bind(vehicle_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Borra la ficha (si hay) y después la retención
    pub async fn delete_cascade(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM maintenance_records WHERE operational_hold_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM operational_holds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found_error("Operational hold", id));
        }

        tx.commit().await?;
        info!("🗑️ Retención {} eliminada", id);
        Ok(())
    }
}

async fn insert_record(
    conn: &mut PgConnection,
    hold_id: Uuid,
    vehicle_id: Uuid,
    input: &MaintenanceInput,
) -> Result<(), AppError> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO maintenance_records (id, operational_hold_id, vehicle_id, description, cost, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(hold_id)
    .bind(vehicle_id)
    .bind(&input.description)
    .bind(input.cost)
    .bind(&input.notes)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

async fn delete_record(conn: &mut PgConnection, record_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM maintenance_records WHERE id = $1")
        .bind(record_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Aplica la decisión del planificador dentro de la transacción abierta
async fn apply_sync(
    conn: &mut PgConnection,
    hold_id: Uuid,
    vehicle_id: Uuid,
    plan: &MaintenanceSync,
) -> Result<(), AppError> {
    match plan {
        MaintenanceSync::Unchanged => {}
        MaintenanceSync::Create(input) => {
            insert_record(conn, hold_id, vehicle_id, input).await?;
        }
        MaintenanceSync::UpdateInPlace { record_id, input } => {
            sqlx::query(
                "UPDATE maintenance_records SET description = $2, cost = $3, notes = $4, updated_at = $5 WHERE id = $1",
            )
            .bind(record_id)
            .bind(&input.description)
            .bind(input.cost)
            .bind(&input.notes)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;
        }
        MaintenanceSync::Replace { stale_record_id, input } => {
            if let Some(stale) = stale_record_id {
                delete_record(&mut *conn, *stale).await?;
            }
            insert_record(conn, hold_id, vehicle_id, input).await?;
        }
        MaintenanceSync::Revoke { record_id } => {
            delete_record(conn, *record_id).await?;
        }
    }

    Ok(())
}

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use chrono::Utc;
use tracing::info;

use crate::dto::damage_report_dto::{DamageReportFilters, NewDamageReport};
use crate::models::damage_report::{DamageReport, DamageReportImage, DamageReportWithImages, NewDamageReportImage};
use crate::utils::errors::{map_foreign_key_violation, not_found_error, AppError};

const REPORT_COLUMNS: &str = "id, booking_id, reported_by_user_id, reported_at, description, status, repair_cost, created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, damage_report_id, url, storage_key, caption, uploaded_at";

const DAMAGE_REPORT_REFERENCES: &[&str] = &["booking_id"];

pub struct DamageReportRepository {
    pool: PgPool,
}

impl DamageReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filters: &DamageReportFilters) -> Result<Vec<DamageReportWithImages>, AppError> {
        let reports = sqlx::query_as::<_, DamageReport>(&format!(
            "SELECT {} FROM damage_reports WHERE ($1::uuid IS NULL OR booking_id = $1) ORDER BY created_at DESC",
            REPORT_COLUMNS
        ))
        .bind(filters.booking_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_images(reports).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DamageReportWithImages>, AppError> {
        let report = sqlx::query_as::<_, DamageReport>(&format!(
            "SELECT {} FROM damage_reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(report) = report else {
            return Ok(None);
        };

        Ok(self.attach_images(vec![report]).await?.pop())
    }

    /// Informes de todas las reservas de un vehículo, con sus imágenes
    pub async fn find_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<DamageReportWithImages>, AppError> {
        let reports = sqlx::query_as::<_, DamageReport>(&format!(
            r#"
            SELECT {} FROM damage_reports
            WHERE booking_id IN (SELECT id FROM bookings WHERE vehicle_id = $1)
            ORDER BY reported_at DESC NULLS LAST, created_at DESC
            "#,
            REPORT_COLUMNS
        ))
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_images(reports).await
    }

    async fn attach_images(&self, reports: Vec<DamageReport>) -> Result<Vec<DamageReportWithImages>, AppError> {
        if reports.is_empty() {
            return Ok(Vec::new());
        }

        let report_ids: Vec<Uuid> = reports.iter().map(|report| report.id).collect();
        let images = sqlx::query_as::<_, DamageReportImage>(&format!(
            "SELECT {} FROM damage_report_images WHERE damage_report_id = ANY($1) ORDER BY uploaded_at, id",
            IMAGE_COLUMNS
        ))
        .bind(&report_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_report: HashMap<Uuid, Vec<DamageReportImage>> = HashMap::new();
        for image in images {
            by_report.entry(image.damage_report_id).or_default().push(image);
        }

        Ok(reports
            .into_iter()
            .map(|report| DamageReportWithImages {
                images: by_report.remove(&report.id).unwrap_or_default(),
                report,
            })
            .collect())
    }

    pub async fn create(&self, report: &NewDamageReport, images: &[NewDamageReportImage]) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO damage_reports (id, booking_id, reported_by_user_id, reported_at, description, status, repair_cost, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(report.booking_id)
        .bind(report.reported_by_user_id)
        .bind(report.reported_at)
        .bind(&report.description)
        .bind(report.status)
        .bind(report.repair_cost)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, DAMAGE_REPORT_REFERENCES))?;

        insert_images(&mut tx, id, images).await?;

        tx.commit().await?;
        info!("📸 Informe de daños {} creado con {} imágenes", id, images.len());

        Ok(id)
    }

    /// Actualiza el informe, añade imágenes y desvincula las indicadas.
    /// Devuelve las claves de las imágenes desvinculadas.
    pub async fn update(
        &self,
        id: Uuid,
        report: &NewDamageReport,
        new_images: &[NewDamageReportImage],
        image_ids_to_delete: &[Uuid],
    ) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE damage_reports
            SET booking_id = $2, reported_by_user_id = $3, reported_at = $4, description = $5,
                status = $6, repair_cost = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(report.booking_id)
        .bind(report.reported_by_user_id)
        .bind(report.reported_at)
        .bind(&report.description)
        .bind(report.status)
        .bind(report.repair_cost)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, DAMAGE_REPORT_REFERENCES))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found_error("Damage report", id));
        }

        // Solo imágenes de este informe
        let detached: Vec<(String,)> = if image_ids_to_delete.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as(
                "DELETE FROM damage_report_images WHERE damage_report_id = $1 AND id = ANY($2) RETURNING storage_key",
            )
            .bind(id)
            .bind(image_ids_to_delete)
            .fetch_all(&mut *tx)
            .await?
        };

        insert_images(&mut tx, id, new_images).await?;

        tx.commit().await?;
        Ok(detached.into_iter().map(|(key,)| key).collect())
    }

    /// Borra el informe y sus imágenes; devuelve las claves a limpiar
    pub async fn delete(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let keys: Vec<(String,)> =
            sqlx::query_as("DELETE FROM damage_report_images WHERE damage_report_id = $1 RETURNING storage_key")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM damage_reports WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found_error("Damage report", id));
        }

        tx.commit().await?;
        Ok(keys.into_iter().map(|(key,)| key).collect())
    }
}

async fn insert_images(
    conn: &mut PgConnection,
    damage_report_id: Uuid,
    images: &[NewDamageReportImage],
) -> Result<(), AppError> {
    for image in images {
        sqlx::query(
            r#"
            INSERT INTO damage_report_images (id, damage_report_id, url, storage_key, caption, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(damage_report_id)
        .bind(&image.url)
        .bind(&image.storage_key)
        .bind(&image.caption)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

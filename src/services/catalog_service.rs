//! Acceso al catálogo de modelos (colaborador externo)
//!
//! El catálogo (modelos, características, extras y media) lo gestiona
//! otro subsistema. Este servicio solo consume su contrato de lectura.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::catalog::{CatalogExtra, ModelDetails, ModelMedia, VehicleModel};
use crate::utils::errors::AppError;

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Modelo con sus características, extras y media
    async fn model_details(&self, model_id: Uuid) -> Result<Option<ModelDetails>, AppError>;

    /// Extras por id, con el precio vigente
    async fn extras_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CatalogExtra>, AppError>;
}

/// Implementación sobre las tablas de catálogo en PostgreSQL
pub struct PgCatalogProvider {
    pool: PgPool,
}

impl PgCatalogProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogProvider for PgCatalogProvider {
    async fn model_details(&self, model_id: Uuid) -> Result<Option<ModelDetails>, AppError> {
        let model = sqlx::query_as::<_, VehicleModel>(
            "SELECT id, make, name, category, seats, daily_rate FROM vehicle_models WHERE id = $1",
        )
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(model) = model else {
            return Ok(None);
        };

        let features: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM vehicle_model_features WHERE vehicle_model_id = $1 ORDER BY name",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await?;

        let extras = sqlx::query_as::<_, CatalogExtra>(
            r#"
            SELECT e.id, e.name, e.price
            FROM extras e
            JOIN vehicle_model_extras me ON me.extra_id = e.id
            WHERE me.vehicle_model_id = $1
            ORDER BY e.name
            "#,
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await?;

        let media = sqlx::query_as::<_, ModelMedia>(
            "SELECT id, url, is_cover FROM vehicle_model_media WHERE vehicle_model_id = $1 ORDER BY is_cover DESC, position",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ModelDetails {
            model,
            features: features.into_iter().map(|(name,)| name).collect(),
            extras,
            media,
        }))
    }

    async fn extras_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CatalogExtra>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let extras = sqlx::query_as::<_, CatalogExtra>(
            "SELECT id, name, price FROM extras WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(extras)
    }
}

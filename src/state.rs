//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::catalog_service::{CatalogProvider, PgCatalogProvider};
use crate::services::media_storage::{LocalMediaStorage, MediaStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub media: Arc<dyn MediaStorage>,
    pub catalog: Arc<dyn CatalogProvider>,
}

impl AppState {
    /// Estado con los colaboradores por defecto (catálogo en Postgres, media en disco)
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let media = LocalMediaStorage::new(config.media_root.clone(), config.media_base_url.clone());

        Self {
            catalog: Arc::new(PgCatalogProvider::new(pool.clone())),
            media: Arc::new(media),
            pool,
            config,
        }
    }
}

//! Conexión a PostgreSQL
//! 
//! Este módulo abre el pool de conexiones y aplica las migraciones
//! embebidas del directorio `migrations/`.

use sqlx::PgPool;
use anyhow::Result;
use tracing::info;

use crate::config::DatabaseConfig;

/// Pool de conexiones de la aplicación
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Conectar usando la configuración indicada
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("🔌 Conectando a PostgreSQL en {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("✅ Migraciones aplicadas");
        Ok(())
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(_colon_pos) = url[..at_pos].rfind(':') {
            let protocol = &url[..url.find("://").map(|p| p + 3).unwrap_or(0)];
            let host = &url[at_pos + 1..];
            format!("{}***:***@{}", protocol, host)
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}

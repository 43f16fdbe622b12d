//! Configuración de variables de entorno
//! 
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen un valor por defecto pensado para desarrollo local.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub log_level: tracing::Level,
    pub run_migrations: bool,
    // Almacenamiento de imágenes de daños
    pub media_root: PathBuf,
    pub media_base_url: String,
    pub max_upload_bytes: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            log_level: tracing::Level::DEBUG,
            run_migrations: true,
            media_root: PathBuf::from("./storage/media"),
            media_base_url: "/media".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT").unwrap_or(defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            log_level: parse_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            run_migrations: parse_var("RUN_MIGRATIONS").unwrap_or(defaults.run_migrations),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_base_url: env::var("MEDIA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.media_base_url),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parsea una variable de entorno; valores inválidos se ignoran con un warning
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("⚠️ Valor inválido para {}: '{}', usando valor por defecto", name, raw);
            None
        }
    }
}

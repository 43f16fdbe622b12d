//! Middleware de CORS
//!
//! Orígenes configurables por entorno; en desarrollo se permite cualquiera.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::environment::EnvironmentConfig;

/// Selecciona la política según la configuración
pub fn cors_layer(config: &EnvironmentConfig) -> CorsLayer {
    if config.is_development() && config.cors_origins.is_empty() {
        return CorsLayer::very_permissive();
    }
    cors_middleware_with_origins(&config.cors_origins)
}

/// CORS restringido a una lista de orígenes
pub fn cors_middleware_with_origins(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Origen CORS inválido ignorado: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

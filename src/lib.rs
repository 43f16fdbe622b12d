//! Back office de flota de alquiler
//!
//! API HTTP para vehículos, reservas, retenciones operativas con su ficha de
//! mantenimiento e informes de daños, más el detalle agregado de vehículo
//! (calendario operativo y feed de alertas).

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/vehicles", routes::vehicle_routes::create_vehicle_router())
        .nest("/bookings", routes::booking_routes::create_booking_router())
        .nest(
            "/operational-holds",
            routes::operational_hold_routes::create_operational_hold_router(),
        )
        .nest(
            "/damage-reports",
            routes::damage_report_routes::create_damage_report_router(state.config.max_upload_bytes),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

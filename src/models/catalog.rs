//! Modelos de lectura del catálogo y de ubicaciones
//!
//! Estas tablas las mantienen otros subsistemas; aquí solo se leen.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleModel {
    pub id: Uuid,
    pub make: String,
    pub name: String,
    pub category: Option<String>,
    pub seats: Option<i16>,
    pub daily_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogExtra {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModelMedia {
    pub id: Uuid,
    pub url: String,
    pub is_cover: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Ficha de modelo que se incrusta en el detalle del vehículo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(flatten)]
    pub model: VehicleModel,
    pub features: Vec<String>,
    pub extras: Vec<CatalogExtra>,
    pub media: Vec<ModelMedia>,
}

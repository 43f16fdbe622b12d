use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use crate::models::booking::{BookingExtra, BookingStatus, BookingWithRenter};
use crate::utils::validation::validate_non_negative_amount;

// Línea de extra solicitada
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingExtraRequest {
    pub extra_id: Uuid,

    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
}

// Request para crear una reserva
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[validate(custom = "validate_non_negative_amount")]
    pub base_price: Decimal,

    #[validate(custom = "validate_non_negative_amount")]
    pub insurance_price: Option<Decimal>,

    /// Importe ya calculado por el subsistema de promociones
    #[validate(custom = "validate_non_negative_amount")]
    pub discount_amount: Option<Decimal>,

    #[serde(default)]
    #[validate]
    pub extras: Vec<BookingExtraRequest>,
}

// Filtros del listado
#[derive(Debug, Default, Deserialize)]
pub struct BookingFilters {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize)]
pub struct BookingExtraResponse {
    pub extra_id: Uuid,
    pub name: Option<String>,
    pub quantity: i32,
    pub price_at_booking: Decimal,
}

impl From<BookingExtra> for BookingExtraResponse {
    fn from(extra: BookingExtra) -> Self {
        Self {
            extra_id: extra.extra_id,
            name: extra.extra_name,
            quantity: extra.quantity,
            price_at_booking: extra.price_at_booking,
        }
    }
}

// Response de reserva
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub renter_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub base_price: Decimal,
    pub extras_price: Decimal,
    pub insurance_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub extras: Vec<BookingExtraResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingResponse {
    pub fn new(entry: BookingWithRenter, extras: Vec<BookingExtra>) -> Self {
        let BookingWithRenter { booking, renter_name } = entry;

        Self {
            id: booking.id,
            vehicle_id: booking.vehicle_id,
            renter_id: booking.renter_id,
            renter_name,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: booking.status,
            base_price: booking.base_price,
            extras_price: booking.extras_price,
            insurance_price: booking.insurance_price,
            discount_amount: booking.discount_amount,
            final_price: booking.final_price,
            extras: extras.into_iter().map(BookingExtraResponse::from).collect(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

//! Modelo de Booking
//!
//! Reservas de alquiler, sus líneas de extras y la máquina de estados
//! que gobiernan `confirm` y `complete`.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

use crate::utils::errors::AppError;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingConfirmation,
    Confirmed,
    Active,
    Completed,
    CancelledByUser,
    CancelledByAdmin,
    NoShow,
}

/// Transiciones explícitas expuestas por la API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTransition {
    Confirm,
    Complete,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingConfirmation => "pending_confirmation",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::CancelledByUser => "cancelled_by_user",
            BookingStatus::CancelledByAdmin => "cancelled_by_admin",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Aplica una transición; cualquier otro estado de origen es un error 422
    pub fn transition(self, transition: BookingTransition) -> Result<BookingStatus, AppError> {
        match (self, transition) {
            (BookingStatus::PendingConfirmation, BookingTransition::Confirm) => Ok(BookingStatus::Confirmed),
            (BookingStatus::Active, BookingTransition::Complete) => Ok(BookingStatus::Completed),
            (current, BookingTransition::Confirm) => Err(AppError::UnprocessableState(format!(
                "Only bookings pending confirmation can be confirmed (current status: {})",
                current.as_str()
            ))),
            (current, BookingTransition::Complete) => Err(AppError::UnprocessableState(format!(
                "Only active bookings can be completed (current status: {})",
                current.as_str()
            ))),
        }
    }

    /// Las reservas en curso o terminadas no se pueden borrar
    pub fn is_deletable(&self) -> bool {
        !matches!(self, BookingStatus::Active | BookingStatus::Completed)
    }

    /// Reservas que todavía comprometen el vehículo
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            BookingStatus::PendingConfirmation | BookingStatus::Confirmed | BookingStatus::Active
        )
    }

    pub const OPEN: [BookingStatus; 3] = [
        BookingStatus::PendingConfirmation,
        BookingStatus::Confirmed,
        BookingStatus::Active,
    ];
}

/// Booking principal - mapea a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub base_price: Decimal,
    pub extras_price: Decimal,
    pub insurance_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking con el nombre del arrendatario (LEFT JOIN users)
#[derive(Debug, Clone, FromRow)]
pub struct BookingWithRenter {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub renter_name: Option<String>,
}

/// Línea de extra con el precio congelado al reservar
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingExtra {
    pub booking_id: Uuid,
    pub extra_id: Uuid,
    pub extra_name: Option<String>,
    pub quantity: i32,
    pub price_at_booking: Decimal,
}

/// Desglose monetario de una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub extras_price: Decimal,
    pub insurance_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

impl PriceBreakdown {
    /// `final = max(0, base + extras + insurance - discount)`
    pub fn compute(
        base_price: Decimal,
        line_items: &[(i32, Decimal)],
        insurance_price: Decimal,
        discount_amount: Decimal,
    ) -> Self {
        let extras_price: Decimal = line_items
            .iter()
            .map(|(quantity, price)| Decimal::from(*quantity) * *price)
            .sum();

        let final_price = (base_price + extras_price + insurance_price - discount_amount).max(Decimal::ZERO);

        Self {
            base_price,
            extras_price,
            insurance_price,
            discount_amount,
            final_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_only_from_pending() {
        assert_eq!(
            BookingStatus::PendingConfirmation.transition(BookingTransition::Confirm).unwrap(),
            BookingStatus::Confirmed
        );

        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::CancelledByUser,
            BookingStatus::NoShow,
        ] {
            let err = status.transition(BookingTransition::Confirm).unwrap_err();
            assert!(matches!(err, AppError::UnprocessableState(_)));
        }
    }

    #[test]
    fn test_complete_only_from_active() {
        assert_eq!(
            BookingStatus::Active.transition(BookingTransition::Complete).unwrap(),
            BookingStatus::Completed
        );
        assert!(BookingStatus::Confirmed.transition(BookingTransition::Complete).is_err());
        assert!(BookingStatus::Completed.transition(BookingTransition::Complete).is_err());
    }

    #[test]
    fn test_delete_guard() {
        assert!(!BookingStatus::Active.is_deletable());
        assert!(!BookingStatus::Completed.is_deletable());
        assert!(BookingStatus::PendingConfirmation.is_deletable());
        assert!(BookingStatus::CancelledByAdmin.is_deletable());
    }

    #[test]
    fn test_open_statuses() {
        for status in BookingStatus::OPEN {
            assert!(status.is_open());
        }
        assert!(!BookingStatus::Completed.is_open());
        assert!(!BookingStatus::NoShow.is_open());
    }

    #[test]
    fn test_price_breakdown() {
        let breakdown = PriceBreakdown::compute(
            Decimal::new(10000, 2),
            &[(2, Decimal::new(1550, 2)), (1, Decimal::new(500, 2))],
            Decimal::new(2000, 2),
            Decimal::new(1000, 2),
        );

        assert_eq!(breakdown.extras_price, Decimal::new(3600, 2));
        assert_eq!(breakdown.final_price, Decimal::new(14600, 2));
    }

    #[test]
    fn test_price_breakdown_never_negative() {
        let breakdown = PriceBreakdown::compute(
            Decimal::new(50, 0),
            &[],
            Decimal::ZERO,
            Decimal::new(80, 0),
        );
        assert_eq!(breakdown.final_price, Decimal::ZERO);
    }
}

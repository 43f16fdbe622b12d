use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::dto::booking_dto::{BookingFilters, CreateBookingRequest};
use crate::models::booking::{BookingExtra, BookingStatus, BookingWithRenter, PriceBreakdown};
use crate::models::catalog::CatalogExtra;
use crate::utils::errors::{map_foreign_key_violation, not_found_error, validation_error, AppError};

const BOOKING_WITH_RENTER_SELECT: &str = r#"
    SELECT b.id, b.vehicle_id, b.renter_id, b.start_date, b.end_date, b.status,
           b.base_price, b.extras_price, b.insurance_price, b.discount_amount, b.final_price,
           b.created_at, b.updated_at,
           u.full_name AS renter_name
    FROM bookings b
    LEFT JOIN users u ON u.id = b.renter_id
"#;

const BOOKING_REFERENCES: &[&str] = &["vehicle_id", "renter_id"];

/// Líneas `(cantidad, precio)` con el precio vigente del catálogo
pub fn price_line_items(
    request: &CreateBookingRequest,
    catalog: &[CatalogExtra],
) -> Result<Vec<(Uuid, i32, Decimal)>, AppError> {
    let prices: HashMap<Uuid, Decimal> = catalog.iter().map(|extra| (extra.id, extra.price)).collect();

    request
        .extras
        .iter()
        .map(|line| {
            prices
                .get(&line.extra_id)
                .map(|price| (line.extra_id, line.quantity, *price))
                .ok_or_else(|| validation_error("extras", format!("Extra '{}' does not exist", line.extra_id)))
        })
        .collect()
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filters: &BookingFilters) -> Result<Vec<BookingWithRenter>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithRenter>(&format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR b.vehicle_id = $1)
              AND ($2::booking_status IS NULL OR b.status = $2)
            ORDER BY b.start_date DESC"#,
            BOOKING_WITH_RENTER_SELECT
        ))
        .bind(filters.vehicle_id)
        .bind(filters.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BookingWithRenter>, AppError> {
        let booking = sqlx::query_as::<_, BookingWithRenter>(&format!(
            "{} WHERE b.id = $1",
            BOOKING_WITH_RENTER_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    /// Todas las reservas de un vehículo, sin paginar
    pub async fn find_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<BookingWithRenter>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithRenter>(&format!(
            "{} WHERE b.vehicle_id = $1 ORDER BY b.start_date",
            BOOKING_WITH_RENTER_SELECT
        ))
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn extras_for(&self, booking_id: Uuid) -> Result<Vec<BookingExtra>, AppError> {
        let extras = sqlx::query_as::<_, BookingExtra>(
            r#"
            SELECT be.booking_id, be.extra_id, e.name AS extra_name, be.quantity, be.price_at_booking
            FROM booking_extras be
            LEFT JOIN extras e ON e.id = be.extra_id
            WHERE be.booking_id = $1
            ORDER BY e.name
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(extras)
    }

    /// Crea la reserva y sus líneas de extras en una sola transacción
    pub async fn create(
        &self,
        request: &CreateBookingRequest,
        line_items: &[(Uuid, i32, Decimal)],
    ) -> Result<Uuid, AppError> {
        let quantities: Vec<(i32, Decimal)> = line_items.iter().map(|(_, qty, price)| (*qty, *price)).collect();
        let prices = PriceBreakdown::compute(
            request.base_price,
            &quantities,
            request.insurance_price.unwrap_or(Decimal::ZERO),
            request.discount_amount.unwrap_or(Decimal::ZERO),
        );

        let booking_id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, vehicle_id, renter_id, start_date, end_date, status,
                                  base_price, extras_price, insurance_price, discount_amount, final_price,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            "#,
        )
        .bind(booking_id)
        .bind(request.vehicle_id)
        .bind(request.renter_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(BookingStatus::PendingConfirmation)
        .bind(prices.base_price)
        .bind(prices.extras_price)
        .bind(prices.insurance_price)
        .bind(prices.discount_amount)
        .bind(prices.final_price)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_foreign_key_violation(e, BOOKING_REFERENCES))?;

        for (extra_id, quantity, price) in line_items {
            sqlx::query(
                r#"
                INSERT INTO booking_extras (booking_id, extra_id, quantity, price_at_booking)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (booking_id, extra_id)
                DO UPDATE SET quantity = booking_extras.quantity + EXCLUDED.quantity
                "#,
            )
            .bind(booking_id)
            .bind(extra_id)
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("📅 Reserva {} creada (final {})", booking_id, prices.final_price);

        Ok(booking_id)
    }

    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Booking", id));
        }
        Ok(())
    }

    /// Borra la reserva con sus informes de daños.
    /// Devuelve las claves de imagen a limpiar tras el commit.
    pub async fn delete(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let image_keys: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT i.storage_key
            FROM damage_report_images i
            JOIN damage_reports d ON d.id = i.damage_report_id
            WHERE d.booking_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM damage_reports WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found_error("Booking", id));
        }

        tx.commit().await?;
        Ok(image_keys.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::booking_dto::BookingExtraRequest;

    fn request(extras: Vec<BookingExtraRequest>) -> CreateBookingRequest {
        CreateBookingRequest {
            vehicle_id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            base_price: Decimal::new(100, 0),
            insurance_price: None,
            discount_amount: None,
            extras,
        }
    }

    #[test]
    fn test_line_items_use_catalog_price() {
        let gps = CatalogExtra {
            id: Uuid::new_v4(),
            name: "GPS".to_string(),
            price: Decimal::new(750, 2),
        };
        let lines = price_line_items(
            &request(vec![BookingExtraRequest { extra_id: gps.id, quantity: 2 }]),
            &[gps.clone()],
        )
        .unwrap();

        assert_eq!(lines, vec![(gps.id, 2, Decimal::new(750, 2))]);
    }

    #[test]
    fn test_unknown_extra_is_rejected() {
        let err = price_line_items(
            &request(vec![BookingExtraRequest { extra_id: Uuid::new_v4(), quantity: 1 }]),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

//! Tests de persistencia contra Postgres real
//!
//! Solo corren si `DATABASE_URL` está definido; aplican las migraciones y
//! crean sus propios vehículos, que se borran al final de cada test.
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test persistence_tests -- --test-threads=1

use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use fleet_backoffice::config::DatabaseConfig;
use fleet_backoffice::database::DatabaseConnection;
use fleet_backoffice::dto::operational_hold_dto::{CreateOperationalHoldRequest, UpdateOperationalHoldRequest};
use fleet_backoffice::models::operational_hold::HoldWithMaintenance;
use fleet_backoffice::repositories::{OperationalHoldRepository, VehicleRepository};
use fleet_backoffice::utils::errors::{field_messages, AppError};

// ============================================================================
// Test Setup
// ============================================================================

async fn setup_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL no definido: se omiten los tests de persistencia");
        return None;
    };

    let connection = DatabaseConnection::connect(&DatabaseConfig::with_url(database_url).with_max_connections(2))
        .await
        .expect("Failed to connect to database");
    connection.run_migrations().await.expect("Failed to run migrations");

    Some(connection.pool().clone())
}

/// Modelo + vehículo propios del test
async fn create_vehicle(pool: &PgPool) -> Uuid {
    let model_id = Uuid::new_v4();
    sqlx::query("INSERT INTO vehicle_models (id, make, name) VALUES ($1, 'Test', 'Fixture')")
        .bind(model_id)
        .execute(pool)
        .await
        .expect("Failed to insert vehicle model");

    let vehicle_id = Uuid::new_v4();
    let suffix = vehicle_id.simple().to_string().to_uppercase();
    sqlx::query(
        "INSERT INTO vehicles (id, vehicle_model_id, license_plate, vin, acquisition_date) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(vehicle_id)
    .bind(model_id)
    .bind(format!("T-{}", &suffix[..10]))
    .bind(&suffix[..17])
    .bind(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())
    .execute(pool)
    .await
    .expect("Failed to insert vehicle");

    vehicle_id
}

async fn cleanup(pool: &PgPool, vehicle_ids: &[Uuid]) {
    let vehicles = VehicleRepository::new(pool.clone());
    for vehicle_id in vehicle_ids {
        vehicles
            .delete_with_history(*vehicle_id)
            .await
            .expect("Failed to clean up vehicle");
    }

    sqlx::query(
        "DELETE FROM vehicle_models m WHERE m.make = 'Test' AND m.name = 'Fixture' AND NOT EXISTS (SELECT 1 FROM vehicles v WHERE v.vehicle_model_id = m.id)",
    )
    .execute(pool)
    .await
    .expect("Failed to clean up vehicle models");
}

fn create_request(vehicle_id: Uuid, extra: Value) -> CreateOperationalHoldRequest {
    let mut body = json!({
        "vehicle_id": vehicle_id,
        "created_by_user_id": Uuid::new_v4(),
        "start_date": "2024-03-01T08:00:00Z",
        "end_date": "2024-03-03T08:00:00Z",
        "reason": "Maintenance",
        "requires_maintenance": true,
        "maintenance_record_attributes": { "description": "Oil change", "cost": "89.90" }
    });
    if let (Some(target), Some(source)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(body).unwrap()
}

fn update_request(body: Value) -> UpdateOperationalHoldRequest {
    serde_json::from_value(body).unwrap()
}

async fn record_count(pool: &PgPool, hold_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM maintenance_records WHERE operational_hold_id = $1")
        .bind(hold_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn load(repository: &OperationalHoldRepository, hold_id: Uuid) -> HoldWithMaintenance {
    repository.find_by_id(hold_id).await.unwrap().expect("hold should exist")
}

// ============================================================================
// Hold / maintenance lifecycle
// ============================================================================

#[tokio::test]
async fn test_delete_removes_hold_and_record() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({})))
        .await
        .unwrap();
    assert_eq!(record_count(&pool, hold_id).await, 1);

    repository.delete_cascade(hold_id).await.unwrap();

    assert_eq!(record_count(&pool, hold_id).await, 0);
    assert!(repository.find_by_id(hold_id).await.unwrap().is_none());

    cleanup(&pool, &[vehicle_id]).await;
}

#[tokio::test]
async fn test_upsert_without_id_updates_in_place() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({})))
        .await
        .unwrap();
    let original = load(&repository, hold_id).await.maintenance_record.unwrap();

    repository
        .update_with_maintenance(
            hold_id,
            &update_request(json!({
                "requires_maintenance": true,
                "maintenance_record_attributes": { "description": "Brake pads" }
            })),
        )
        .await
        .unwrap();

    assert_eq!(record_count(&pool, hold_id).await, 1);
    let updated = load(&repository, hold_id).await.maintenance_record.unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.description, "Brake pads");

    cleanup(&pool, &[vehicle_id]).await;
}

#[tokio::test]
async fn test_mismatched_record_id_replaces_record() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({})))
        .await
        .unwrap();
    let original = load(&repository, hold_id).await.maintenance_record.unwrap();

    repository
        .update_with_maintenance(
            hold_id,
            &update_request(json!({
                "maintenance_record_attributes": { "description": "Tyres" },
                "existing_maintenance_record_id": Uuid::new_v4()
            })),
        )
        .await
        .unwrap();

    assert_eq!(record_count(&pool, hold_id).await, 1);
    let replaced = load(&repository, hold_id).await.maintenance_record.unwrap();
    assert_ne!(replaced.id, original.id);
    assert_eq!(replaced.description, "Tyres");

    cleanup(&pool, &[vehicle_id]).await;
}

#[tokio::test]
async fn test_requires_maintenance_false_deletes_record() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({})))
        .await
        .unwrap();

    repository
        .update_with_maintenance(hold_id, &update_request(json!({ "requires_maintenance": false })))
        .await
        .unwrap();

    assert_eq!(record_count(&pool, hold_id).await, 0);
    assert!(load(&repository, hold_id).await.maintenance_record.is_none());

    cleanup(&pool, &[vehicle_id]).await;
}

#[tokio::test]
async fn test_requires_maintenance_true_alone_keeps_record() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({})))
        .await
        .unwrap();
    let original = load(&repository, hold_id).await.maintenance_record.unwrap();

    repository
        .update_with_maintenance(
            hold_id,
            &update_request(json!({ "requires_maintenance": true, "notes": "moved to bay 3" })),
        )
        .await
        .unwrap();

    let entry = load(&repository, hold_id).await;
    assert_eq!(entry.hold.notes.as_deref(), Some("moved to bay 3"));
    assert_eq!(entry.maintenance_record, Some(original));

    cleanup(&pool, &[vehicle_id]).await;
}

#[tokio::test]
async fn test_record_follows_hold_to_new_vehicle() {
    let Some(pool) = setup_pool().await else { return };
    let first_vehicle = create_vehicle(&pool).await;
    let second_vehicle = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let hold_id = repository
        .create_with_maintenance(&create_request(first_vehicle, json!({})))
        .await
        .unwrap();

    repository
        .update_with_maintenance(hold_id, &update_request(json!({ "vehicle_id": second_vehicle })))
        .await
        .unwrap();

    let entry = load(&repository, hold_id).await;
    assert_eq!(entry.hold.vehicle_id, second_vehicle);
    assert_eq!(entry.maintenance_record.map(|record| record.vehicle_id), Some(second_vehicle));

    cleanup(&pool, &[first_vehicle, second_vehicle]).await;
}

#[tokio::test]
async fn test_unknown_booking_is_a_validation_error() {
    let Some(pool) = setup_pool().await else { return };
    let vehicle_id = create_vehicle(&pool).await;
    let repository = OperationalHoldRepository::new(pool.clone());

    let err = repository
        .create_with_maintenance(&create_request(vehicle_id, json!({ "booking_id": Uuid::new_v4() })))
        .await
        .unwrap_err();

    let errors = match err {
        AppError::Validation(errors) => errors,
        other => panic!("expected validation error, got {:?}", other),
    };
    assert!(field_messages(&errors).contains_key("booking_id"));

    let holds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operational_holds WHERE vehicle_id = $1")
        .bind(vehicle_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(holds, 0);

    cleanup(&pool, &[vehicle_id]).await;
}

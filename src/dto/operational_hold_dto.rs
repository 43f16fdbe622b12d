use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::models::maintenance_record::{MaintenanceInput, MaintenanceRecord};
use crate::models::operational_hold::HoldWithMaintenance;
use crate::services::maintenance_sync_service::MaintenanceIntent;
use crate::services::timeline_service::requires_maintenance;
use crate::utils::errors::field_error;
use crate::utils::serde_helpers::deserialize_present;
use crate::utils::validation::{validate_non_negative_amount, validate_not_empty};

const NOTES_MAX_CHARS: usize = 2000;

// Atributos de la ficha de mantenimiento enviados junto con la retención
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MaintenanceAttributes {
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(custom = "validate_non_negative_amount")]
    pub cost: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl MaintenanceAttributes {
    /// `None` cuando la descripción está vacía
    pub fn normalized(&self) -> Option<MaintenanceInput> {
        let description = self.description.as_deref().map(str::trim).filter(|d| !d.is_empty())?;

        Some(MaintenanceInput {
            description: description.to_string(),
            cost: self.cost,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }
}

/// `requires_maintenance: false` anula cualquier atributo enviado
fn effective_input(
    requires_maintenance: Option<bool>,
    attributes: Option<&MaintenanceAttributes>,
) -> Option<MaintenanceInput> {
    if requires_maintenance == Some(false) {
        return None;
    }
    attributes.and_then(MaintenanceAttributes::normalized)
}

// Request para crear una retención operativa
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOperationalHoldRequest {
    pub vehicle_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[validate(length(max = 255), custom = "validate_not_empty")]
    pub reason: String,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    /// Intención de escritura; nunca se persiste
    pub requires_maintenance: Option<bool>,

    #[validate]
    pub maintenance_record_attributes: Option<MaintenanceAttributes>,

    pub existing_maintenance_record_id: Option<Uuid>,
}

impl CreateOperationalHoldRequest {
    pub fn maintenance_intent(&self) -> MaintenanceIntent {
        MaintenanceIntent {
            touched: true,
            input: effective_input(self.requires_maintenance, self.maintenance_record_attributes.as_ref()),
            existing_record_id: self.existing_maintenance_record_id,
        }
    }
}

// Request para actualizar una retención (parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOperationalHoldRequest {
    pub vehicle_id: Option<Uuid>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub booking_id: Option<Option<Uuid>>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[validate(length(max = 255), custom = "validate_not_empty")]
    pub reason: Option<String>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub notes: Option<Option<String>>,

    pub requires_maintenance: Option<bool>,

    /// Ausente: no se toca la ficha. `null`: equivale a revocar.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub maintenance_record_attributes: Option<Option<MaintenanceAttributes>>,

    pub existing_maintenance_record_id: Option<Uuid>,
}

impl UpdateOperationalHoldRequest {
    pub fn maintenance_intent(&self) -> MaintenanceIntent {
        let attributes = self.maintenance_record_attributes.as_ref().and_then(Option::as_ref);

        // `requires_maintenance: true` sin atributos no toca la ficha actual
        MaintenanceIntent {
            touched: self.maintenance_record_attributes.is_some() || self.requires_maintenance == Some(false),
            input: effective_input(self.requires_maintenance, attributes),
            existing_record_id: self.existing_maintenance_record_id,
        }
    }

    /// Valida también los atributos anidados (el derive no entra en `Option<Option<_>>`).
    /// Acumula todos los errores en un único `ValidationErrors`.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut result = self.validate();

        if let Some(Some(attributes)) = &self.maintenance_record_attributes {
            result = ValidationErrors::merge(result, "maintenance_record_attributes", attributes.validate());
        }

        let notes_too_long = matches!(&self.notes, Some(Some(notes)) if notes.chars().count() > NOTES_MAX_CHARS);
        if notes_too_long {
            let mut errors = result.err().unwrap_or_default();
            errors.add("notes", field_error(format!("notes must be at most {} characters", NOTES_MAX_CHARS)));
            return Err(errors);
        }

        result
    }
}

// Filtros del listado
#[derive(Debug, Default, Deserialize)]
pub struct OperationalHoldFilters {
    pub vehicle_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceRecordResponse {
    pub id: Uuid,
    pub operational_hold_id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MaintenanceRecord> for MaintenanceRecordResponse {
    fn from(record: MaintenanceRecord) -> Self {
        Self {
            id: record.id,
            operational_hold_id: record.operational_hold_id,
            vehicle_id: record.vehicle_id,
            description: record.description,
            cost: record.cost,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// Response de retención con su ficha resuelta
#[derive(Debug, Serialize)]
pub struct OperationalHoldResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
    pub notes: Option<String>,
    /// Derivado en lectura
    pub requires_maintenance: bool,
    pub maintenance_record: Option<MaintenanceRecordResponse>,
    pub existing_maintenance_record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HoldWithMaintenance> for OperationalHoldResponse {
    fn from(entry: HoldWithMaintenance) -> Self {
        let HoldWithMaintenance { hold, maintenance_record } = entry;

        Self {
            requires_maintenance: requires_maintenance(&hold, maintenance_record.is_some()),
            existing_maintenance_record_id: maintenance_record.as_ref().map(|r| r.id),
            maintenance_record: maintenance_record.map(MaintenanceRecordResponse::from),
            id: hold.id,
            vehicle_id: hold.vehicle_id,
            booking_id: hold.booking_id,
            created_by_user_id: hold.created_by_user_id,
            start_date: hold.start_date,
            end_date: hold.end_date,
            reason: hold.reason,
            notes: hold.notes,
            created_at: hold.created_at,
            updated_at: hold.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::services::maintenance_sync_service::{plan_on_update, MaintenanceSync};
    use crate::utils::errors::field_messages;

    fn create_body(extra: serde_json::Value) -> CreateOperationalHoldRequest {
        let mut body = json!({
            "vehicle_id": Uuid::new_v4(),
            "created_by_user_id": Uuid::new_v4(),
            "start_date": "2024-01-15T08:00:00Z",
            "end_date": "2024-01-16T08:00:00Z",
            "reason": "Maintenance"
        });
        if let (Some(target), Some(source)) = (body.as_object_mut(), extra.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_create_intent_with_description() {
        let request = create_body(json!({
            "requires_maintenance": true,
            "maintenance_record_attributes": { "description": "  Oil change ", "cost": "89.90" }
        }));

        let intent = request.maintenance_intent();
        let input = intent.input.expect("maintenance input");
        assert_eq!(input.description, "Oil change");
        assert_eq!(input.cost, Some(Decimal::new(8990, 2)));
    }

    #[test]
    fn test_create_intent_blank_description_is_none() {
        let request = create_body(json!({
            "maintenance_record_attributes": { "description": "   " }
        }));
        assert!(request.maintenance_intent().input.is_none());
    }

    #[test]
    fn test_requires_maintenance_false_revokes() {
        let request: UpdateOperationalHoldRequest = serde_json::from_value(json!({
            "requires_maintenance": false,
            "maintenance_record_attributes": { "description": "Oil change" }
        }))
        .unwrap();

        let intent = request.maintenance_intent();
        assert!(intent.touched);
        assert!(intent.input.is_none());
    }

    #[test]
    fn test_update_without_maintenance_keys_is_untouched() {
        let request: UpdateOperationalHoldRequest =
            serde_json::from_value(json!({ "reason": "Inspection" })).unwrap();
        assert!(!request.maintenance_intent().touched);

        let nulled: UpdateOperationalHoldRequest =
            serde_json::from_value(json!({ "maintenance_record_attributes": null })).unwrap();
        let intent = nulled.maintenance_intent();
        assert!(intent.touched);
        assert!(intent.input.is_none());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let request = create_body(json!({
            "maintenance_record_attributes": { "description": "Brakes", "cost": -10 }
        }));
        let details = field_messages(&request.validate().unwrap_err());
        assert!(details.contains_key("maintenance_record_attributes.cost"), "{:?}", details);

        let update: UpdateOperationalHoldRequest = serde_json::from_value(json!({
            "maintenance_record_attributes": { "description": "Brakes", "cost": -10 }
        }))
        .unwrap();
        let details = field_messages(&update.validate_all().unwrap_err());
        assert!(details.contains_key("maintenance_record_attributes.cost"), "{:?}", details);
    }

    #[test]
    fn test_update_collects_every_error() {
        let update: UpdateOperationalHoldRequest = serde_json::from_value(json!({
            "reason": "   ",
            "notes": "x".repeat(2001),
            "maintenance_record_attributes": { "description": "Brakes", "cost": -1 }
        }))
        .unwrap();

        let details = field_messages(&update.validate_all().unwrap_err());
        for field in ["reason", "notes", "maintenance_record_attributes.cost"] {
            assert!(details.contains_key(field), "missing {} in {:?}", field, details);
        }
    }

    #[test]
    fn test_requires_maintenance_true_alone_keeps_record() {
        let request: UpdateOperationalHoldRequest = serde_json::from_value(json!({
            "requires_maintenance": true,
            "notes": "moved to bay 3"
        }))
        .unwrap();

        let intent = request.maintenance_intent();
        assert!(!intent.touched);

        let hold_id = Uuid::new_v4();
        let now = Utc::now();
        let current = MaintenanceRecord {
            id: Uuid::new_v4(),
            operational_hold_id: hold_id,
            vehicle_id: Uuid::new_v4(),
            description: "Oil change".to_string(),
            cost: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(plan_on_update(&intent, Some(&current)), MaintenanceSync::Unchanged);
    }

    #[test]
    fn test_requires_maintenance_false_alone_revokes() {
        let request: UpdateOperationalHoldRequest =
            serde_json::from_value(json!({ "requires_maintenance": false })).unwrap();

        let intent = request.maintenance_intent();
        assert!(intent.touched);
        assert!(intent.input.is_none());
    }

    #[test]
    fn test_blank_reason_is_rejected() {
        let request = create_body(json!({ "reason": "  " }));
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reason"));
    }

    #[test]
    fn test_response_derives_requires_maintenance() {
        let now = Utc::now();
        let hold = crate::models::operational_hold::OperationalHold {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            booking_id: None,
            created_by_user_id: Uuid::new_v4(),
            start_date: now,
            end_date: now,
            reason: "Repair".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let response = OperationalHoldResponse::from(HoldWithMaintenance {
            hold,
            maintenance_record: None,
        });
        assert!(response.requires_maintenance);
        assert!(response.maintenance_record.is_none());
        assert_eq!(response.existing_maintenance_record_id, None);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["requires_maintenance"], true);
        assert!(json["maintenance_record"].is_null());
    }
}

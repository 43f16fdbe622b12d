//! Sincronización retención ↔ ficha de mantenimiento
//!
//! Decide qué hacer con la ficha de mantenimiento (0 o 1 por retención)
//! a partir de la intención del cliente. La decisión es un valor
//! (`MaintenanceSync`) que el repositorio aplica dentro de la misma
//! transacción que escribe la retención.

use uuid::Uuid;

use crate::models::maintenance_record::{MaintenanceInput, MaintenanceRecord};

/// Intención de mantenimiento extraída del body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceIntent {
    /// El body trae `maintenance_record_attributes` o `requires_maintenance: false`
    pub touched: bool,
    /// Atributos efectivos; `None` si no hay descripción o se revocó el mantenimiento
    pub input: Option<MaintenanceInput>,
    pub existing_record_id: Option<Uuid>,
}

/// Operación a aplicar sobre la ficha de mantenimiento
#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceSync {
    Unchanged,
    Create(MaintenanceInput),
    UpdateInPlace { record_id: Uuid, input: MaintenanceInput },
    /// Borra la ficha actual (si hay) y crea una nueva
    Replace { stale_record_id: Option<Uuid>, input: MaintenanceInput },
    Revoke { record_id: Uuid },
}

/// Alta de retención: solo se crea ficha si hay descripción
pub fn plan_on_create(intent: &MaintenanceIntent) -> MaintenanceSync {
    match &intent.input {
        Some(input) => MaintenanceSync::Create(input.clone()),
        None => MaintenanceSync::Unchanged,
    }
}

/// Actualización de retención frente a la ficha que tiene ahora
pub fn plan_on_update(intent: &MaintenanceIntent, current: Option<&MaintenanceRecord>) -> MaintenanceSync {
    if !intent.touched {
        return MaintenanceSync::Unchanged;
    }

    let current_id = current.map(|record| record.id);

    let Some(input) = intent.input.clone() else {
        return match current_id {
            Some(record_id) => MaintenanceSync::Revoke { record_id },
            None => MaintenanceSync::Unchanged,
        };
    };

    match (intent.existing_record_id, current_id) {
        (Some(requested), Some(owned)) if requested == owned => {
            MaintenanceSync::UpdateInPlace { record_id: owned, input }
        }
        (Some(_), stale_record_id) => MaintenanceSync::Replace { stale_record_id, input },
        (None, Some(owned)) => MaintenanceSync::UpdateInPlace { record_id: owned, input },
        (None, None) => MaintenanceSync::Create(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn input(description: &str) -> MaintenanceInput {
        MaintenanceInput {
            description: description.to_string(),
            cost: Some(Decimal::new(8900, 2)),
            notes: None,
        }
    }

    fn record(hold_id: Uuid) -> MaintenanceRecord {
        MaintenanceRecord {
            id: Uuid::new_v4(),
            operational_hold_id: hold_id,
            vehicle_id: Uuid::new_v4(),
            description: "Oil change".to_string(),
            cost: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn intent(input: Option<MaintenanceInput>, existing_record_id: Option<Uuid>) -> MaintenanceIntent {
        MaintenanceIntent { touched: true, input, existing_record_id }
    }

    #[test]
    fn test_create_only_with_description() {
        assert_eq!(
            plan_on_create(&intent(Some(input("Oil change")), None)),
            MaintenanceSync::Create(input("Oil change"))
        );
        assert_eq!(plan_on_create(&intent(None, None)), MaintenanceSync::Unchanged);
    }

    #[test]
    fn test_untouched_update_keeps_record() {
        let current = record(Uuid::new_v4());
        let untouched = MaintenanceIntent::default();
        assert_eq!(plan_on_update(&untouched, Some(&current)), MaintenanceSync::Unchanged);
    }

    #[test]
    fn test_upsert_without_id_updates_in_place() {
        let current = record(Uuid::new_v4());
        assert_eq!(
            plan_on_update(&intent(Some(input("Brakes")), None), Some(&current)),
            MaintenanceSync::UpdateInPlace { record_id: current.id, input: input("Brakes") }
        );
    }

    #[test]
    fn test_upsert_without_id_creates_when_missing() {
        assert_eq!(
            plan_on_update(&intent(Some(input("Brakes")), None), None),
            MaintenanceSync::Create(input("Brakes"))
        );
    }

    #[test]
    fn test_matching_id_updates_in_place() {
        let current = record(Uuid::new_v4());
        assert_eq!(
            plan_on_update(&intent(Some(input("Tyres")), Some(current.id)), Some(&current)),
            MaintenanceSync::UpdateInPlace { record_id: current.id, input: input("Tyres") }
        );
    }

    #[test]
    fn test_mismatched_id_replaces_record() {
        let current = record(Uuid::new_v4());
        assert_eq!(
            plan_on_update(&intent(Some(input("Tyres")), Some(Uuid::new_v4())), Some(&current)),
            MaintenanceSync::Replace { stale_record_id: Some(current.id), input: input("Tyres") }
        );

        assert_eq!(
            plan_on_update(&intent(Some(input("Tyres")), Some(Uuid::new_v4())), None),
            MaintenanceSync::Replace { stale_record_id: None, input: input("Tyres") }
        );
    }

    #[test]
    fn test_revocation_deletes_owned_record() {
        let current = record(Uuid::new_v4());
        assert_eq!(
            plan_on_update(&intent(None, Some(current.id)), Some(&current)),
            MaintenanceSync::Revoke { record_id: current.id }
        );
        assert_eq!(plan_on_update(&intent(None, None), None), MaintenanceSync::Unchanged);
    }
}

//! Reconciliador del calendario operativo de un vehículo
//!
//! Combina reservas, retenciones operativas (con su ficha de mantenimiento)
//! e informes de daños en dos vistas derivadas de solo lectura:
//!
//! - el **calendario** (`schedule_events`), ordenado por inicio;
//! - el **feed de alertas** (`alerts_and_health`), plano y sin orden garantizado.
//!
//! Todo es puro: recibe filas ya cargadas y no toca la base de datos.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::booking::BookingWithRenter;
use crate::models::damage_report::DamageReport;
use crate::models::maintenance_record::MaintenanceRecord;
use crate::models::operational_hold::{HoldWithMaintenance, OperationalHold};

/// Longitud máxima del texto `details` de una alerta
pub const ALERT_DETAILS_LIMIT: usize = 50;

const UNKNOWN_RENTER: &str = "Unknown Renter";
const GENERIC_HOLD_TITLE: &str = "Operational Hold";
const MAINTENANCE_KEYWORDS: [&str; 3] = ["maintenance", "repair", "service"];

/// Reserva con sus informes de daños, tal y como la carga el agregador
#[derive(Debug, Clone)]
pub struct BookingTimelineEntry {
    pub booking: BookingWithRenter,
    pub damage_reports: Vec<DamageReport>,
}

/// Entrada del reconciliador: todas las filas relacionadas con un vehículo
#[derive(Debug, Clone, Default)]
pub struct VehicleTimeline {
    pub bookings: Vec<BookingTimelineEntry>,
    pub holds: Vec<HoldWithMaintenance>,
}

impl VehicleTimeline {
    /// Reparte los informes de daños entre sus reservas.
    /// Los informes cuya reserva no está cargada se descartan.
    pub fn assemble(
        bookings: Vec<BookingWithRenter>,
        holds: Vec<HoldWithMaintenance>,
        damage_reports: &[DamageReport],
    ) -> Self {
        let bookings = bookings
            .into_iter()
            .map(|booking| BookingTimelineEntry {
                damage_reports: damage_reports
                    .iter()
                    .filter(|report| report.booking_id == booking.booking.id)
                    .cloned()
                    .collect(),
                booking,
            })
            .collect();

        Self { bookings, holds }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleEventKind {
    Booking,
    Maintenance,
    Cleaning,
    OperationalHold,
    Damage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ScheduleEventKind,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Damage,
    Maintenance,
    Cleaning,
}

impl AlertKind {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            AlertKind::Damage => "damage",
            AlertKind::Maintenance => "maintenance",
            AlertKind::Cleaning => "cleaning",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Damage => "Damage Reported",
            AlertKind::Maintenance => "Scheduled Maintenance",
            AlertKind::Cleaning => "Scheduled Cleaning",
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            AlertKind::Damage => "View Report",
            AlertKind::Maintenance => "View Log",
            AlertKind::Cleaning => "View Details",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub details: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub action_label: String,
}

/// Clasificación de una retención.
/// El orden de los brazos es la prioridad: mantenimiento > limpieza > genérica.
#[derive(Debug, Clone, Copy)]
pub enum HoldClass<'a> {
    Maintenance(&'a MaintenanceRecord),
    Cleaning,
    Generic,
}

pub fn classify_hold(entry: &HoldWithMaintenance) -> HoldClass<'_> {
    match (&entry.maintenance_record, entry.hold.is_cleaning()) {
        (Some(record), _) => HoldClass::Maintenance(record),
        (None, true) => HoldClass::Cleaning,
        (None, false) => HoldClass::Generic,
    }
}

/// Flag derivado `requires_maintenance`; nunca se persiste
pub fn requires_maintenance(hold: &OperationalHold, has_maintenance_record: bool) -> bool {
    if has_maintenance_record {
        return true;
    }

    let reason = hold.reason.to_lowercase();
    MAINTENANCE_KEYWORDS.iter().any(|keyword| reason.contains(keyword))
}

/// Calendario unificado, ordenado por inicio (orden estable en empates)
pub fn build_schedule(timeline: &VehicleTimeline) -> Vec<ScheduleEvent> {
    let mut events = Vec::new();

    for entry in &timeline.bookings {
        events.push(booking_event(&entry.booking));
    }

    for entry in &timeline.holds {
        events.push(hold_event(entry));
    }

    for report in timeline.bookings.iter().flat_map(|b| b.damage_reports.iter()) {
        if let Some(event) = damage_event(report) {
            events.push(event);
        }
    }

    events.sort_by_key(|event| event.start);
    events
}

/// Feed de alertas: daños, mantenimientos y limpiezas. No se ordena.
pub fn build_alerts(timeline: &VehicleTimeline) -> Vec<AlertEntry> {
    let mut alerts = Vec::new();

    for report in timeline.bookings.iter().flat_map(|b| b.damage_reports.iter()) {
        alerts.push(AlertEntry {
            id: prefixed_id(AlertKind::Damage.id_prefix(), report.id),
            kind: AlertKind::Damage,
            title: AlertKind::Damage.title().to_string(),
            details: non_blank(Some(report.description.as_str())).map(|d| truncate_display(d, ALERT_DETAILS_LIMIT)),
            date: report.reported_at,
            action_label: AlertKind::Damage.action_label().to_string(),
        });
    }

    for entry in &timeline.holds {
        let hold = &entry.hold;
        let (kind, details) = match classify_hold(entry) {
            HoldClass::Maintenance(record) => (
                AlertKind::Maintenance,
                non_blank(Some(record.description.as_str())).or_else(|| non_blank(Some(hold.reason.as_str()))),
            ),
            HoldClass::Cleaning => (
                AlertKind::Cleaning,
                non_blank(hold.notes.as_deref()).or_else(|| non_blank(Some(hold.reason.as_str()))),
            ),
            HoldClass::Generic => continue,
        };

        alerts.push(AlertEntry {
            id: prefixed_id(kind.id_prefix(), hold.id),
            kind,
            title: kind.title().to_string(),
            details: details.map(|d| truncate_display(d, ALERT_DETAILS_LIMIT)),
            date: Some(hold.start_date),
            action_label: kind.action_label().to_string(),
        });
    }

    alerts
}

fn booking_event(entry: &BookingWithRenter) -> ScheduleEvent {
    let renter = non_blank(entry.renter_name.as_deref()).unwrap_or(UNKNOWN_RENTER);

    ScheduleEvent {
        id: prefixed_id("booking", entry.booking.id),
        kind: ScheduleEventKind::Booking,
        title: format!("Booking: {}", renter),
        start: entry.booking.start_date,
        end: entry.booking.end_date,
    }
}

fn hold_event(entry: &HoldWithMaintenance) -> ScheduleEvent {
    let hold = &entry.hold;
    let reason = non_blank(Some(hold.reason.as_str()));

    let (kind, title) = match classify_hold(entry) {
        HoldClass::Maintenance(record) => {
            let label = non_blank(Some(record.description.as_str())).or(reason).unwrap_or_default();
            (ScheduleEventKind::Maintenance, format!("Maintenance: {}", label))
        }
        HoldClass::Cleaning => {
            let label = non_blank(hold.notes.as_deref()).or(reason).unwrap_or_default();
            (ScheduleEventKind::Cleaning, format!("Cleaning: {}", label))
        }
        HoldClass::Generic => (
            ScheduleEventKind::OperationalHold,
            reason.unwrap_or(GENERIC_HOLD_TITLE).to_string(),
        ),
    };

    ScheduleEvent {
        id: prefixed_id("hold", hold.id),
        kind,
        title,
        start: hold.start_date,
        end: hold.end_date,
    }
}

/// Evento puntual: inicio y fin son `reported_at`. Sin fecha no hay evento.
fn damage_event(report: &DamageReport) -> Option<ScheduleEvent> {
    let reported_at = report.reported_at?;

    Some(ScheduleEvent {
        id: prefixed_id("damage", report.id),
        kind: ScheduleEventKind::Damage,
        title: AlertKind::Damage.title().to_string(),
        start: reported_at,
        end: reported_at,
    })
}

fn prefixed_id(prefix: &str, id: Uuid) -> String {
    format!("{}-{}", prefix, id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Recorta a `limit` caracteres y añade `...` si hubo recorte
pub fn truncate_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

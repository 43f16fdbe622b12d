//! Modelos del sistema
//! 
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL (ver `migrations/`).

pub mod booking;
pub mod catalog;
pub mod damage_report;
pub mod maintenance_record;
pub mod operational_hold;
pub mod vehicle;

//! Utilidades del sistema
//! 
//! Este módulo contiene utilidades para manejo de errores, validación
//! y deserialización de campos opcionales.

pub mod errors;
pub mod extractors;
pub mod serde_helpers;
pub mod validation;

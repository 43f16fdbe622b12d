//! Middleware del sistema
//!
//! Capas HTTP compartidas por todo el router.

pub mod cors;

pub use cors::*;

//! Services module
//! 
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que involucran varios modelos
//! o colaboradores externos (catálogo, almacenamiento de ficheros).

pub mod catalog_service;
pub mod maintenance_sync_service;
pub mod media_storage;
pub mod timeline_service;

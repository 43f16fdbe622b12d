//! Almacenamiento de ficheros subidos (imágenes de daños)
//!
//! El almacenamiento real es un colaborador externo; el servicio solo
//! depende del trait `MediaStorage`. `LocalMediaStorage` escribe en disco
//! y sirve para desarrollo y despliegues sencillos.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Fichero ya persistido
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    /// Clave relativa dentro del almacenamiento (para borrarlo después)
    pub key: String,
    /// URL pública
    pub url: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn store(&self, folder: &str, extension: &str, bytes: &[u8]) -> Result<StoredMedia, StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Almacenamiento en disco local bajo `root`, servido en `base_url`
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if key.is_empty() || !is_safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, folder: &str, extension: &str, bytes: &[u8]) -> Result<StoredMedia, StorageError> {
        let key = format!("{}/{}.{}", folder.trim_matches('/'), Uuid::new_v4(), extension);
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!("💾 Fichero guardado en {}", path.display());

        Ok(StoredMedia {
            url: format!("{}/{}", self.base_url, key),
            key,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Ya no existe: el resultado es el mismo
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Borra varios ficheros; los fallos solo se registran
pub async fn remove_all(storage: &dyn MediaStorage, keys: &[String]) {
    for key in keys {
        if let Err(e) = storage.remove(key).await {
            warn!("⚠️ No se pudo borrar el fichero {}: {}", key, e);
        }
    }
}

/// Extensión de fichero para los tipos de imagen aceptados
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalMediaStorage, PathBuf) {
        let root = std::env::temp_dir().join(format!("fleet-media-{}", Uuid::new_v4()));
        (LocalMediaStorage::new(&root, "/media/"), root)
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let (storage, root) = temp_storage();

        let stored = storage.store("damage-reports", "png", b"fake-png").await.unwrap();
        assert!(stored.key.starts_with("damage-reports/"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.url, format!("/media/{}", stored.key));

        let on_disk = tokio::fs::read(root.join(&stored.key)).await.unwrap();
        assert_eq!(on_disk, b"fake-png");

        storage.remove(&stored.key).await.unwrap();
        assert!(!root.join(&stored.key).exists());

        // Borrar dos veces no es un error
        storage.remove(&stored.key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (storage, _root) = temp_storage();
        assert!(matches!(
            storage.remove("../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.remove("/abs/path").await, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_remove_all_skips_failures() {
        let (storage, root) = temp_storage();
        let stored = storage.store("damage-reports", "jpg", b"jpeg").await.unwrap();

        remove_all(&storage, &["../outside".to_string(), stored.key.clone()]).await;
        assert!(!root.join(&stored.key).exists());

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("IMAGE/PNG"), Some("png"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("application/pdf"), None);
    }
}

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::api_response::ApiResponse;
use crate::dto::damage_report_dto::{DamageReportFilters, DamageReportForm, DamageReportResponse, UploadedImage};
use crate::models::damage_report::NewDamageReportImage;
use crate::repositories::DamageReportRepository;
use crate::services::media_storage::{image_extension, remove_all, MediaStorage};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, validation_error, AppError};

const MEDIA_FOLDER: &str = "damage-reports";

/// Comprueba tipo y tamaño de cada imagen; devuelve su extensión
pub fn check_images(images: &[UploadedImage], max_bytes: usize) -> Result<Vec<&'static str>, AppError> {
    images
        .iter()
        .map(|image| {
            let name = image.file_name.as_deref().unwrap_or("image");
            let extension = image_extension(&image.content_type).ok_or_else(|| {
                validation_error(
                    "images",
                    format!("{}: only jpeg, png and webp images are accepted", name),
                )
            })?;

            if image.bytes.is_empty() {
                return Err(validation_error("images", format!("{}: file is empty", name)));
            }
            if image.bytes.len() > max_bytes {
                return Err(validation_error(
                    "images",
                    format!("{}: file exceeds the {} bytes limit", name, max_bytes),
                ));
            }

            Ok(extension)
        })
        .collect()
}

pub struct DamageReportController {
    repository: DamageReportRepository,
    media: Arc<dyn MediaStorage>,
    max_upload_bytes: usize,
}

impl DamageReportController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: DamageReportRepository::new(state.pool.clone()),
            media: state.media.clone(),
            max_upload_bytes: state.config.max_upload_bytes,
        }
    }

    pub async fn list(&self, filters: DamageReportFilters) -> Result<Vec<DamageReportResponse>, AppError> {
        let reports = self.repository.list(&filters).await?;
        Ok(reports.into_iter().map(DamageReportResponse::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DamageReportResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(DamageReportResponse::from)
            .ok_or_else(|| not_found_error("Damage report", id))
    }

    /// Guarda los ficheros; si uno falla se borran los ya escritos
    async fn store_images(
        &self,
        form: &DamageReportForm,
        extensions: &[&'static str],
    ) -> Result<Vec<NewDamageReportImage>, AppError> {
        let mut stored = Vec::with_capacity(form.images.len());

        for (index, (image, extension)) in form.images.iter().zip(extensions).enumerate() {
            match self.media.store(MEDIA_FOLDER, extension, &image.bytes).await {
                Ok(media) => stored.push(NewDamageReportImage {
                    url: media.url,
                    storage_key: media.key,
                    caption: form.caption_for(index),
                }),
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e.into());
                }
            }
        }

        Ok(stored)
    }

    async fn discard(&self, images: &[NewDamageReportImage]) {
        if images.is_empty() {
            return;
        }
        warn!("🧹 Descartando {} ficheros sin registrar", images.len());
        let keys: Vec<String> = images.iter().map(|image| image.storage_key.clone()).collect();
        remove_all(self.media.as_ref(), &keys).await;
    }

    pub async fn create(&self, form: DamageReportForm) -> Result<ApiResponse<DamageReportResponse>, AppError> {
        let report = form.parse_create()?;
        let extensions = check_images(&form.images, self.max_upload_bytes)?;

        let images = self.store_images(&form, &extensions).await?;
        let id = match self.repository.create(&report, &images).await {
            Ok(id) => id,
            Err(e) => {
                self.discard(&images).await;
                return Err(e);
            }
        };

        let response = self.get_by_id(id).await?;
        Ok(ApiResponse::success_with_message(response, "Damage report created successfully"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        form: DamageReportForm,
    ) -> Result<ApiResponse<DamageReportResponse>, AppError> {
        let changes = form.parse_update()?;
        let extensions = check_images(&form.images, self.max_upload_bytes)?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Damage report", id))?;
        let merged = changes.apply_to(&current.report);

        let images = self.store_images(&form, &extensions).await?;
        let detached = match self
            .repository
            .update(id, &merged, &images, &changes.image_ids_to_delete)
            .await
        {
            Ok(detached) => detached,
            Err(e) => {
                self.discard(&images).await;
                return Err(e);
            }
        };

        // Solo tras el commit
        if !detached.is_empty() {
            info!("🧹 Borrando {} imágenes desvinculadas del informe {}", detached.len(), id);
            remove_all(self.media.as_ref(), &detached).await;
        }

        let response = self.get_by_id(id).await?;
        Ok(ApiResponse::success_with_message(response, "Damage report updated successfully"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let keys = self.repository.delete(id).await?;
        remove_all(self.media.as_ref(), &keys).await;

        Ok(ApiResponse::deleted("Damage report deleted successfully"))
    }
}

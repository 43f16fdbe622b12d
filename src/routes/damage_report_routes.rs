use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::damage_report_controller::DamageReportController;
use crate::dto::api_response::ApiResponse;
use crate::dto::damage_report_dto::{DamageReportFilters, DamageReportForm, DamageReportResponse, UploadedImage};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Margen para los campos de texto del formulario
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Máximo de imágenes por petición
const MAX_IMAGES_PER_REQUEST: usize = 10;

pub fn create_damage_report_router(max_upload_bytes: usize) -> Router<AppState> {
    let body_limit = max_upload_bytes
        .saturating_mul(MAX_IMAGES_PER_REQUEST)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route("/:id", get(get_report).put(update_report).delete(delete_report))
        .layer(DefaultBodyLimit::max(body_limit))
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Vuelca el multipart en un `DamageReportForm` (acepta `campo` y `campo[]`)
async fn read_form(mut multipart: Multipart) -> Result<DamageReportForm, AppError> {
    let mut form = DamageReportForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().trim_end_matches("[]").to_string();

        match name.as_str() {
            "images" => {
                if form.images.len() >= MAX_IMAGES_PER_REQUEST {
                    return Err(AppError::BadRequest(format!(
                        "At most {} images can be uploaded at once",
                        MAX_IMAGES_PER_REQUEST
                    )));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.images.push(UploadedImage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "captions" => form.captions.push(field.text().await.map_err(multipart_error)?),
            "image_ids_to_delete" => form
                .image_ids_to_delete
                .push(field.text().await.map_err(multipart_error)?),
            "" => {}
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

async fn list_reports(
    State(state): State<AppState>,
    Query(filters): Query<DamageReportFilters>,
) -> Result<Json<Vec<DamageReportResponse>>, AppError> {
    let controller = DamageReportController::new(&state);
    Ok(Json(controller.list(filters).await?))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DamageReportResponse>, AppError> {
    let controller = DamageReportController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DamageReportResponse>>, AppError> {
    let form = read_form(multipart).await?;
    let controller = DamageReportController::new(&state);
    Ok(Json(controller.create(form).await?))
}

async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DamageReportResponse>>, AppError> {
    let form = read_form(multipart).await?;
    let controller = DamageReportController::new(&state);
    Ok(Json(controller.update(id, form).await?))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DamageReportController::new(&state);
    Ok(Json(controller.delete(id).await?))
}

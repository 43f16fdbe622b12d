//! Extractores de Axum con rechazo en el formato de error de la API

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::utils::errors::{validation_error, AppError};

/// `Json<T>` cuyo rechazo se devuelve como `AppError`
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // JSON bien formado pero con campos ausentes o de tipo incorrecto
            JsonRejection::JsonDataError(err) => validation_error("body", err.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

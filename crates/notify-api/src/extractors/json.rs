//! JSON body extractor that runs `validator` rules.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use notify_core::error::AppError;

use crate::error::ApiError;

/// Like [`axum::Json`], but rejects bodies that fail validation with a 400
/// whose `details` lists the offending fields.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        value.validate().map_err(|errors| {
            ApiError::from(AppError::validation("Request validation failed"))
                .with_details(serde_json::to_value(&errors).unwrap_or_default())
        })?;
        Ok(Self(value))
    }
}

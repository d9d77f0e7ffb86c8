//! Request extractors whose rejections use the board's error body.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use domains::DomainError;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Json<T>` that answers malformed bodies, `null` fields and a missing
/// `application/json` content type with a 400 `VALIDATION_ERROR`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(DomainError::validation(rejection.body_text()))),
        }
    }
}

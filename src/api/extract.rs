//! Request Extractors
//!
//! A JSON body extractor whose rejections use the response envelope.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use crate::error::CacheError;

/// Drop-in for [`axum::Json`] that rejects malformed bodies with
/// [`CacheError::InvalidRequest`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = CacheError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(CacheError::InvalidRequest(rejection.body_text())),
        }
    }
}

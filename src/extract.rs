use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections (bad syntax, wrong field types, missing
/// content type) come back as `ApiError::Validation`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

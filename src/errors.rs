use crate::store::StoreError;
use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use tracing::error;
use validator::ValidationErrors;

/// Field name -> messages, rendered as the whole body of a 400 response.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,
    #[error("Given token not valid for any token type")]
    InvalidToken,
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,
    #[error("Not found.")]
    NotFound,
    #[error("Method \"{0}\" not allowed.")]
    MethodNotAllowed(Method),
    #[error("Request was throttled.")]
    Throttled,
    #[error("invalid input: {0:?}")]
    Validation(FieldErrors),
    #[error("Unsupported media type \"{0}\" in request.")]
    UnsupportedMediaType(String),
    #[error("JSON parse error - {0}")]
    Malformed(String),
    #[error("{0}")]
    Body(#[from] BytesRejection),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// A validation failure on a single field.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

/// Flattens `validator` output into the field map, preferring custom messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|err| {
                    err.message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| err.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(field_errors(&errors))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => {
                ApiError::field("username", "A user with that username already exists.")
            }
            StoreError::SlugTaken(_) => ApiError::field("slug", "group with this slug already exists."),
            StoreError::PostNotFound(_) => ApiError::NotFound,
            StoreError::AlreadyFollowing { .. } => {
                ApiError::field(NON_FIELD_ERRORS, "You are already following this user.")
            }
            StoreError::SelfFollow(_) => ApiError::field("following", "You cannot follow yourself."),
        }
    }
}

/// Convert our custom errors to HTTP responses
///
/// Every error leaves as JSON: field errors as the bare map, everything else as
/// `{"detail": "..."}`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidCredentials | ApiError::NotAuthenticated | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Throttled => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) | ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut response = match self {
            ApiError::Validation(errors) => (status, Json(errors)).into_response(),
            ApiError::Body(rejection) => (
                status,
                Json(serde_json::json!({
                  "detail": rejection.body_text()
                })),
            )
                .into_response(),
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (
                    status,
                    Json(serde_json::json!({
                      "detail": "Internal server error"
                    })),
                )
                    .into_response()
            }
            other => (
                status,
                Json(serde_json::json!({
                  "detail": other.to_string()
                })),
            )
                .into_response(),
        };

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"api\""),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_client_errors() {
        let err = ApiError::from(StoreError::AlreadyFollowing {
            user_id: 1,
            following_id: 2,
        });
        assert!(matches!(&err, ApiError::Validation(fields) if fields.contains_key(NON_FIELD_ERRORS)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(StoreError::PostNotFound(3));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_responses_carry_challenge() {
        let response = ApiError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let response = ApiError::PermissionDenied.into_response();
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn body_errors_are_client_errors() {
        let response = ApiError::Malformed("expected value".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::UnsupportedMediaType("text/plain".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn method_not_allowed_names_the_method() {
        assert_eq!(
            ApiError::MethodNotAllowed(Method::DELETE).to_string(),
            "Method \"DELETE\" not allowed."
        );
    }
}

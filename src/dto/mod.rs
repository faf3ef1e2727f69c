mod requests;
mod responses;

pub use requests::*;
pub use responses::*;

use crate::errors::{ApiError, FieldErrors, NON_FIELD_ERRORS};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Raw request body, decoded on demand with [`Payload::decode`].
///
/// Handlers decode after their permission checks, so an anonymous or foreign
/// write is refused before its body is looked at.
#[derive(Debug)]
pub struct Payload {
    content_type: Option<String>,
    bytes: Bytes,
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = content_type(req.headers());
        let bytes = Bytes::from_request(req, state).await?;
        Ok(Self { content_type, bytes })
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

impl Payload {
    /// Parses the body as a JSON object into `T`.
    ///
    /// An empty body reads as `{}`. Values of the wrong type are reported per
    /// field, the same way validation errors are.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let value = if self.bytes.is_empty() {
            Value::Object(Map::new())
        } else {
            match self.content_type.as_deref() {
                Some(content_type) if is_json(content_type) => {}
                other => {
                    return Err(ApiError::UnsupportedMediaType(
                        other.unwrap_or_default().to_string(),
                    ));
                }
            }
            serde_json::from_slice(&self.bytes).map_err(|e| ApiError::Malformed(e.to_string()))?
        };

        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(ApiError::field(
                    NON_FIELD_ERRORS,
                    format!("Invalid data. Expected a dictionary, but got {}.", kind(&other)),
                ));
            }
        };

        serde_json::from_value(Value::Object(fields.clone())).map_err(|_| type_errors::<T>(&fields))
    }
}

/// Finds the fields that `T` refuses by decoding each one on its own.
///
/// Every request type has only optional fields, so a single-key object only
/// fails when that key holds a value of the wrong type.
fn type_errors<T: DeserializeOwned>(fields: &Map<String, Value>) -> ApiError {
    let mut errors = FieldErrors::new();
    for (name, value) in fields {
        let single = Map::from_iter([(name.clone(), value.clone())]);
        if serde_json::from_value::<T>(Value::Object(single)).is_err() {
            errors
                .entry(name.clone())
                .or_default()
                .push(format!("Incorrect type. Received {}.", kind(value)));
        }
    }

    if errors.is_empty() {
        errors.insert(NON_FIELD_ERRORS.into(), vec!["Invalid data.".into()]);
    }
    ApiError::Validation(errors)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

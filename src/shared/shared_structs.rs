// src/shared/shared_structs.rs

use serde::Serialize;

/// Standard envelope for every API response.
/// `T` is the body type; the body is omitted on errors and bodyless successes.
#[derive(Debug, Serialize)]
pub struct GenericResponse<T> {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")] // Do not serialize 'body' when it is None
    pub body: Option<T>,
}

impl<T> GenericResponse<T> {
    pub fn success(message: impl Into<String>, body: T) -> Self {
        GenericResponse {
            status: "success".to_string(),
            message: message.into(),
            body: Some(body),
        }
    }
}

impl GenericResponse<()> {
    pub fn ok(message: impl Into<String>) -> Self {
        GenericResponse {
            status: "success".to_string(),
            message: message.into(),
            body: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GenericResponse {
            status: "error".to_string(),
            message: message.into(),
            body: None,
        }
    }
}

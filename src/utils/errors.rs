//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del núcleo de préstamos
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    RequestValidation(#[from] validator::ValidationErrors),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Verificar si el error es transitorio (reintentable por el caller)
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::Storage(_))
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                eprintln!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::RequestValidation(e) => {
                eprintln!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(msg) => {
                eprintln!("Validation error: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::MissingField(field) => {
                eprintln!("Missing field: {}", field);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Missing Field".to_string(),
                        message: format!("Required field missing: {}", field),
                        details: Some(json!({ "field": field })),
                        code: Some("MISSING_FIELD".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                eprintln!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                eprintln!("Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                eprintln!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Precondition(msg) => {
                eprintln!("Precondition failed: {}", msg);
                (
                    StatusCode::PRECONDITION_FAILED,
                    ErrorResponse {
                        error: "Precondition Failed".to_string(),
                        message: msg,
                        details: None,
                        code: Some("PRECONDITION_FAILED".to_string()),
                    },
                )
            }

            AppError::Timeout(msg) => {
                eprintln!("Timeout: {}", msg);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorResponse {
                        error: "Timeout".to_string(),
                        message: msg,
                        details: None,
                        code: Some("TIMEOUT".to_string()),
                    },
                )
            }

            AppError::Storage(msg) => {
                eprintln!("Storage error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Storage Error".to_string(),
                        message: "An error occurred while communicating with object storage"
                            .to_string(),
                        details: Some(json!({ "storage_error": msg })),
                        code: Some("STORAGE_ERROR".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => {
                eprintln!("JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "JWT Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("JWT_ERROR".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                eprintln!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación con el campo nombrado
pub fn validation_error(field: &str, message: &str) -> AppError {
    AppError::Validation(format!("{}: {}", field, message))
}

/// Función helper para crear errores de campo faltante
pub fn missing_field_error(field: &str) -> AppError {
    AppError::MissingField(field.to_string())
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = missing_field_error("driver_name");
        match err {
            AppError::MissingField(field) => assert_eq!(field, "driver_name"),
            other => panic!("variante inesperada: {:?}", other),
        }
    }

    #[test]
    fn test_transient_errors() {
        assert!(AppError::Timeout("upload".to_string()).is_transient());
        assert!(AppError::Storage("503".to_string()).is_transient());
        assert!(!AppError::Conflict("vehicle not available".to_string()).is_transient());
        assert!(!AppError::Validation("end_mileage".to_string()).is_transient());
    }
}

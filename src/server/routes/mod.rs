//! HTTP route modules

pub mod health;

use actix_web::HttpResponse;

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error response helpers
pub mod errors {
    use super::*;
    use crate::utils::error::HealthError;

    /// Convert HealthError to a well-formed JSON HTTP response
    pub fn health_error_to_response(error: HealthError) -> HttpResponse {
        let (status, message) = match error {
            HealthError::NotFound(msg) => (actix_web::http::StatusCode::NOT_FOUND, msg),
            HealthError::Config(msg) => (actix_web::http::StatusCode::BAD_REQUEST, msg),
            HealthError::Timeout(msg) => (actix_web::http::StatusCode::GATEWAY_TIMEOUT, msg),
            other => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                other.to_string(),
            ),
        };

        HttpResponse::build(status).json(ApiResponse::<()>::error(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::HealthError;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response = ApiResponse::<()>::error("test error".to_string());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("test error".to_string()));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response =
            errors::health_error_to_response(HealthError::NotFound("no such service".to_string()));
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}

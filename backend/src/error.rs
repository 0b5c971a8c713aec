use actix_web::{HttpResponse, ResponseError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "validation_error".to_string(),
            }),
            AppError::BusinessRule(msg) => HttpResponse::BadRequest().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "business_rule_violation".to_string(),
            }),
            AppError::Authentication(msg) => HttpResponse::Unauthorized().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "authentication_error".to_string(),
            }),
            AppError::Authorization(msg) => HttpResponse::Forbidden().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "authorization_error".to_string(),
            }),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "not_found".to_string(),
            }),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(ErrorBody {
                success: false,
                message: msg.clone(),
                error: "conflict".to_string(),
            }),
            _ => HttpResponse::InternalServerError().json(ErrorBody {
                success: false,
                message: "An internal server error occurred".to_string(),
                error: "internal_server_error".to_string(),
            }),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn taxonomy_maps_to_http_status() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                AppError::BusinessRule("empty cart".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Authentication("no token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Authorization("admins only".into()),
                StatusCode::FORBIDDEN,
            ),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.error_response().status(), expected, "{err}");
        }
    }
}

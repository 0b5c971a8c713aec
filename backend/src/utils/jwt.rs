use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use storefront_shared::{UserRole, JWT_ACCESS_TOKEN_EXPIRY, JWT_REFRESH_TOKEN_EXPIRY};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (user ID)
    pub name: String,       // Display name
    pub email: Option<String>,
    pub role: UserRole,
    pub exp: i64,           // Expiration time
    pub iat: i64,           // Issued at
    pub jti: String,        // JWT ID
    pub token_type: String, // "access" or "refresh"
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new() -> Result<Self, AppError> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal("JWT_SECRET environment variable not set".to_string()))?;

        Self::from_secret(&secret)
    }

    pub fn from_secret(secret: &str) -> Result<Self, AppError> {
        if secret.len() < 32 {
            return Err(AppError::Internal(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iat", "jti"]);
        validation.validate_exp = true;
        validation.leeway = 30; // clock skew

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        name: String,
        email: Option<String>,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.generate_token(user_id, name, email, role, "access", JWT_ACCESS_TOKEN_EXPIRY)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        name: String,
        email: Option<String>,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.generate_token(user_id, name, email, role, "refresh", JWT_REFRESH_TOKEN_EXPIRY)
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        name: String,
        email: Option<String>,
        role: UserRole,
        token_type: &str,
        expiry: std::time::Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now
            + Duration::from_std(expiry)
                .map_err(|_| AppError::Internal("Invalid token expiry duration".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            name,
            email,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to encode JWT: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::Authentication("Invalid token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::Authentication("Invalid token signature".to_string())
                }
                _ => AppError::Authentication(format!("Token validation failed: {}", e)),
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_jwt_service() -> JwtService {
        JwtService::from_secret("test-secret-key-for-testing-only-1234")
            .expect("Failed to create JWT service")
    }

    #[test]
    fn access_token_round_trip() {
        let service = setup_jwt_service();
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(
                user_id,
                "testuser".to_string(),
                Some("test@example.com".to_string()),
                UserRole::Customer,
            )
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.name, "testuser");
        assert_eq!(claims.role, UserRole::Customer);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn refresh_token_carries_type() {
        let service = setup_jwt_service();
        let token = service
            .generate_refresh_token(Uuid::new_v4(), "testuser".to_string(), None, UserRole::Admin)
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.token_type, "refresh");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.email.is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = setup_jwt_service();
        assert!(service.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(JwtService::from_secret("short").is_err());
    }
}

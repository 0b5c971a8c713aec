use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use storefront_shared::{
    AdminRegisterRequest, AuthResponse, GoogleLoginRequest, LoginRequest, RegisterRequest,
    UserResponse, UserRole, BCRYPT_COST, JWT_ACCESS_TOKEN_EXPIRY,
};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::User;
use crate::utils::jwt::JwtService;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Authentication service: password accounts, Google sign-in and admin
/// credentials.
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_service: Arc<JwtService>,
    google_client_id: String,
    http_client: reqwest::Client,
}

/// Claims returned by Google's tokeninfo endpoint for a verified ID token.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl AuthService {
    pub fn new(db_pool: PgPool, jwt_service: Arc<JwtService>, google_client_id: String) -> Self {
        Self {
            db_pool,
            jwt_service,
            google_client_id,
            http_client: reqwest::Client::new(),
        }
    }

    fn issue_tokens(&self, user: &User) -> Result<AuthResponse, AppError> {
        let access_token = self.jwt_service.generate_access_token(
            user.id,
            user.name.clone(),
            user.email.clone(),
            user.role,
        )?;
        let refresh_token = self.jwt_service.generate_refresh_token(
            user.id,
            user.name.clone(),
            user.email.clone(),
            user.role,
        )?;

        Ok(AuthResponse {
            user: user.to_response(),
            access_token,
            refresh_token,
            expires_in: JWT_ACCESS_TOKEN_EXPIRY.as_secs() as i64,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        if let Some(email) = &request.email {
            if User::find_by_email(&self.db_pool, email).await?.is_some() {
                return Err(AppError::Conflict(
                    "User already exists with this email".to_string(),
                ));
            }
        }
        if let Some(phone) = &request.phone {
            if User::find_by_phone(&self.db_pool, phone).await?.is_some() {
                return Err(AppError::Conflict(
                    "User already exists with this phone number".to_string(),
                ));
            }
        }

        let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let user = User::create(
            &self.db_pool,
            &request.name,
            request.email.as_deref(),
            request.phone.as_deref(),
            &password_hash,
            UserRole::Customer,
        )
        .await?;

        info!("Registered user {}", user.id);
        self.issue_tokens(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = User::find_by_email(&self.db_pool, &request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password_hash = user.password_hash.as_deref().ok_or_else(|| {
            AppError::Authentication("Please use Google login for this account".to_string())
        })?;

        let valid = bcrypt::verify(&request.password, password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;
        if !valid {
            return Err(AppError::Authentication("Invalid password".to_string()));
        }

        debug!("User {} logged in", user.id);
        self.issue_tokens(&user)
    }

    /// Token-based Google sign-in. The ID token is verified server-side;
    /// an existing email account is linked on first Google login.
    pub async fn google_login(&self, request: GoogleLoginRequest) -> Result<AuthResponse, AppError> {
        let token_info = self.verify_google_token(&request.id_token).await?;

        let existing = User::find_by_google_or_email(
            &self.db_pool,
            &token_info.sub,
            token_info.email.as_deref(),
        )
        .await?;

        let user = match existing {
            Some(user) if user.google_id.is_none() => {
                info!("Linking Google identity to user {}", user.id);
                User::link_google(
                    &self.db_pool,
                    user.id,
                    &token_info.sub,
                    token_info.picture.as_deref(),
                )
                .await?
            }
            Some(user) => user,
            None => {
                let name = token_info
                    .name
                    .clone()
                    .or_else(|| token_info.email.clone())
                    .unwrap_or_else(|| "Google User".to_string());
                let user = User::create_from_google(
                    &self.db_pool,
                    &name,
                    token_info.email.as_deref(),
                    &token_info.sub,
                    token_info.picture.as_deref(),
                )
                .await?;
                info!("Created user {} from Google sign-in", user.id);
                user
            }
        };

        self.issue_tokens(&user)
    }

    async fn verify_google_token(&self, id_token: &str) -> Result<GoogleTokenInfo, AppError> {
        let response = self
            .http_client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Google token verification failed: {}", e)))?;

        if !response.status().is_success() {
            warn!("Google rejected ID token: {}", response.status());
            return Err(AppError::Authentication(
                "Invalid Google ID token".to_string(),
            ));
        }

        let token_info: GoogleTokenInfo = response
            .json()
            .await
            .map_err(|_| AppError::Authentication("Invalid Google ID token".to_string()))?;

        if token_info.aud != self.google_client_id {
            warn!("Google token audience mismatch");
            return Err(AppError::Authentication(
                "Invalid Google ID token".to_string(),
            ));
        }

        Ok(token_info)
    }

    pub async fn register_admin(
        &self,
        request: AdminRegisterRequest,
    ) -> Result<UserResponse, AppError> {
        if User::find_by_email(&self.db_pool, &request.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Admin already exists".to_string()));
        }

        let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let name = request
            .email
            .split('@')
            .next()
            .unwrap_or("admin")
            .to_string();

        let user = User::create(
            &self.db_pool,
            &name,
            Some(&request.email),
            None,
            &password_hash,
            UserRole::Admin,
        )
        .await?;

        info!("Registered admin {}", user.id);
        Ok(user.to_response())
    }

    pub async fn login_admin(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = User::find_by_email(&self.db_pool, &request.email)
            .await?
            .filter(|user| user.role == UserRole::Admin)
            .ok_or_else(|| {
                AppError::Authentication("Invalid email or password".to_string())
            })?;

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        let valid = bcrypt::verify(&request.password, password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;
        if !valid {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        debug!("Admin {} logged in", user.id);
        self.issue_tokens(&user)
    }
}

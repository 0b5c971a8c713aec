use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use storefront_shared::{UserRole, UserResponse};
use uuid::Uuid;

use crate::error::AppError;

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, google_id, profile_picture, role, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub profile_picture: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a password-backed account.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        password_hash: &str,
        role: UserRole,
    ) -> Result<Self, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Create an account from a verified Google identity.
    pub async fn create_from_google(
        pool: &PgPool,
        name: &str,
        email: Option<&str>,
        google_id: &str,
        profile_picture: Option<&str>,
    ) -> Result<Self, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, google_id, profile_picture)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(google_id)
        .bind(profile_picture)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = $1 AND is_active = TRUE"
        ))
        .bind(phone)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Google sign-in lookup: match on the Google subject first, then fall
    /// back to the verified email so existing accounts can be linked.
    pub async fn find_by_google_or_email(
        pool: &PgPool,
        google_id: &str,
        email: Option<&str>,
    ) -> Result<Option<Self>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE google_id = $1 OR ($2::TEXT IS NOT NULL AND email = $2)
            ORDER BY (google_id = $1) DESC NULLS LAST
            LIMIT 1
            "#
        ))
        .bind(google_id)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Attach a Google identity to an existing email account.
    pub async fn link_google(
        pool: &PgPool,
        id: Uuid,
        google_id: &str,
        profile_picture: Option<&str>,
    ) -> Result<Self, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET google_id = $2, profile_picture = COALESCE($3, profile_picture), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(google_id)
        .bind(profile_picture)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            profile_picture: self.profile_picture.clone(),
            created_at: self.created_at,
        }
    }
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::model::{NewUser, User, UserSummary, UserUpdate};

const FULL_COLUMNS: &str = "id, slug, first_name, last_name, email, organization, \
     password_hash, role, password_changed_at, password_reset_token, \
     password_reset_expires, active, created_at";

impl User {
    /// Full row, including the stored hash. Used by the login flow; email is
    /// expected to be normalized already.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {FULL_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Full row by ID, for writes that merge onto the current record.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {FULL_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new_user: &NewUser) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (slug, first_name, last_name, email, organization, password_hash, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {FULL_COLUMNS}"
        ))
        .bind(&new_user.slug)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(&new_user.organization)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn apply_update(
        db: &PgPool,
        id: Uuid,
        update: &UserUpdate,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET slug = $2, first_name = $3, last_name = $4, organization = $5,
                 password_hash = COALESCE($6, password_hash),
                 password_changed_at = COALESCE($7, password_changed_at)
             WHERE id = $1
             RETURNING {FULL_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.slug)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.organization)
        .bind(&update.password_hash)
        .bind(update.password_changed_at)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

impl UserSummary {
    /// Default read shape: no password hash, active flag or creation timestamp.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<UserSummary>, ApiError> {
        let user = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, slug, first_name, last_name, email, organization, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(
        db: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, ApiError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, slug, first_name, last_name, email, organization, role
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}

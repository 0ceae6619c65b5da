use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::dto::{CreateUserRequest, UpdateMeRequest};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Full user row. Write-only fields are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub password_changed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<OffsetDateTime>,
    pub active: bool,
    pub created_at: OffsetDateTime,
}

/// Default read shape: password hash, active flag and creation timestamp are
/// only selected when explicitly asked for.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub role: Role,
}

/// Validated, normalized input ready to persist. The confirmation field never
/// makes it this far.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub password_hash: String,
    pub role: Role,
}

/// Column changes produced by an update. `password_hash` is `Some` only when
/// the password actually changed.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub password_hash: Option<String>,
    pub password_changed_at: Option<OffsetDateTime>,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `lowercase(first-last)`, reduced to hyphen-separated alphanumeric runs.
pub fn derive_slug(first_name: &str, last_name: &str) -> String {
    slugify(&format!("{first_name}-{last_name}"))
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}

pub fn validate_new_user(req: &CreateUserRequest) -> Result<(), ApiError> {
    if req.first_name.trim().is_empty() {
        return Err(ApiError::validation("Please input your first name"));
    }
    if req.last_name.trim().is_empty() {
        return Err(ApiError::validation("Please input your last name"));
    }
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(ApiError::validation("Please input your email address"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Please provide a valid email"));
    }
    if req.organization.trim().is_empty() {
        return Err(ApiError::validation("Please input your organization"));
    }
    validate_password(&req.password, &req.password_confirm)
}

pub fn validate_password(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(
            "Please input a password with at least 8 characters",
        ));
    }
    if password != password_confirm {
        return Err(ApiError::validation("Passwords are not the same"));
    }
    Ok(())
}

/// Checks the partial fields of an update; presence checks only apply to the
/// fields actually supplied.
pub fn validate_update(req: &UpdateMeRequest) -> Result<(), ApiError> {
    if matches!(&req.first_name, Some(v) if v.trim().is_empty()) {
        return Err(ApiError::validation("Please input your first name"));
    }
    if matches!(&req.last_name, Some(v) if v.trim().is_empty()) {
        return Err(ApiError::validation("Please input your last name"));
    }
    if matches!(&req.organization, Some(v) if v.trim().is_empty()) {
        return Err(ApiError::validation("Please input your organization"));
    }
    if let Some(password) = &req.password {
        let confirm = req.password_confirm.as_deref().unwrap_or("");
        validate_password(password, confirm)?;
    } else if req.password_confirm.is_some() {
        return Err(ApiError::validation("Passwords are not the same"));
    }
    Ok(())
}

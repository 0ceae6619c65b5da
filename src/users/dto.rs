use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::model::{Role, User, UserSummary};

/// Request body for creating a user. The confirmation field lives only here;
/// it is checked against `password` once and never persisted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub password: String,
    pub password_confirm: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial update of the caller's own record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub slug: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            slug: user.slug,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            organization: user.organization,
            role: user.role,
        }
    }
}

impl From<UserSummary> for UserResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            slug: user.slug,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            organization: user.organization,
            role: user.role,
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

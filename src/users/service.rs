//! Write path for the user resource. Each write is an explicit sequence:
//! validate, normalize, derive the slug, hash the password, then persist.

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::users::dto::{CreateUserRequest, UpdateMeRequest};
use crate::users::model::{
    derive_slug, normalize_email, validate_new_user, validate_update, NewUser, Role, User,
    UserUpdate,
};
use crate::users::password::hash_password;

/// Validate and transform a create request into a persistable record.
/// Fails before any I/O; the confirmation field is dropped here.
pub async fn prepare_new_user(req: &CreateUserRequest) -> Result<NewUser, ApiError> {
    validate_new_user(req)?;

    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    let slug = derive_slug(&first_name, &last_name);
    let email = normalize_email(&req.email);
    let organization = req.organization.trim().to_string();
    let password_hash = hash_password(&req.password, None).await?;

    Ok(NewUser {
        slug,
        first_name,
        last_name,
        email,
        organization,
        password_hash,
        role: Role::default(),
    })
}

pub async fn create_user(db: &PgPool, req: &CreateUserRequest) -> Result<User, ApiError> {
    let new_user = prepare_new_user(req).await?;
    // Friendlier error than the unique-index violation; the index still
    // backstops concurrent writes.
    if User::find_by_email(db, &new_user.email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }
    User::create(db, &new_user).await
}

/// Merge an update onto the current record. The slug is re-derived from the
/// resulting names on every write; the hash is recomputed only when the
/// password changed.
pub async fn prepare_update(
    current: &User,
    req: &UpdateMeRequest,
) -> Result<UserUpdate, ApiError> {
    validate_update(req)?;

    let first_name = req
        .first_name
        .as_deref()
        .unwrap_or(&current.first_name)
        .trim()
        .to_string();
    let last_name = req
        .last_name
        .as_deref()
        .unwrap_or(&current.last_name)
        .trim()
        .to_string();
    let organization = req
        .organization
        .as_deref()
        .unwrap_or(&current.organization)
        .trim()
        .to_string();
    let slug = derive_slug(&first_name, &last_name);

    let (password_hash, password_changed_at) = match &req.password {
        Some(password) => (
            Some(hash_password(password, None).await?),
            Some(OffsetDateTime::now_utc()),
        ),
        None => (None, None),
    };

    Ok(UserUpdate {
        slug,
        first_name,
        last_name,
        organization,
        password_hash,
        password_changed_at,
    })
}

pub async fn update_user(
    db: &PgPool,
    current: &User,
    req: &UpdateMeRequest,
) -> Result<User, ApiError> {
    let update = prepare_update(current, req).await?;
    User::apply_update(db, current.id, &update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::password::verify_password;
    use uuid::Uuid;

    fn jane() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "JANE@Test.com".into(),
            organization: "Acme".into(),
            password: "secret123".into(),
            password_confirm: "secret123".into(),
        }
    }

    fn stored_user(password_hash: &str) -> User {
        User {
            id: Uuid::new_v4(),
            slug: "jane-doe".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@test.com".into(),
            organization: "Acme".into(),
            password_hash: password_hash.into(),
            role: Role::User,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn prepare_new_user_normalizes_and_hashes() {
        let new_user = prepare_new_user(&jane()).await.expect("prepare");
        assert_eq!(new_user.email, "jane@test.com");
        assert_eq!(new_user.slug, "jane-doe");
        assert_eq!(new_user.role, Role::User);
        assert_ne!(new_user.password_hash, "secret123");
        assert!(verify_password("secret123", &new_user.password_hash)
            .await
            .expect("verify"));
    }

    #[tokio::test]
    async fn prepare_new_user_rejects_confirm_mismatch() {
        let mut req = jane();
        req.password_confirm = "secret124".into();
        let err = prepare_new_user(&req).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rederives_slug_from_new_names() {
        let current = stored_user("$2b$12$unchanged");
        let req = UpdateMeRequest {
            last_name: Some("Smith".into()),
            ..Default::default()
        };
        let update = prepare_update(&current, &req).await.expect("prepare");
        assert_eq!(update.slug, "jane-smith");
        assert_eq!(update.first_name, "Jane");
        assert!(update.password_hash.is_none());
        assert!(update.password_changed_at.is_none());
    }

    #[tokio::test]
    async fn update_with_password_rehashes_and_stamps() {
        let current = stored_user("$2b$12$old");
        let req = UpdateMeRequest {
            password: Some("newsecret1".into()),
            password_confirm: Some("newsecret1".into()),
            ..Default::default()
        };
        let update = prepare_update(&current, &req).await.expect("prepare");
        let hash = update.password_hash.expect("hash present");
        assert_ne!(hash, "newsecret1");
        assert!(update.password_changed_at.is_some());
        assert!(verify_password("newsecret1", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn update_password_boundary() {
        let current = stored_user("$2b$12$old");
        let req = UpdateMeRequest {
            password: Some("seven77".into()),
            password_confirm: Some("seven77".into()),
            ..Default::default()
        };
        assert!(prepare_update(&current, &req).await.is_err());
    }
}

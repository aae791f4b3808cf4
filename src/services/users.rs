use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::access::{Role, SecretariatAssignment};
use crate::auth::password::{hash_password, PasswordError};
use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(msg) => ApiError::validation_error(msg, None),
            UserServiceError::DuplicateUsername(name) => {
                ApiError::conflict(format!("Username already exists: {}", name))
            }
            UserServiceError::Password(e) => e.into(),
            UserServiceError::Database(e) => e.into(),
            UserServiceError::Sqlx(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
    pub mandal_name: Option<String>,
    pub assignments: Vec<SecretariatAssignment>,
}

/// Enforces the per-role shape the schema does not: a secretary carries
/// exactly one mandal, a field officer carries assignments, an admin
/// carries neither.
fn validate_shape(new: &NewUser) -> Result<(), UserServiceError> {
    match new.role {
        Role::Admin => {
            if new.mandal_name.is_some() || !new.assignments.is_empty() {
                return Err(UserServiceError::Validation(
                    "Admin accounts carry no mandal or secretariat assignments".into(),
                ));
            }
        }
        Role::PanchayatSecretary => {
            if new
                .mandal_name
                .as_deref()
                .map(|m| m.trim().is_empty())
                .unwrap_or(true)
            {
                return Err(UserServiceError::Validation(
                    "Mandal officer accounts require an assigned mandal".into(),
                ));
            }
            if !new.assignments.is_empty() {
                return Err(UserServiceError::Validation(
                    "Mandal officer accounts do not carry secretariat assignments".into(),
                ));
            }
        }
        Role::FieldOfficer => {
            if new.assignments.is_empty() {
                return Err(UserServiceError::Validation(
                    "Field officer accounts require at least one secretariat assignment".into(),
                ));
            }
        }
    }
    if new.username.trim().is_empty() {
        return Err(UserServiceError::Validation("Username is required".into()));
    }
    if new.password.len() < 8 {
        return Err(UserServiceError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let repo = Repository::<User>::new("users", pool.clone());
    repo.select_one(FilterData {
        where_clause: Some(json!({ "username": username })),
        ..Default::default()
    })
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let repo = Repository::<User>::new("users", pool.clone());
    repo.select_one(FilterData {
        where_clause: Some(json!({ "id": id })),
        ..Default::default()
    })
    .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, DatabaseError> {
    let repo = Repository::<User>::new("users", pool.clone());
    repo.select_any(FilterData {
        order: Some(json!("username asc")),
        ..Default::default()
    })
    .await
}

pub async fn create_user(pool: &PgPool, new: NewUser) -> Result<User, UserServiceError> {
    validate_shape(&new)?;

    if find_by_username(pool, new.username.trim()).await?.is_some() {
        return Err(UserServiceError::DuplicateUsername(
            new.username.trim().to_string(),
        ));
    }

    let password_hash = hash_password(&new.password)?;
    let assignments_blob = if new.assignments.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&new.assignments).expect("assignments serialize"))
    };

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users \
         (id, username, password_hash, display_name, role, mandal_name, assigned_secretariats, \
          is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, true, now(), now()) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.username.trim())
    .bind(&password_hash)
    .bind(new.display_name.trim())
    .bind(new.role.as_str())
    .bind(&new.mandal_name)
    .bind(&assignments_blob)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<bool, UserServiceError> {
    let result = sqlx::query("UPDATE users SET is_active = $1, updated_at = now() WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn reset_password(
    pool: &PgPool,
    id: Uuid,
    new_password: &str,
) -> Result<bool, UserServiceError> {
    if new_password.len() < 8 {
        return Err(UserServiceError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    let password_hash = hash_password(new_password)?;
    let result =
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&password_hash)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_login(pool: &PgPool, id: Uuid) -> Result<(), UserServiceError> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn officer(assignments: Vec<SecretariatAssignment>) -> NewUser {
        NewUser {
            username: "fo_kuppam_1".into(),
            password: "kuppam@2024".into(),
            display_name: "Officer".into(),
            role: Role::FieldOfficer,
            mandal_name: None,
            assignments,
        }
    }

    #[test]
    fn field_officer_requires_assignments() {
        assert!(matches!(
            validate_shape(&officer(vec![])),
            Err(UserServiceError::Validation(_))
        ));
        assert!(validate_shape(&officer(vec![SecretariatAssignment::new(
            "KUPPAM", "KUPPAM-1"
        )]))
        .is_ok());
    }

    #[test]
    fn secretary_requires_mandal() {
        let new = NewUser {
            username: "ps_kuppam".into(),
            password: "kuppam@2024".into(),
            display_name: "Secretary".into(),
            role: Role::PanchayatSecretary,
            mandal_name: None,
            assignments: vec![],
        };
        assert!(matches!(
            validate_shape(&new),
            Err(UserServiceError::Validation(_))
        ));
    }

    #[test]
    fn admin_carries_no_scope_columns() {
        let new = NewUser {
            username: "admin".into(),
            password: "chittoor@2024".into(),
            display_name: "Admin".into(),
            role: Role::Admin,
            mandal_name: Some("KUPPAM".into()),
            assignments: vec![],
        };
        assert!(matches!(
            validate_shape(&new),
            Err(UserServiceError::Validation(_))
        ));
    }

    #[test]
    fn short_password_rejected() {
        let mut new = officer(vec![SecretariatAssignment::new("KUPPAM", "KUPPAM-1")]);
        new.password = "short".into();
        assert!(matches!(
            validate_shape(&new),
            Err(UserServiceError::Validation(_))
        ));
    }
}

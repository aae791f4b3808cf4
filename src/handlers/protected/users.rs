use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::access::{Role, SecretariatAssignment, UserScope};
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::users as user_service;

fn user_to_api_value(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": &user.username,
        "display_name": &user.display_name,
        "role": &user.role,
        "mandal_name": &user.mandal_name,
        "assignments": crate::access::parse_assigned_secretariats(
            user.assigned_secretariats.as_deref()
        ),
        "is_active": user.is_active,
        "last_login_at": user.last_login_at,
        "created_at": user.created_at,
    })
}

/// Accounts visible to the caller: admins see everyone; mandal officers see
/// the field officers working inside their mandal.
fn visible_to(scope: &UserScope, user: &User) -> bool {
    match scope.role {
        Role::Admin => true,
        Role::PanchayatSecretary => {
            let Some(mandal) = scope.mandal_name.as_deref() else {
                return false;
            };
            match user.scope() {
                Ok(target) => {
                    target.role == Role::FieldOfficer
                        && target.assignments.iter().any(|a| a.mandal_name == mandal)
                }
                Err(_) => false,
            }
        }
        Role::FieldOfficer => false,
    }
}

/// GET /api/users
pub async fn users_list(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    if auth.scope.role == Role::FieldOfficer {
        return Err(ApiError::forbidden("Field officers cannot manage accounts"));
    }

    let pool = DatabaseManager::pool().await?;
    let users = user_service::list_users(&pool).await?;
    let visible: Vec<Value> = users
        .iter()
        .filter(|u| visible_to(&auth.scope, u))
        .map(user_to_api_value)
        .collect();

    Ok(ApiResponse::success(json!({ "users": visible })))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: String,
    pub mandal_name: Option<String>,
    #[serde(default)]
    pub assignments: Vec<SecretariatAssignment>,
}

/// POST /api/users
///
/// Gated by the role whitelist. A mandal officer can only create field
/// officers, and only with assignments inside their own mandal - account
/// creation must never hand out more scope than the creator holds.
pub async fn users_create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<Value> {
    let target_role: Role = payload
        .role
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown role: {}", payload.role)))?;

    if !auth.scope.role.can_manage(target_role) {
        return Err(ApiError::forbidden(format!(
            "Your role cannot manage {} accounts",
            target_role.as_str()
        )));
    }

    if auth.scope.role == Role::PanchayatSecretary {
        let own_mandal = auth
            .scope
            .mandal_name
            .as_deref()
            .ok_or(crate::access::AccessError::MissingMandal)?;
        if let Some(outside) = payload
            .assignments
            .iter()
            .find(|a| a.mandal_name != own_mandal)
        {
            return Err(ApiError::forbidden(format!(
                "Assignment {}/{} is outside your mandal",
                outside.mandal_name, outside.sec_name
            )));
        }
    }

    let pool = DatabaseManager::pool().await?;
    let user = user_service::create_user(
        &pool,
        user_service::NewUser {
            username: payload.username,
            password: payload.password,
            display_name: payload.display_name,
            role: target_role,
            mandal_name: payload.mandal_name,
            assignments: payload.assignments,
        },
    )
    .await?;

    Ok(ApiResponse::created(user_to_api_value(&user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

async fn load_managed_user(auth: &AuthUser, id: Uuid) -> Result<User, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = user_service::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let target_role = user.parsed_role()?;
    if !auth.scope.role.can_manage(target_role) {
        return Err(ApiError::forbidden(format!(
            "Your role cannot manage {} accounts",
            target_role.as_str()
        )));
    }
    // Managing an account also requires being able to see it.
    if !visible_to(&auth.scope, &user) && auth.scope.role != Role::Admin {
        return Err(ApiError::forbidden("Account is outside your mandal"));
    }
    Ok(user)
}

/// PUT /api/users/:id - activate/deactivate or reset password
pub async fn users_update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Value> {
    let user = load_managed_user(&auth, id).await?;
    let pool = DatabaseManager::pool().await?;

    if let Some(active) = payload.is_active {
        user_service::set_active(&pool, user.id, active).await?;
    }
    if let Some(password) = payload.password.as_deref() {
        user_service::reset_password(&pool, user.id, password).await?;
    }

    let refreshed = user_service::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user_to_api_value(&refreshed)))
}

/// DELETE /api/users/:id
pub async fn users_delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    if auth.user_id == id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let user = load_managed_user(&auth, id).await?;
    let pool = DatabaseManager::pool().await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .map_err(|e| crate::database::manager::DatabaseError::Sqlx(e))?;

    Ok(ApiResponse::success(json!({ "deleted": user.id })))
}

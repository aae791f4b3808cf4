use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, Claims};
use crate::auth::password::verify_password;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::users;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - authenticate and receive a JWT
///
/// The token carries the account's role, mandal and parsed secretariat
/// assignments; protected handlers scope every query from those claims.
pub async fn login_post(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let user = users::find_by_username(&pool, payload.username.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    if !user.is_active {
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    // Unknown role strings or stale assignment blobs surface here, before a
    // token is ever issued.
    let scope = user.scope()?;

    users::record_login(&pool, user.id).await.map_err(|e| {
        tracing::warn!("Failed to record login for {}: {}", user.username, e);
        ApiError::internal_server_error("Login failed")
    })?;

    let claims = Claims::new(
        user.id,
        user.username.clone(),
        scope.role.as_str().to_string(),
        scope.mandal_name.clone(),
        scope.assignments.clone(),
    );
    let expires_in = crate::config::config().security.jwt_expiry_hours * 3600;
    let token = generate_jwt(claims)?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "display_name": user.display_name,
            "role": scope.role.as_str(),
            "mandal_name": scope.mandal_name,
            "assignments": scope.assignments,
        },
        "expires_in": expires_in,
    })))
}

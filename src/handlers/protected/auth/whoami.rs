use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - the caller's identity and access scope
pub async fn whoami_get(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": auth.user_id,
        "username": auth.username,
        "role": auth.scope.role.as_str(),
        "mandal_name": auth.scope.mandal_name,
        "assignments": auth.scope.assignments,
    })))
}

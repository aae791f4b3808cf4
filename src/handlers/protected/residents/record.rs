use axum::extract::Path;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::access::can_access_resident;
use crate::api::format::resident_to_api_value;
use crate::database::manager::DatabaseManager;
use crate::database::models::Resident;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::residents::{
    apply_contact_changes, normalize_health_id, normalize_mobile, FieldChange,
};

use super::client_ip;

async fn fetch_resident(id: i64) -> Result<Resident, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Resident>::new("residents", pool);
    repo.select_one(FilterData {
        where_clause: Some(json!({ "id": id })),
        ..Default::default()
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Resident not found"))
}

/// GET /api/residents/:id
///
/// Direct-id lookups bypass the scoped list query, so the fetched record is
/// re-validated against the caller's scope before it is returned.
pub async fn resident_get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let resident = fetch_resident(id).await?;

    if !can_access_resident(&auth.scope, &resident.mandal_name, &resident.sec_name) {
        return Err(ApiError::forbidden(
            "Resident is outside your assigned area",
        ));
    }

    Ok(ApiResponse::success(resident_to_api_value(&resident)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub mobile_number: Option<String>,
    pub health_id: Option<String>,
}

/// PUT /api/residents/:id - update contact fields
///
/// Only the mobile number and health ID are editable through the API. Every
/// accepted change writes an UpdateLog row in the same transaction. There is
/// no concurrency token; the last accepted write wins.
pub async fn resident_put(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateContactRequest>,
) -> ApiResult<Value> {
    let resident = fetch_resident(id).await?;

    if !can_access_resident(&auth.scope, &resident.mandal_name, &resident.sec_name) {
        return Err(ApiError::forbidden(
            "Resident is outside your assigned area",
        ));
    }

    let mut field_errors: HashMap<String, String> = HashMap::new();
    let mut changes: Vec<FieldChange> = Vec::new();

    if let Some(raw) = payload.mobile_number.as_deref() {
        match normalize_mobile(raw) {
            Ok(normalized) => {
                if resident.mobile_number.as_deref() != Some(normalized.as_str()) {
                    changes.push(FieldChange {
                        field_name: "mobile_number",
                        old_value: resident.mobile_number.clone(),
                        new_value: Some(normalized),
                    });
                }
            }
            Err(msg) => {
                field_errors.insert("mobile_number".into(), msg);
            }
        }
    }

    if let Some(raw) = payload.health_id.as_deref() {
        match normalize_health_id(raw) {
            Ok(normalized) => {
                if resident.health_id.as_deref() != Some(normalized.as_str()) {
                    changes.push(FieldChange {
                        field_name: "health_id",
                        old_value: resident.health_id.clone(),
                        new_value: Some(normalized),
                    });
                }
            }
            Err(msg) => {
                field_errors.insert("health_id".into(), msg);
            }
        }
    }

    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Invalid contact fields",
            Some(field_errors),
        ));
    }

    if changes.is_empty() {
        return Ok(ApiResponse::success(resident_to_api_value(&resident)));
    }

    let pool = DatabaseManager::pool().await?;
    let ip = client_ip(&headers);
    apply_contact_changes(&pool, &resident, &changes, auth.user_id, ip.as_deref())
        .await
        .map_err(ApiError::from)?;

    let updated = fetch_resident(id).await?;
    Ok(ApiResponse::success(resident_to_api_value(&updated)))
}

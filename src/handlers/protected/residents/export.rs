use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::access::{AccessFilter, Role, SecretariatAssignment};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::export::{export_filename, fetch_residents, residents_to_csv};
use crate::services::users;

use super::{combine_and, scoped_where, ResidentQuery};

/// GET /api/residents/export - CSV download
///
/// Same filter semantics as the list endpoint. The optional `officers`
/// parameter (admins and mandal officers only) restricts the export to the
/// secretariats covered by the selected field-officer accounts; the result
/// is still intersected with the caller's own scope, so it can only shrink.
pub async fn residents_export(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ResidentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut clauses = Vec::new();
    if let Some(w) = scoped_where(&auth.scope, &query)? {
        clauses.push(w);
    }

    if let Some(officers) = query.officers.as_deref().filter(|s| !s.trim().is_empty()) {
        if auth.scope.role == Role::FieldOfficer {
            return Err(ApiError::forbidden(
                "Field officers cannot filter exports by officer",
            ));
        }
        clauses.push(officers_where(officers).await?);
    }

    let pool = DatabaseManager::pool().await?;
    let residents = fetch_residents(&pool, combine_and(clauses)).await?;
    let csv = residents_to_csv(&residents);

    tracing::info!(
        user = %auth.username,
        rows = residents.len(),
        "residents export"
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename("residents")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|_| ApiError::internal_server_error("Invalid export filename"))?,
    );

    Ok((StatusCode::OK, headers, csv))
}

/// Resolves selected officer accounts to the union of their assignment
/// pairs. Officers with no usable assignments contribute nothing; if the
/// whole selection has no pairs the export matches nothing rather than
/// falling open.
async fn officers_where(raw: &str) -> Result<Value, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let mut pairs: Vec<SecretariatAssignment> = Vec::new();

    for token in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id: Uuid = token
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid officer id: {}", token)))?;
        let Some(user) = users::find_by_id(&pool, id).await? else {
            continue;
        };
        if let Ok(scope) = user.scope() {
            pairs.extend(scope.assignments);
        }
    }

    let filter = if pairs.is_empty() {
        AccessFilter::DenyAll
    } else {
        AccessFilter::Secretariats(pairs)
    };
    Ok(filter.to_where().unwrap_or_else(|| json!({})))
}

use axum::extract::Query;
use axum::Extension;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::analytics::mandal_summary;

use super::residents::{scoped_where, ResidentQuery};

/// GET /api/analytics/summary - per-mandal coverage within the caller's scope
pub async fn analytics_summary(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ResidentQuery>,
) -> ApiResult<Value> {
    let where_doc = scoped_where(&auth.scope, &query)?;

    let pool = DatabaseManager::pool().await?;
    let summary = mandal_summary(&pool, where_doc.as_ref()).await?;

    let totals = summary.iter().fold((0i64, 0i64, 0i64), |acc, m| {
        (
            acc.0 + m.total,
            acc.1 + m.with_mobile,
            acc.2 + m.with_health_id,
        )
    });

    Ok(ApiResponse::success(json!({
        "mandals": summary,
        "totals": {
            "residents": totals.0,
            "with_mobile": totals.1,
            "with_health_id": totals.2,
        },
    })))
}

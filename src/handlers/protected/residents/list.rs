use axum::extract::Query;
use axum::Extension;
use serde_json::{json, Value};

use crate::api::format::resident_to_api_value;
use crate::database::manager::DatabaseManager;
use crate::database::models::Resident;
use crate::database::Repository;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::{scoped_where, ResidentQuery};

/// GET /api/residents - paginated, role-scoped resident listing
pub async fn residents_list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ResidentQuery>,
) -> ApiResult<Value> {
    let where_doc = scoped_where(&auth.scope, &query)?;

    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Resident>::new("residents", pool);

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(crate::config::config().api.default_page_size)
        .max(1);

    let total = repo
        .count(FilterData {
            where_clause: where_doc.clone(),
            ..Default::default()
        })
        .await?;

    let residents = repo
        .select_any(FilterData {
            where_clause: where_doc,
            order: Some(json!("mandal_name asc, sec_name asc, id asc")),
            limit: Some(limit),
            offset: Some((page - 1) * limit),
            ..Default::default()
        })
        .await?;

    Ok(ApiResponse::success(json!({
        "residents": residents.iter().map(resident_to_api_value).collect::<Vec<_>>(),
        "total": total,
        "page": page,
        "limit": limit,
    })))
}

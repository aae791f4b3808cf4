use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::bind_value;
use crate::filter::filter_where::FilterWhere;

/// Coverage rollup for one mandal within the caller's permitted set.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MandalSummary {
    pub mandal_name: String,
    pub total: i64,
    pub with_mobile: i64,
    pub with_health_id: i64,
}

/// Per-mandal resident counts and contact/health-ID coverage.
///
/// `where_doc` is the already-merged access + user filter; the aggregation
/// itself is delegated to the database.
pub async fn mandal_summary(
    pool: &PgPool,
    where_doc: Option<&Value>,
) -> Result<Vec<MandalSummary>, DatabaseError> {
    let (where_sql, params) = match where_doc {
        Some(doc) => FilterWhere::generate(doc, 0)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?,
        None => (String::new(), vec![]),
    };

    let mut query = String::from(
        "SELECT mandal_name, \
         COUNT(*) AS total, \
         COUNT(*) FILTER (WHERE mobile_number IS NOT NULL AND mobile_number <> '') AS with_mobile, \
         COUNT(*) FILTER (WHERE health_id IS NOT NULL AND health_id <> '') AS with_health_id \
         FROM residents",
    );
    if !where_sql.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&where_sql);
    }
    query.push_str(" GROUP BY mandal_name ORDER BY mandal_name");

    let mut q = sqlx::query(&query);
    for p in params.iter() {
        q = bind_value(q, p);
    }
    let rows = q.fetch_all(pool).await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(MandalSummary {
            mandal_name: row.try_get("mandal_name")?,
            total: row.try_get("total")?,
            with_mobile: row.try_get("with_mobile")?,
            with_health_id: row.try_get("with_health_id")?,
        });
    }
    Ok(out)
}

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Typed wrapper that compiles a [`FilterData`] against one table and runs
/// the resulting SQL, binding compiled parameters in placeholder order.
pub struct QueryBuilder<T> {
    table_name: String,
    filter: Option<Filter>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        // Reuse Filter table name validation
        Filter::new(&name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            table_name: name,
            filter: None,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        let mut filter =
            Filter::new(&self.table_name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        self.filter = Some(filter);
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_one(self, pool: &PgPool) -> Result<T, DatabaseError> {
        let sql_result = self.sql_result()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value_as(q, p);
        }
        let row = q.fetch_one(pool).await?;
        Ok(row)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value_as(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = if let Some(filter) = self.filter {
            filter
                .to_count_sql()
                .map_err(|e| DatabaseError::QueryError(e.to_string()))?
        } else {
            SqlResult {
                query: format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name),
                params: vec![],
            }
        };

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value(q, p);
        }
        let row = q.fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    fn sql_result(&self) -> Result<SqlResult, DatabaseError> {
        if let Some(filter) = &self.filter {
            filter
                .to_sql()
                .map_err(|e| DatabaseError::QueryError(e.to_string()))
        } else {
            Ok(SqlResult {
                query: format!("SELECT * FROM \"{}\"", self.table_name),
                params: vec![],
            })
        }
    }
}

/// A compiled JSON parameter resolved to the Postgres type it should bind
/// as. Filter documents arrive as JSON, but several columns in this schema
/// are strongly typed (`uuid`, `timestamptz`, `date`), and Postgres will not
/// compare those against a TEXT parameter. String values are therefore
/// sniffed: exact UUID, RFC 3339 timestamp and `YYYY-MM-DD` shapes bind as
/// their native types. Registry names and codes never take those shapes.
enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text(String),
    Json(Value),
}

fn classify(v: &Value) -> SqlParam {
    match v {
        Value::Null => SqlParam::Null,
        Value::Bool(b) => SqlParam::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlParam::Int(i)
            } else if let Some(u) = n.as_u64() {
                SqlParam::Int(u as i64)
            } else {
                SqlParam::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => {
            if s.len() == 36 && s.as_bytes().get(8) == Some(&b'-') {
                if let Ok(id) = Uuid::parse_str(s) {
                    return SqlParam::Uuid(id);
                }
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return SqlParam::Timestamp(ts.with_timezone(&Utc));
            }
            if s.len() == 10 {
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return SqlParam::Date(date);
                }
            }
            SqlParam::Text(s.clone())
        }
        // Arrays are expanded into individual placeholders by the WHERE
        // compiler and never reach a binder.
        Value::Array(_) => SqlParam::Null,
        Value::Object(_) => SqlParam::Json(v.clone()),
    }
}

pub(crate) fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match classify(v) {
        SqlParam::Null => q.bind(None::<String>),
        SqlParam::Bool(b) => q.bind(b),
        SqlParam::Int(i) => q.bind(i),
        SqlParam::Float(f) => q.bind(f),
        SqlParam::Uuid(id) => q.bind(id),
        SqlParam::Timestamp(ts) => q.bind(ts),
        SqlParam::Date(date) => q.bind(date),
        SqlParam::Text(s) => q.bind(s),
        SqlParam::Json(j) => q.bind(j),
    }
}

fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match classify(v) {
        SqlParam::Null => q.bind(None::<String>),
        SqlParam::Bool(b) => q.bind(b),
        SqlParam::Int(i) => q.bind(i),
        SqlParam::Float(f) => q.bind(f),
        SqlParam::Uuid(id) => q.bind(id),
        SqlParam::Timestamp(ts) => q.bind(ts),
        SqlParam::Date(date) => q.bind(date),
        SqlParam::Text(s) => q.bind(s),
        SqlParam::Json(j) => q.bind(j),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sniffs_typed_string_shapes() {
        assert!(matches!(
            classify(&json!("3f2b8e4a-9c1d-4e6f-8a2b-5c7d9e1f3a5b")),
            SqlParam::Uuid(_)
        ));
        assert!(matches!(
            classify(&json!("2024-06-01T00:00:00+00:00")),
            SqlParam::Timestamp(_)
        ));
        assert!(matches!(classify(&json!("2024-06-01")), SqlParam::Date(_)));
    }

    #[test]
    fn registry_values_stay_text() {
        assert!(matches!(classify(&json!("KUPPAM")), SqlParam::Text(_)));
        assert!(matches!(classify(&json!("TERUVEEDHI-03")), SqlParam::Text(_)));
        assert!(matches!(classify(&json!("9876543210")), SqlParam::Text(_)));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only audit record of a single field change on a resident.
///
/// Written in the same transaction as the mutation it records; deleted only
/// by `cleanup purge-logs`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UpdateLog {
    pub id: i64,
    pub resident_id: i64,
    pub user_id: Uuid,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

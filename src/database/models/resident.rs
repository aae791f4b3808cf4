use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One registry row per citizen.
///
/// A resident belongs to exactly one (mandal, secretariat) pair at a time,
/// but the numeric `mandal_code`/`sec_code` columns have historically carried
/// several codes for the same logical unit; `cleanup unify-codes` reconciles
/// them against the PHC master list. `mobile_number_old` is the legacy
/// duplicate contact column kept until `cleanup dedupe-mobiles` clears it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resident {
    pub id: i64,
    pub name: String,
    pub uid: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub mobile_number: Option<String>,
    pub mobile_number_old: Option<String>,
    pub health_id: Option<String>,
    pub district: String,
    pub mandal_name: String,
    pub mandal_code: Option<i32>,
    pub sec_name: String,
    pub sec_code: Option<i32>,
    pub rural_urban: Option<String>,
    pub phc_name: Option<String>,
    pub cluster: Option<String>,
    pub door_no: Option<String>,
    pub address: Option<String>,
    pub address_eng: Option<String>,
    pub household_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::api::format::mask_uid;
use crate::database::manager::DatabaseError;
use crate::database::models::Resident;
use crate::database::Repository;
use crate::filter::FilterData;
use crate::services::csv;

pub const EXPORT_HEADERS: [&str; 16] = [
    "id",
    "name",
    "uid",
    "date_of_birth",
    "gender",
    "mobile_number",
    "health_id",
    "district",
    "mandal_name",
    "sec_name",
    "sec_code",
    "rural_urban",
    "phc_name",
    "cluster",
    "door_no",
    "household_id",
];

/// Fetches residents for export under an already-scoped WHERE document,
/// ordered for stable output. Exports are not paginated; the configured
/// row ceiling is a backstop against runaway result sets.
pub async fn fetch_residents(
    pool: &PgPool,
    where_doc: Option<Value>,
) -> Result<Vec<Resident>, DatabaseError> {
    let repo = Repository::<Resident>::new("residents", pool.clone());
    let filter = FilterData {
        where_clause: where_doc,
        order: Some(json!("mandal_name asc, sec_name asc, id asc")),
        ..Default::default()
    };
    let mut residents = repo.select_any(filter).await?;

    let max_rows = crate::config::config().api.max_export_rows as usize;
    if residents.len() > max_rows {
        tracing::warn!(
            rows = residents.len(),
            max_rows,
            "export exceeds configured ceiling, truncating"
        );
        residents.truncate(max_rows);
    }

    Ok(residents)
}

/// Renders residents as CSV with the UID masked.
pub fn residents_to_csv(residents: &[Resident]) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_HEADERS.join(","));
    out.push('\n');

    for r in residents {
        let fields: Vec<String> = vec![
            r.id.to_string(),
            r.name.clone(),
            r.uid.as_deref().map(mask_uid).unwrap_or_default(),
            r.date_of_birth
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            r.gender.clone().unwrap_or_default(),
            r.mobile_number.clone().unwrap_or_default(),
            r.health_id.clone().unwrap_or_default(),
            r.district.clone(),
            r.mandal_name.clone(),
            r.sec_name.clone(),
            r.sec_code.map(|c| c.to_string()).unwrap_or_default(),
            r.rural_urban.clone().unwrap_or_default(),
            r.phc_name.clone().unwrap_or_default(),
            r.cluster.clone().unwrap_or_default(),
            r.door_no.clone().unwrap_or_default(),
            r.household_id.clone().unwrap_or_default(),
        ];
        out.push_str(&csv::write_row(&fields));
        out.push('\n');
    }

    out
}

pub fn export_filename(prefix: &str) -> String {
    let today = chrono::Utc::now().format("%Y%m%d");
    format!("{}_{}.csv", prefix, today)
}

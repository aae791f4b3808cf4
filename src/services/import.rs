use sqlx::PgPool;
use thiserror::Error;

use crate::services::csv::{CsvError, CsvTable};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped: usize,
}

struct ImportRow {
    name: String,
    uid: Option<String>,
    date_of_birth: Option<chrono::NaiveDate>,
    gender: Option<String>,
    mobile_number: Option<String>,
    health_id: Option<String>,
    district: String,
    mandal_name: String,
    mandal_code: Option<i32>,
    sec_name: String,
    sec_code: Option<i32>,
    rural_urban: Option<String>,
    phc_name: Option<String>,
    cluster: Option<String>,
    door_no: Option<String>,
    address: Option<String>,
    household_id: Option<String>,
}

/// Bulk-loads residents from CSV text.
///
/// Rows missing any of name/district/mandal_name/sec_name are skipped and
/// counted, matching how the original bulk loaders treated partial rows.
/// Inserts run in chunks, each chunk in its own transaction, so a failure
/// never leaves a chunk half-applied.
pub async fn import_residents(pool: &PgPool, csv_text: &str) -> Result<ImportSummary, ImportError> {
    let table = CsvTable::parse(csv_text)?;

    let name_col = table.require_column("name")?;
    let district_col = table.require_column("district")?;
    let mandal_col = table.require_column("mandal_name")?;
    let sec_col = table.require_column("sec_name")?;

    let uid_col = table.column("uid");
    let dob_col = table.column("date_of_birth");
    let gender_col = table.column("gender");
    let mobile_col = table.column("mobile_number");
    let health_col = table.column("health_id");
    let mandal_code_col = table.column("mandal_code");
    let sec_code_col = table.column("sec_code");
    let rural_col = table.column("rural_urban");
    let phc_col = table.column("phc_name");
    let cluster_col = table.column("cluster");
    let door_col = table.column("door_no");
    let address_col = table.column("address");
    let household_col = table.column("household_id");

    let mut summary = ImportSummary {
        total_rows: table.rows.len(),
        ..Default::default()
    };

    let mut pending: Vec<ImportRow> = Vec::new();
    for row in &table.rows {
        let name = table.value(row, name_col);
        let district = table.value(row, district_col);
        let mandal_name = table.value(row, mandal_col);
        let sec_name = table.value(row, sec_col);

        let (name, district, mandal_name, sec_name) =
            match (name, district, mandal_name, sec_name) {
                (Some(n), Some(d), Some(m), Some(s)) => (n, d, m, s),
                _ => {
                    summary.skipped += 1;
                    continue;
                }
            };

        let opt = |col: Option<usize>| col.and_then(|i| table.value(row, i));

        pending.push(ImportRow {
            name,
            uid: opt(uid_col),
            date_of_birth: opt(dob_col)
                .and_then(|d| chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            gender: opt(gender_col),
            mobile_number: opt(mobile_col),
            health_id: opt(health_col),
            district,
            mandal_name,
            mandal_code: opt(mandal_code_col).and_then(|v| v.parse().ok()),
            sec_name,
            sec_code: opt(sec_code_col).and_then(|v| v.parse().ok()),
            rural_urban: opt(rural_col),
            phc_name: opt(phc_col),
            cluster: opt(cluster_col),
            door_no: opt(door_col),
            address: opt(address_col),
            household_id: opt(household_col),
        });
    }

    let chunk_size = crate::config::config().database.bulk_chunk_size;
    for chunk in pending.chunks(chunk_size) {
        let mut tx = pool.begin().await?;
        for row in chunk {
            sqlx::query(
                "INSERT INTO residents \
                 (name, uid, date_of_birth, gender, mobile_number, health_id, district, \
                  mandal_name, mandal_code, sec_name, sec_code, rural_urban, phc_name, \
                  cluster, door_no, address, household_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, now(), now())",
            )
            .bind(&row.name)
            .bind(&row.uid)
            .bind(row.date_of_birth)
            .bind(&row.gender)
            .bind(&row.mobile_number)
            .bind(&row.health_id)
            .bind(&row.district)
            .bind(&row.mandal_name)
            .bind(row.mandal_code)
            .bind(&row.sec_name)
            .bind(row.sec_code)
            .bind(&row.rural_urban)
            .bind(&row.phc_name)
            .bind(&row.cluster)
            .bind(&row.door_no)
            .bind(&row.address)
            .bind(&row.household_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        summary.inserted += chunk.len();
        tracing::info!(inserted = summary.inserted, "import progress");
    }

    Ok(summary)
}

//! Data-quality maintenance operations, consolidated from what used to be
//! one-off operator scripts. Every operation reports before it mutates:
//! callers pass `apply = false` to get counts only, and destructive work
//! runs inside transactions so a failure cannot strand half a step.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::access::parse_assigned_secretariats;
use crate::services::csv::{CsvError, CsvTable};

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Outcome of one maintenance operation.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub examined: u64,
    pub affected: u64,
    pub skipped: u64,
    pub applied: bool,
}

fn chunk_size() -> usize {
    crate::config::config().database.bulk_chunk_size
}

/// Clears the legacy duplicate mobile column wherever it repeats the
/// current number (or the current number exists at all).
pub async fn dedupe_mobiles(pool: &PgPool, apply: bool) -> Result<CleanupReport, CleanupError> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM residents \
         WHERE mobile_number_old IS NOT NULL \
           AND mobile_number IS NOT NULL AND mobile_number <> '' \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut report = CleanupReport {
        examined: ids.len() as u64,
        applied: apply,
        ..Default::default()
    };

    if !apply {
        report.affected = ids.len() as u64;
        return Ok(report);
    }

    for chunk in ids.chunks(chunk_size()) {
        let result = sqlx::query(
            "UPDATE residents SET mobile_number_old = NULL, updated_at = now() \
             WHERE id = ANY($1)",
        )
        .bind(chunk)
        .execute(pool)
        .await?;
        report.affected += result.rows_affected();
        tracing::info!(cleared = report.affected, "dedupe-mobiles progress");
    }

    Ok(report)
}

/// Reconciles secretariat codes and PHC names against the PHC master list.
///
/// The master CSV carries one row per secretariat with the authoritative
/// `sec_code` and `phc_name`; every resident row of that (mandal,
/// secretariat) pair that disagrees is rewritten.
pub async fn unify_codes(
    pool: &PgPool,
    master_csv: &str,
    apply: bool,
) -> Result<CleanupReport, CleanupError> {
    let table = CsvTable::parse(master_csv)?;
    let mandal_col = table.require_column("mandal_name")?;
    let sec_col = table.require_column("sec_name")?;
    let code_col = table.require_column("sec_code")?;
    let phc_col = table.require_column("phc_name")?;

    let mut report = CleanupReport {
        applied: apply,
        ..Default::default()
    };

    for row in &table.rows {
        let mandal = table.value(row, mandal_col);
        let sec = table.value(row, sec_col);
        let code: Option<i32> = table.value(row, code_col).and_then(|v| v.parse().ok());
        let phc = table.value(row, phc_col);

        let (mandal, sec, code) = match (mandal, sec, code) {
            (Some(m), Some(s), Some(c)) => (m, s, c),
            _ => {
                report.skipped += 1;
                continue;
            }
        };
        report.examined += 1;

        if apply {
            let result = sqlx::query(
                "UPDATE residents SET sec_code = $1, phc_name = $2, updated_at = now() \
                 WHERE mandal_name = $3 AND sec_name = $4 \
                   AND (sec_code IS DISTINCT FROM $1 OR phc_name IS DISTINCT FROM $2)",
            )
            .bind(code)
            .bind(&phc)
            .bind(&mandal)
            .bind(&sec)
            .execute(pool)
            .await?;
            report.affected += result.rows_affected();
        } else {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM residents \
                 WHERE mandal_name = $3 AND sec_name = $4 \
                   AND (sec_code IS DISTINCT FROM $1 OR phc_name IS DISTINCT FROM $2)",
            )
            .bind(code)
            .bind(&phc)
            .bind(&mandal)
            .bind(&sec)
            .fetch_one(pool)
            .await?;
            report.affected += count as u64;
        }
    }

    Ok(report)
}

/// Rewrites legacy `"MANDAL -> SECRETARIAT"` assignment blobs to the
/// canonical object format. Blobs that parse to nothing are left untouched
/// and counted as skipped so nobody's access silently disappears.
pub async fn migrate_assignments(pool: &PgPool, apply: bool) -> Result<CleanupReport, CleanupError> {
    let rows = sqlx::query(
        "SELECT id, assigned_secretariats FROM users \
         WHERE assigned_secretariats IS NOT NULL AND assigned_secretariats <> ''",
    )
    .fetch_all(pool)
    .await?;

    let mut report = CleanupReport {
        examined: rows.len() as u64,
        applied: apply,
        ..Default::default()
    };

    for row in rows {
        let id: uuid::Uuid = row.try_get("id")?;
        let raw: String = row.try_get("assigned_secretariats")?;

        let parsed = parse_assigned_secretariats(Some(&raw));
        if parsed.is_empty() {
            report.skipped += 1;
            tracing::warn!(user_id = %id, "assignment blob is unparseable, leaving as-is");
            continue;
        }

        let canonical = serde_json::to_string(&parsed).expect("assignments serialize");
        if canonical == raw {
            continue;
        }

        report.affected += 1;
        if apply {
            sqlx::query("UPDATE users SET assigned_secretariats = $1, updated_at = now() WHERE id = $2")
                .bind(&canonical)
                .bind(id)
                .execute(pool)
                .await?;
        }
    }

    Ok(report)
}

/// Bulk-deletes audit rows older than a cutoff, optionally restricted to one
/// field name. The whole purge is one transaction; deletes are chunked only
/// to bound statement size.
pub async fn purge_logs(
    pool: &PgPool,
    before: DateTime<Utc>,
    field_name: Option<&str>,
    apply: bool,
) -> Result<CleanupReport, CleanupError> {
    let ids: Vec<i64> = match field_name {
        Some(field) => {
            sqlx::query_scalar(
                "SELECT id FROM update_logs WHERE created_at < $1 AND field_name = $2 ORDER BY id",
            )
            .bind(before)
            .bind(field)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT id FROM update_logs WHERE created_at < $1 ORDER BY id")
                .bind(before)
                .fetch_all(pool)
                .await?
        }
    };

    let mut report = CleanupReport {
        examined: ids.len() as u64,
        applied: apply,
        ..Default::default()
    };

    if !apply {
        report.affected = ids.len() as u64;
        return Ok(report);
    }

    let mut tx = pool.begin().await?;
    for chunk in ids.chunks(chunk_size()) {
        let result = sqlx::query("DELETE FROM update_logs WHERE id = ANY($1)")
            .bind(chunk)
            .execute(&mut *tx)
            .await?;
        report.affected += result.rows_affected();
    }
    tx.commit().await?;

    tracing::info!(deleted = report.affected, "purge-logs completed");
    Ok(report)
}

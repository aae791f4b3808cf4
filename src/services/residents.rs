use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Resident;

/// A validated change to one auditable contact field.
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub field_name: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Normalizes and validates a mobile number: strips spaces and dashes,
/// requires a 10-digit Indian mobile starting 6-9.
pub fn normalize_mobile(raw: &str) -> Result<String, String> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if cleaned.len() != 10 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err("Mobile number must be 10 digits".to_string());
    }
    if !matches!(cleaned.chars().next(), Some('6'..='9')) {
        return Err("Mobile number must start with 6-9".to_string());
    }
    Ok(cleaned)
}

/// Validates an ABHA health ID: 14 digits, with or without hyphen grouping.
pub fn normalize_health_id(raw: &str) -> Result<String, String> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if cleaned.len() != 14 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err("Health ID must be 14 digits".to_string());
    }
    Ok(cleaned)
}

/// Applies contact-field changes and their audit rows in one transaction.
///
/// Last write wins between concurrent editors; the UpdateLog trail is what
/// makes that reconstructable.
pub async fn apply_contact_changes(
    pool: &PgPool,
    resident: &Resident,
    changes: &[FieldChange],
    actor_id: Uuid,
    ip_address: Option<&str>,
) -> Result<(), DatabaseError> {
    if changes.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    for change in changes {
        // Column names come from a fixed whitelist (FieldChange is only
        // constructed with static names), so interpolation is safe here.
        let sql = format!(
            "UPDATE residents SET \"{}\" = $1, updated_at = $2 WHERE id = $3",
            change.field_name
        );
        sqlx::query(&sql)
            .bind(&change.new_value)
            .bind(now)
            .bind(resident.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO update_logs (resident_id, user_id, field_name, old_value, new_value, ip_address, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(resident.id)
        .bind(actor_id)
        .bind(change.field_name)
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(ip_address)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    if crate::config::config().security.enable_audit_logging {
        for change in changes {
            tracing::info!(
                resident_id = resident.id,
                actor = %actor_id,
                field = change.field_name,
                "contact field updated"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_normalization() {
        assert_eq!(normalize_mobile("98765 43210").unwrap(), "9876543210");
        assert_eq!(normalize_mobile("987-654-3210").unwrap(), "9876543210");
        assert!(normalize_mobile("12345").is_err());
        assert!(normalize_mobile("1234567890").is_err()); // bad leading digit
        assert!(normalize_mobile("98765432101").is_err());
    }

    #[test]
    fn health_id_normalization() {
        assert_eq!(
            normalize_health_id("12-3456-7890-1234").unwrap(),
            "12345678901234"
        );
        assert!(normalize_health_id("1234").is_err());
        assert!(normalize_health_id("1234567890123x").is_err());
    }
}

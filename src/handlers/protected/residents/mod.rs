pub mod export;
pub mod list;
pub mod record;

pub use export::residents_export;
pub use list::residents_list;
pub use record::{resident_get, resident_put};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::access::{
    build_resident_access_filter, validate_search, SearchSelection, UserScope,
};
use crate::error::ApiError;

/// Query parameters shared by the list, export and analytics endpoints.
/// List-valued parameters are comma-separated, matching the dashboard UI.
#[derive(Debug, Default, Deserialize)]
pub struct ResidentQuery {
    pub mandals: Option<String>,
    pub secretariats: Option<String>,
    pub phc: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "mobileStatus")]
    pub mobile_status: Option<String>,
    #[serde(rename = "healthIdStatus")]
    pub health_id_status: Option<String>,
    #[serde(rename = "ruralUrban")]
    pub rural_urban: Option<String>,
    /// Export only: restrict to residents covered by these officer accounts.
    pub officers: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

fn split_csv_param(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl ResidentQuery {
    pub fn selection(&self) -> SearchSelection {
        SearchSelection {
            mandals: split_csv_param(&self.mandals),
            secretariats: split_csv_param(&self.secretariats),
        }
    }

    /// Non-scope filters: PHC, activity date range, contact/health-ID
    /// coverage, rural/urban flag.
    fn extra_where(&self) -> Result<Vec<Value>, ApiError> {
        let mut clauses = Vec::new();

        if let Some(phc) = self.phc.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push(json!({ "phc_name": phc }));
        }
        if let Some(flag) = self
            .rural_urban
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            clauses.push(json!({ "rural_urban": flag }));
        }

        if let Some(start) = self.start_date.as_deref() {
            let date = parse_date_param("startDate", start)?;
            let from = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
            clauses.push(json!({ "updated_at": { "$gte": from.to_rfc3339() } }));
        }
        if let Some(end) = self.end_date.as_deref() {
            let date = parse_date_param("endDate", end)?;
            // Exclusive upper bound: the whole end day is included.
            let until = (date + chrono::Days::new(1))
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            clauses.push(json!({ "updated_at": { "$lt": until.to_rfc3339() } }));
        }

        if let Some(clause) = coverage_clause("mobile_number", self.mobile_status.as_deref())? {
            clauses.push(clause);
        }
        if let Some(clause) = coverage_clause("health_id", self.health_id_status.as_deref())? {
            clauses.push(clause);
        }

        Ok(clauses)
    }
}

fn parse_date_param(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{} must be YYYY-MM-DD", name)))
}

fn coverage_clause(column: &str, status: Option<&str>) -> Result<Option<Value>, ApiError> {
    match status.map(str::trim) {
        None | Some("") => Ok(None),
        Some("available") => Ok(Some(json!({ "$and": [
            { column: { "$ne": null } },
            { column: { "$ne": "" } },
        ]}))),
        Some("missing") => Ok(Some(json!({ "$or": [
            { column: null },
            { column: "" },
        ]}))),
        Some(other) => Err(ApiError::bad_request(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// Builds the full WHERE document for a resident query: the caller's access
/// filter narrowed by their selection, the selection itself, and the
/// non-scope filters, all ANDed. User filters can only ever shrink the
/// permitted set; a selection outside it renders a contradiction.
pub fn scoped_where(
    scope: &UserScope,
    query: &ResidentQuery,
) -> Result<Option<Value>, ApiError> {
    let selection = query.selection();
    validate_search(scope, &selection)?;

    let access = build_resident_access_filter(scope)?;
    let narrowed = access.narrow(&selection);

    let mut clauses = Vec::new();
    if let Some(w) = narrowed.to_where() {
        clauses.push(w);
    }
    if let Some(w) = selection.to_where() {
        clauses.push(w);
    }
    clauses.extend(query.extra_where()?);

    Ok(combine_and(clauses))
}

pub fn combine_and(mut clauses: Vec<Value>) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => Some(clauses.remove(0)),
        _ => Some(json!({ "$and": clauses })),
    }
}

/// Client address for the audit trail, from proxy headers when present.
pub fn client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        })
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::SecretariatAssignment;

    #[test]
    fn selection_splits_comma_lists() {
        let query = ResidentQuery {
            mandals: Some("KUPPAM, PUNGANUR".into()),
            secretariats: Some("KUPPAM-1".into()),
            ..Default::default()
        };
        let sel = query.selection();
        assert_eq!(sel.mandals, vec!["KUPPAM", "PUNGANUR"]);
        assert_eq!(sel.secretariats, vec!["KUPPAM-1"]);
    }

    #[test]
    fn admin_with_no_filters_has_no_where() {
        let scope = UserScope::admin();
        let where_doc = scoped_where(&scope, &ResidentQuery::default()).unwrap();
        assert!(where_doc.is_none());
    }

    #[test]
    fn officer_selection_outside_scope_is_rejected() {
        let scope = UserScope::field_officer(vec![SecretariatAssignment::new(
            "PUNGANUR",
            "TERUVEEDHI-03",
        )]);
        let query = ResidentQuery {
            mandals: Some("KUPPAM".into()),
            ..Default::default()
        };
        let err = scoped_where(&scope, &query).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn bad_date_is_a_400() {
        let query = ResidentQuery {
            start_date: Some("01-05-2024".into()),
            ..Default::default()
        };
        let err = scoped_where(&UserScope::admin(), &query).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn unknown_status_filter_is_a_400() {
        let query = ResidentQuery {
            mobile_status: Some("sometimes".into()),
            ..Default::default()
        };
        let err = scoped_where(&UserScope::admin(), &query).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}

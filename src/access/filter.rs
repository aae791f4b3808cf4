use serde_json::{json, Value};

use super::assignments::SecretariatAssignment;
use super::error::AccessError;
use super::role::Role;
use super::scope::UserScope;

/// The declarative restriction a role places on resident queries.
///
/// Rendered into the query-filter language by [`AccessFilter::to_where`] and
/// evaluated in-process by [`AccessFilter::matches`]; both views are derived
/// from the same variant, so the query path and the per-record re-check can
/// never drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessFilter {
    /// No restriction (admins).
    Unrestricted,
    /// All residents of one mandal (mandal officers).
    Mandal(String),
    /// Exact (mandal, secretariat) pairs (field officers).
    Secretariats(Vec<SecretariatAssignment>),
    /// Matches nothing. Produced by narrowing an already-scoped filter down
    /// to a selection the caller has no claim on.
    DenyAll,
}

/// What the caller asked to see, from query parameters. Empty vectors mean
/// "no preference".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSelection {
    pub mandals: Vec<String>,
    pub secretariats: Vec<String>,
}

impl SearchSelection {
    pub fn is_empty(&self) -> bool {
        self.mandals.is_empty() && self.secretariats.is_empty()
    }

    /// Renders the selection as a WHERE fragment, or `None` when empty.
    pub fn to_where(&self) -> Option<Value> {
        let mut doc = serde_json::Map::new();
        if !self.mandals.is_empty() {
            doc.insert("mandal_name".into(), json!({ "$in": &self.mandals }));
        }
        if !self.secretariats.is_empty() {
            doc.insert("sec_name".into(), json!({ "$in": &self.secretariats }));
        }
        if doc.is_empty() {
            None
        } else {
            Some(Value::Object(doc))
        }
    }
}

impl AccessFilter {
    /// Whether a resident at (mandal, secretariat) falls inside this filter.
    pub fn matches(&self, mandal_name: &str, sec_name: &str) -> bool {
        match self {
            AccessFilter::Unrestricted => true,
            AccessFilter::Mandal(m) => m == mandal_name,
            AccessFilter::Secretariats(pairs) => pairs
                .iter()
                .any(|p| p.mandal_name == mandal_name && p.sec_name == sec_name),
            AccessFilter::DenyAll => false,
        }
    }

    /// Intersects this filter with a user-supplied selection.
    ///
    /// Selections can only shrink the permitted set. A selection entirely
    /// outside it collapses to [`AccessFilter::DenyAll`] so the query still
    /// carries a contradiction instead of silently dropping the restriction.
    pub fn narrow(&self, selection: &SearchSelection) -> AccessFilter {
        match self {
            AccessFilter::Unrestricted => AccessFilter::Unrestricted,
            AccessFilter::DenyAll => AccessFilter::DenyAll,
            AccessFilter::Mandal(m) => {
                if !selection.mandals.is_empty() && !selection.mandals.iter().any(|s| s == m) {
                    AccessFilter::DenyAll
                } else {
                    AccessFilter::Mandal(m.clone())
                }
            }
            AccessFilter::Secretariats(pairs) => {
                let kept: Vec<SecretariatAssignment> = pairs
                    .iter()
                    .filter(|p| {
                        (selection.mandals.is_empty()
                            || selection.mandals.iter().any(|m| *m == p.mandal_name))
                            && (selection.secretariats.is_empty()
                                || selection.secretariats.iter().any(|s| *s == p.sec_name))
                    })
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    AccessFilter::DenyAll
                } else {
                    AccessFilter::Secretariats(kept)
                }
            }
        }
    }

    /// Renders the filter as a WHERE fragment in the query-filter language,
    /// or `None` for no restriction.
    pub fn to_where(&self) -> Option<Value> {
        match self {
            AccessFilter::Unrestricted => None,
            AccessFilter::Mandal(m) => Some(json!({ "mandal_name": m })),
            AccessFilter::Secretariats(pairs) => {
                let clauses: Vec<Value> = pairs
                    .iter()
                    .map(|p| json!({ "mandal_name": &p.mandal_name, "sec_name": &p.sec_name }))
                    .collect();
                Some(json!({ "$or": clauses }))
            }
            // Empty IN compiles to a contradiction (1=0).
            AccessFilter::DenyAll => Some(json!({ "mandal_name": { "$in": [] } })),
        }
    }
}

/// Builds the resident access filter for a caller.
///
/// A mandal officer without a mandal, or a field officer without assignments,
/// is a misconfigured account: the error is surfaced rather than mapped to an
/// empty result so operators notice and fix the account.
pub fn build_resident_access_filter(scope: &UserScope) -> Result<AccessFilter, AccessError> {
    match scope.role {
        Role::Admin => Ok(AccessFilter::Unrestricted),
        Role::PanchayatSecretary => match scope.mandal_name.as_deref() {
            Some(m) if !m.trim().is_empty() => Ok(AccessFilter::Mandal(m.to_string())),
            _ => Err(AccessError::MissingMandal),
        },
        Role::FieldOfficer => {
            if scope.assignments.is_empty() {
                Err(AccessError::NoAssignments)
            } else {
                Ok(AccessFilter::Secretariats(scope.assignments.clone()))
            }
        }
    }
}

/// Defense-in-depth check against a fetched record's location, used by routes
/// that load residents by id rather than through a scoped query.
pub fn can_access_resident(scope: &UserScope, mandal_name: &str, sec_name: &str) -> bool {
    match build_resident_access_filter(scope) {
        Ok(filter) => filter.matches(mandal_name, sec_name),
        Err(_) => false,
    }
}

/// Validates a requested selection before any query runs.
pub fn validate_search(scope: &UserScope, selection: &SearchSelection) -> Result<(), AccessError> {
    match scope.role {
        Role::Admin => Ok(()),
        Role::PanchayatSecretary => {
            let mandal = scope
                .mandal_name
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .ok_or(AccessError::MissingMandal)?;
            for requested in &selection.mandals {
                if requested != mandal {
                    return Err(AccessError::OutOfScope(format!(
                        "mandal {} is outside the assigned mandal",
                        requested
                    )));
                }
            }
            Ok(())
        }
        Role::FieldOfficer => {
            if scope.assignments.is_empty() {
                return Err(AccessError::NoAssignments);
            }
            for requested in &selection.mandals {
                if !scope.assignments.iter().any(|a| &a.mandal_name == requested) {
                    return Err(AccessError::OutOfScope(format!(
                        "mandal {} is outside the assigned secretariats",
                        requested
                    )));
                }
            }
            for requested in &selection.secretariats {
                if !scope.assignments.iter().any(|a| &a.sec_name == requested) {
                    return Err(AccessError::OutOfScope(format!(
                        "secretariat {} is outside the assigned secretariats",
                        requested
                    )));
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn officer_two_mandals() -> UserScope {
        UserScope::field_officer(vec![
            SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
            SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
        ])
    }

    #[test]
    fn admin_is_unrestricted() {
        let filter = build_resident_access_filter(&UserScope::admin()).unwrap();
        assert_eq!(filter, AccessFilter::Unrestricted);
        assert!(filter.to_where().is_none());
        assert!(filter.matches("ANY", "WHERE"));
    }

    #[test]
    fn secretary_scoped_to_own_mandal() {
        let filter = build_resident_access_filter(&UserScope::secretary("CHITTOOR")).unwrap();
        assert!(filter.matches("CHITTOOR", "ANY-SEC"));
        assert!(!filter.matches("KUPPAM", "ANY-SEC"));
        assert_eq!(
            filter.to_where(),
            Some(serde_json::json!({ "mandal_name": "CHITTOOR" }))
        );
    }

    #[test]
    fn secretary_without_mandal_is_config_error() {
        let scope = UserScope::new(Role::PanchayatSecretary, None, vec![]);
        assert_eq!(
            build_resident_access_filter(&scope),
            Err(AccessError::MissingMandal)
        );
        let blank = UserScope::new(Role::PanchayatSecretary, Some("  ".into()), vec![]);
        assert_eq!(
            build_resident_access_filter(&blank),
            Err(AccessError::MissingMandal)
        );
    }

    #[test]
    fn field_officer_matches_exact_pair_only() {
        let scope = UserScope::field_officer(vec![SecretariatAssignment::new(
            "PUNGANUR",
            "TERUVEEDHI-03",
        )]);
        let filter = build_resident_access_filter(&scope).unwrap();
        assert!(filter.matches("PUNGANUR", "TERUVEEDHI-03"));
        // Same mandal, different secretariat: excluded.
        assert!(!filter.matches("PUNGANUR", "KUPPAM-1"));
        assert!(!filter.matches("KUPPAM", "TERUVEEDHI-03"));
    }

    #[test]
    fn field_officer_without_assignments_is_config_error() {
        let scope = UserScope::field_officer(vec![]);
        assert_eq!(
            build_resident_access_filter(&scope),
            Err(AccessError::NoAssignments)
        );
    }

    #[test]
    fn checker_and_filter_agree_for_all_roles() {
        let residents = [
            ("CHITTOOR", "CHITTOOR-01"),
            ("PUNGANUR", "TERUVEEDHI-03"),
            ("PUNGANUR", "KUPPAM-1"),
            ("KUPPAM", "KUPPAM-1"),
            ("GUDUPALLE", "GUDUPALLE-02"),
        ];
        let scopes = [
            UserScope::admin(),
            UserScope::secretary("PUNGANUR"),
            officer_two_mandals(),
        ];
        for scope in &scopes {
            let filter = build_resident_access_filter(scope).unwrap();
            for (mandal, sec) in &residents {
                assert_eq!(
                    can_access_resident(scope, mandal, sec),
                    filter.matches(mandal, sec),
                    "disagreement for {:?} on {}/{}",
                    scope.role,
                    mandal,
                    sec
                );
            }
        }
    }

    #[test]
    fn misconfigured_scope_denies_record_access() {
        let scope = UserScope::field_officer(vec![]);
        assert!(!can_access_resident(&scope, "KUPPAM", "KUPPAM-1"));
    }

    #[test]
    fn narrow_keeps_selection_inside_pairs() {
        let filter = build_resident_access_filter(&officer_two_mandals()).unwrap();
        let narrowed = filter.narrow(&SearchSelection {
            mandals: vec!["KUPPAM".into()],
            secretariats: vec![],
        });
        assert_eq!(
            narrowed,
            AccessFilter::Secretariats(vec![SecretariatAssignment::new("KUPPAM", "KUPPAM-1")])
        );
    }

    #[test]
    fn narrow_outside_scope_denies_all() {
        let filter = build_resident_access_filter(&officer_two_mandals()).unwrap();
        let narrowed = filter.narrow(&SearchSelection {
            mandals: vec!["PALAMANER".into()],
            secretariats: vec![],
        });
        assert_eq!(narrowed, AccessFilter::DenyAll);
        assert!(!narrowed.matches("PALAMANER", "ANY"));
        // Renders to a contradiction, never to an unrestricted query.
        assert!(narrowed.to_where().is_some());
    }

    #[test]
    fn narrow_mandal_filter_against_other_mandal() {
        let filter = AccessFilter::Mandal("CHITTOOR".into());
        let narrowed = filter.narrow(&SearchSelection {
            mandals: vec!["KUPPAM".into()],
            secretariats: vec![],
        });
        assert_eq!(narrowed, AccessFilter::DenyAll);
    }

    #[test]
    fn validate_search_per_role() {
        let sel_kuppam = SearchSelection {
            mandals: vec!["KUPPAM".into()],
            secretariats: vec![],
        };

        assert!(validate_search(&UserScope::admin(), &sel_kuppam).is_ok());

        let secretary = UserScope::secretary("CHITTOOR");
        assert!(matches!(
            validate_search(&secretary, &sel_kuppam),
            Err(AccessError::OutOfScope(_))
        ));
        let own = SearchSelection {
            mandals: vec!["CHITTOOR".into()],
            secretariats: vec![],
        };
        assert!(validate_search(&secretary, &own).is_ok());

        let officer = officer_two_mandals();
        assert!(validate_search(&officer, &sel_kuppam).is_ok());
        let foreign_sec = SearchSelection {
            mandals: vec![],
            secretariats: vec!["SANTHIPURAM-05".into()],
        };
        assert!(matches!(
            validate_search(&officer, &foreign_sec),
            Err(AccessError::OutOfScope(_))
        ));

        let unassigned = UserScope::field_officer(vec![]);
        assert_eq!(
            validate_search(&unassigned, &SearchSelection::default()),
            Err(AccessError::NoAssignments)
        );
    }
}

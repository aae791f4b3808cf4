use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One (mandal, secretariat) pair a field officer is responsible for.
///
/// Serialized with the same camelCase keys the `assigned_secretariats`
/// column has always stored, so re-encoding a parsed list writes the
/// canonical format back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretariatAssignment {
    pub mandal_name: String,
    pub sec_name: String,
}

impl SecretariatAssignment {
    pub fn new(mandal_name: impl Into<String>, sec_name: impl Into<String>) -> Self {
        Self {
            mandal_name: mandal_name.into(),
            sec_name: sec_name.into(),
        }
    }
}

/// Decodes the persisted assignment blob into typed pairs.
///
/// The column has carried two formats over its life: the current JSON array
/// of `{"mandalName": ..., "secName": ...}` objects, and an older array of
/// `"MANDAL -> SECRETARIAT"` strings. Both are accepted; anything else -
/// missing value, malformed JSON, entries of the wrong shape, blank names -
/// degrades to the empty list rather than an error. No deduplication is
/// performed.
pub fn parse_assigned_secretariats(raw: Option<&str>) -> Vec<SecretariatAssignment> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return vec![],
    };

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return vec![],
    };

    let entries = match parsed {
        Value::Array(entries) => entries,
        _ => return vec![],
    };

    entries.iter().filter_map(parse_entry).collect()
}

fn parse_entry(entry: &Value) -> Option<SecretariatAssignment> {
    match entry {
        Value::Object(obj) => {
            let mandal = obj.get("mandalName")?.as_str()?.trim();
            let sec = obj.get("secName")?.as_str()?.trim();
            if mandal.is_empty() || sec.is_empty() {
                return None;
            }
            Some(SecretariatAssignment::new(mandal, sec))
        }
        // Legacy convention: "MANDAL -> SECRETARIAT"
        Value::String(s) => {
            let (mandal, sec) = s.split_once("->")?;
            let mandal = mandal.trim();
            let sec = sec.trim();
            if mandal.is_empty() || sec.is_empty() {
                return None;
            }
            Some(SecretariatAssignment::new(mandal, sec))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_empty_yield_empty_list() {
        assert!(parse_assigned_secretariats(None).is_empty());
        assert!(parse_assigned_secretariats(Some("")).is_empty());
        assert!(parse_assigned_secretariats(Some("   ")).is_empty());
    }

    #[test]
    fn malformed_json_yields_empty_list() {
        assert!(parse_assigned_secretariats(Some("not json")).is_empty());
        assert!(parse_assigned_secretariats(Some("{\"mandalName\":")).is_empty());
    }

    #[test]
    fn non_array_json_yields_empty_list() {
        assert!(parse_assigned_secretariats(Some("{\"mandalName\": \"KUPPAM\"}")).is_empty());
        assert!(parse_assigned_secretariats(Some("42")).is_empty());
    }

    #[test]
    fn parses_object_entries() {
        let raw = r#"[{"mandalName": "PUNGANUR", "secName": "TERUVEEDHI-03"}]"#;
        let parsed = parse_assigned_secretariats(Some(raw));
        assert_eq!(
            parsed,
            vec![SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03")]
        );
    }

    #[test]
    fn parses_legacy_string_entries() {
        let raw = r#"["PUNGANUR -> TERUVEEDHI-03", "KUPPAM -> KUPPAM-1"]"#;
        let parsed = parse_assigned_secretariats(Some(raw));
        assert_eq!(
            parsed,
            vec![
                SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
                SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
            ]
        );
    }

    #[test]
    fn drops_entries_missing_fields() {
        let raw = r#"[
            {"mandalName": "PUNGANUR"},
            {"secName": "TERUVEEDHI-03"},
            {"mandalName": 7, "secName": "TERUVEEDHI-03"},
            {"mandalName": "  ", "secName": "TERUVEEDHI-03"},
            "no separator here",
            null,
            {"mandalName": "KUPPAM", "secName": "KUPPAM-1"}
        ]"#;
        let parsed = parse_assigned_secretariats(Some(raw));
        assert_eq!(parsed, vec![SecretariatAssignment::new("KUPPAM", "KUPPAM-1")]);
    }

    #[test]
    fn does_not_deduplicate() {
        let raw = r#"[
            {"mandalName": "KUPPAM", "secName": "KUPPAM-1"},
            {"mandalName": "KUPPAM", "secName": "KUPPAM-1"}
        ]"#;
        assert_eq!(parse_assigned_secretariats(Some(raw)).len(), 2);
    }
}

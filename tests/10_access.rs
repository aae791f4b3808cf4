// Access-layer surface: role whitelist, assignment parsing, scope building.

use chittoor_health_api::access::{
    parse_assigned_secretariats, Role, SecretariatAssignment, UserScope,
};

#[test]
fn role_whitelist_is_not_rank_based() {
    // A secretary outranks another secretary's subordinates but still cannot
    // manage peer accounts; only the whitelist decides.
    assert!(Role::PanchayatSecretary.rank() > Role::FieldOfficer.rank());
    assert!(Role::PanchayatSecretary.can_manage(Role::FieldOfficer));
    assert!(!Role::PanchayatSecretary.can_manage(Role::PanchayatSecretary));

    assert!(Role::Admin.can_manage(Role::PanchayatSecretary));
    assert!(!Role::FieldOfficer.can_manage(Role::FieldOfficer));
}

#[test]
fn malformed_blob_parses_to_empty_without_panicking() {
    assert_eq!(parse_assigned_secretariats(Some("not json")), vec![]);
    assert_eq!(parse_assigned_secretariats(Some("[{\"broken\"")), vec![]);
    assert_eq!(parse_assigned_secretariats(None), vec![]);
}

#[test]
fn current_and_legacy_formats_both_parse() {
    let object_form = r#"[{"mandalName": "PUNGANUR", "secName": "TERUVEEDHI-03"}]"#;
    let legacy_form = r#"["PUNGANUR -> TERUVEEDHI-03"]"#;

    let expected = vec![SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03")];
    assert_eq!(parse_assigned_secretariats(Some(object_form)), expected);
    assert_eq!(parse_assigned_secretariats(Some(legacy_form)), expected);
}

#[test]
fn mixed_blob_keeps_only_usable_entries() {
    let raw = r#"[
        {"mandalName": "KUPPAM", "secName": "KUPPAM-1"},
        {"mandalName": "KUPPAM"},
        "SANTHIPURAM -> SANTHIPURAM-02",
        12345
    ]"#;
    assert_eq!(
        parse_assigned_secretariats(Some(raw)),
        vec![
            SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
            SecretariatAssignment::new("SANTHIPURAM", "SANTHIPURAM-02"),
        ]
    );
}

#[test]
fn scope_from_columns_decodes_blob_once() {
    let scope = UserScope::from_columns(
        Role::FieldOfficer,
        None,
        Some(r#"["GUDUPALLE -> GUDUPALLE-04"]"#),
    );
    assert_eq!(
        scope.assignments,
        vec![SecretariatAssignment::new("GUDUPALLE", "GUDUPALLE-04")]
    );
}

#[test]
fn canonical_reencoding_uses_object_keys() {
    let parsed = parse_assigned_secretariats(Some(r#"["KUPPAM -> KUPPAM-1"]"#));
    let encoded = serde_json::to_string(&parsed).unwrap();
    assert_eq!(
        encoded,
        r#"[{"mandalName":"KUPPAM","secName":"KUPPAM-1"}]"#
    );
}

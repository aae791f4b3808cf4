// Filter-builder semantics per role, the per-record checker, and the
// round-trip agreement between the two.

use chittoor_health_api::access::{
    build_resident_access_filter, can_access_resident, validate_search, AccessError,
    AccessFilter, SearchSelection, SecretariatAssignment, UserScope,
};

#[test]
fn admin_filter_matches_everything() {
    let filter = build_resident_access_filter(&UserScope::admin()).unwrap();
    assert_eq!(filter, AccessFilter::Unrestricted);
    assert!(filter.to_where().is_none());
}

#[test]
fn secretary_filter_is_mandal_equality() {
    let filter = build_resident_access_filter(&UserScope::secretary("CHITTOOR")).unwrap();
    assert!(filter.matches("CHITTOOR", "ANY"));
    assert!(!filter.matches("PUNGANUR", "ANY"));
}

#[test]
fn secretary_without_mandal_errors() {
    let scope = UserScope::new(
        chittoor_health_api::access::Role::PanchayatSecretary,
        None,
        vec![],
    );
    assert_eq!(
        build_resident_access_filter(&scope).unwrap_err(),
        AccessError::MissingMandal
    );
}

#[test]
fn officer_filter_excludes_same_mandal_other_secretariat() {
    let scope = UserScope::field_officer(vec![SecretariatAssignment::new(
        "PUNGANUR",
        "TERUVEEDHI-03",
    )]);
    let filter = build_resident_access_filter(&scope).unwrap();
    assert!(filter.matches("PUNGANUR", "TERUVEEDHI-03"));
    assert!(!filter.matches("PUNGANUR", "KUPPAM-1"));
}

#[test]
fn officer_without_assignments_errors() {
    assert_eq!(
        build_resident_access_filter(&UserScope::field_officer(vec![])).unwrap_err(),
        AccessError::NoAssignments
    );
}

#[test]
fn checker_agrees_with_filter_for_every_scope_and_resident() {
    let residents = [
        ("CHITTOOR", "CHITTOOR-01"),
        ("PUNGANUR", "TERUVEEDHI-03"),
        ("PUNGANUR", "KUPPAM-1"),
        ("KUPPAM", "KUPPAM-1"),
        ("SANTHIPURAM", "SANTHIPURAM-02"),
        ("GUDUPALLE", "GUDUPALLE-04"),
    ];
    let scopes = [
        UserScope::admin(),
        UserScope::secretary("PUNGANUR"),
        UserScope::secretary("GUDUPALLE"),
        UserScope::field_officer(vec![SecretariatAssignment::new("KUPPAM", "KUPPAM-1")]),
        UserScope::field_officer(vec![
            SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
            SecretariatAssignment::new("SANTHIPURAM", "SANTHIPURAM-02"),
        ]),
    ];

    for scope in &scopes {
        let filter = build_resident_access_filter(scope).unwrap();
        for (mandal, sec) in &residents {
            assert_eq!(
                can_access_resident(scope, mandal, sec),
                filter.matches(mandal, sec),
                "paths disagree for {:?} on {}/{}",
                scope.role,
                mandal,
                sec
            );
        }
    }
}

#[test]
fn union_of_two_mandal_assignments_is_exact() {
    // An officer covering secretariats in two different mandals sees exactly
    // the union of the two pairs.
    let scope = UserScope::field_officer(vec![
        SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
        SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
    ]);
    let filter = build_resident_access_filter(&scope).unwrap();

    assert!(filter.matches("PUNGANUR", "TERUVEEDHI-03"));
    assert!(filter.matches("KUPPAM", "KUPPAM-1"));
    // Nothing else from either mandal leaks in.
    assert!(!filter.matches("PUNGANUR", "KUPPAM-1"));
    assert!(!filter.matches("KUPPAM", "TERUVEEDHI-03"));
    assert!(!filter.matches("GUDUPALLE", "GUDUPALLE-04"));
}

#[test]
fn narrowing_never_widens() {
    let scope = UserScope::field_officer(vec![
        SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
        SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
    ]);
    let filter = build_resident_access_filter(&scope).unwrap();

    let inside = filter.narrow(&SearchSelection {
        mandals: vec!["PUNGANUR".into()],
        secretariats: vec![],
    });
    assert!(inside.matches("PUNGANUR", "TERUVEEDHI-03"));
    assert!(!inside.matches("KUPPAM", "KUPPAM-1"));

    let outside = filter.narrow(&SearchSelection {
        mandals: vec!["PALAMANER".into()],
        secretariats: vec![],
    });
    assert_eq!(outside, AccessFilter::DenyAll);
    for (mandal, sec) in [("PALAMANER", "X"), ("PUNGANUR", "TERUVEEDHI-03")] {
        assert!(!outside.matches(mandal, sec));
    }
}

#[test]
fn validate_search_denies_out_of_scope_requests() {
    let secretary = UserScope::secretary("CHITTOOR");
    let foreign = SearchSelection {
        mandals: vec!["KUPPAM".into()],
        secretariats: vec![],
    };
    assert!(matches!(
        validate_search(&secretary, &foreign),
        Err(AccessError::OutOfScope(_))
    ));

    let officer = UserScope::field_officer(vec![SecretariatAssignment::new(
        "KUPPAM", "KUPPAM-1",
    )]);
    assert!(validate_search(
        &officer,
        &SearchSelection {
            mandals: vec!["KUPPAM".into()],
            secretariats: vec!["KUPPAM-1".into()],
        }
    )
    .is_ok());
    assert!(matches!(
        validate_search(
            &officer,
            &SearchSelection {
                mandals: vec![],
                secretariats: vec!["KUPPAM-2".into()],
            }
        ),
        Err(AccessError::OutOfScope(_))
    ));
}

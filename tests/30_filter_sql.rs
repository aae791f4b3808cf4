// The declarative filter language compiles access fragments and user filters
// into parameterized SQL.

use chittoor_health_api::access::{
    build_resident_access_filter, AccessFilter, SecretariatAssignment, UserScope,
};
use chittoor_health_api::filter::filter_where::FilterWhere;
use chittoor_health_api::filter::{Filter, FilterData};
use serde_json::json;

#[test]
fn values_never_appear_in_sql_text() {
    let where_doc = json!({
        "mandal_name": "KUPPAM",
        "mobile_number": { "$ne": "" },
        "updated_at": { "$gte": "2024-01-01T00:00:00+00:00" },
    });
    let (sql, params) = FilterWhere::generate(&where_doc, 0).unwrap();

    assert!(!sql.contains("KUPPAM"));
    assert!(!sql.contains("2024-01-01"));
    assert_eq!(params.len(), 3);
    for i in 1..=params.len() {
        assert!(sql.contains(&format!("${}", i)), "missing placeholder in {}", sql);
    }
}

#[test]
fn secretary_fragment_compiles_to_single_equality() {
    let filter = build_resident_access_filter(&UserScope::secretary("CHITTOOR")).unwrap();
    let (sql, params) = FilterWhere::generate(&filter.to_where().unwrap(), 0).unwrap();
    assert_eq!(sql, "\"mandal_name\" = $1");
    assert_eq!(params, vec![json!("CHITTOOR")]);
}

#[test]
fn officer_fragment_compiles_to_or_of_pairs() {
    let scope = UserScope::field_officer(vec![
        SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03"),
        SecretariatAssignment::new("KUPPAM", "KUPPAM-1"),
    ]);
    let filter = build_resident_access_filter(&scope).unwrap();
    let (sql, params) = FilterWhere::generate(&filter.to_where().unwrap(), 0).unwrap();

    assert_eq!(
        sql,
        "((\"mandal_name\" = $1 AND \"sec_name\" = $2) OR (\"mandal_name\" = $3 AND \"sec_name\" = $4))"
    );
    assert_eq!(
        params,
        vec![
            json!("PUNGANUR"),
            json!("TERUVEEDHI-03"),
            json!("KUPPAM"),
            json!("KUPPAM-1"),
        ]
    );
}

#[test]
fn deny_all_compiles_to_contradiction() {
    let (sql, params) =
        FilterWhere::generate(&AccessFilter::DenyAll.to_where().unwrap(), 0).unwrap();
    assert_eq!(sql, "1=0");
    assert!(params.is_empty());
}

#[test]
fn merged_access_and_user_filters_are_anded() {
    let access = build_resident_access_filter(&UserScope::secretary("KUPPAM")).unwrap();
    let merged = json!({ "$and": [
        access.to_where().unwrap(),
        { "rural_urban": "R" },
    ]});
    let (sql, _params) = FilterWhere::generate(&merged, 0).unwrap();
    assert!(sql.contains(" AND "));
    assert!(sql.contains("\"mandal_name\""));
    assert!(sql.contains("\"rural_urban\""));
}

#[test]
fn full_select_statement_via_filter() {
    let mut filter = Filter::new("residents").unwrap();
    filter
        .assign(FilterData {
            select: None,
            where_clause: Some(json!({ "mandal_name": "KUPPAM" })),
            order: Some(json!("id asc")),
            limit: Some(25),
            offset: Some(50),
        })
        .unwrap();
    let result = filter.to_sql().unwrap();
    assert_eq!(
        result.query,
        "SELECT * FROM \"residents\" WHERE \"mandal_name\" = $1 ORDER BY \"id\" ASC LIMIT 25 OFFSET 50"
    );
}

#[test]
fn hostile_identifiers_are_rejected() {
    assert!(Filter::new("residents\"; DROP TABLE users; --").is_err());

    let bad_column = json!({ "mandal_name\" OR 1=1 --": "x" });
    assert!(FilterWhere::generate(&bad_column, 0).is_err());
}

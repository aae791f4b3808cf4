use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::access::{AccessError, Role, UserScope};

/// An operator account.
///
/// `role` is stored as text; `scope()` is the only sanctioned way to turn a
/// row into something the access layer accepts, so an unknown role string or
/// a stale assignment blob is caught at this boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub mandal_name: Option<String>,
    pub assigned_secretariats: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn parsed_role(&self) -> Result<Role, AccessError> {
        self.role.parse()
    }

    pub fn scope(&self) -> Result<UserScope, AccessError> {
        Ok(UserScope::from_columns(
            self.parsed_role()?,
            self.mandal_name.clone(),
            self.assigned_secretariats.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::SecretariatAssignment;

    fn base_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "fo_punganur_03".into(),
            password_hash: "$argon2id$stub".into(),
            display_name: "Field Officer".into(),
            role: "FIELD_OFFICER".into(),
            mandal_name: None,
            assigned_secretariats: Some(
                r#"[{"mandalName": "PUNGANUR", "secName": "TERUVEEDHI-03"}]"#.into(),
            ),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scope_decodes_role_and_assignments() {
        let scope = base_user().scope().unwrap();
        assert_eq!(scope.role, Role::FieldOfficer);
        assert_eq!(
            scope.assignments,
            vec![SecretariatAssignment::new("PUNGANUR", "TERUVEEDHI-03")]
        );
    }

    #[test]
    fn unknown_role_fails_at_the_boundary() {
        let mut user = base_user();
        user.role = "DISTRICT_COLLECTOR".into();
        assert!(matches!(user.scope(), Err(AccessError::UnknownRole(_))));
    }
}

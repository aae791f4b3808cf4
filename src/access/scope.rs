use serde::{Deserialize, Serialize};

use super::assignments::{parse_assigned_secretariats, SecretariatAssignment};
use super::role::Role;

/// Everything access control needs to know about the caller, decoded once at
/// the boundary (login, JWT claims, or a user row). The raw assignment blob
/// never travels past this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserScope {
    pub role: Role,
    pub mandal_name: Option<String>,
    pub assignments: Vec<SecretariatAssignment>,
}

impl UserScope {
    pub fn new(
        role: Role,
        mandal_name: Option<String>,
        assignments: Vec<SecretariatAssignment>,
    ) -> Self {
        Self {
            role,
            mandal_name,
            assignments,
        }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin, None, vec![])
    }

    pub fn secretary(mandal_name: impl Into<String>) -> Self {
        Self::new(Role::PanchayatSecretary, Some(mandal_name.into()), vec![])
    }

    pub fn field_officer(assignments: Vec<SecretariatAssignment>) -> Self {
        Self::new(Role::FieldOfficer, None, assignments)
    }

    /// Builds a scope from stored account columns, decoding the assignment
    /// blob with the tolerant parser.
    pub fn from_columns(
        role: Role,
        mandal_name: Option<String>,
        assigned_secretariats: Option<&str>,
    ) -> Self {
        Self::new(
            role,
            mandal_name,
            parse_assigned_secretariats(assigned_secretariats),
        )
    }
}

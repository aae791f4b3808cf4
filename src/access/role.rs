use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AccessError;

/// The three operator roles, ranked ADMIN > PANCHAYAT_SECRETARY > FIELD_OFFICER.
///
/// Management rights are whitelist-based rather than derived from the rank:
/// a secretary manages field officers but not other secretaries, even though
/// both comparisons would pass a plain rank check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "PANCHAYAT_SECRETARY")]
    PanchayatSecretary,
    #[serde(rename = "FIELD_OFFICER")]
    FieldOfficer,
}

impl Role {
    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::PanchayatSecretary => 2,
            Role::FieldOfficer => 1,
        }
    }

    /// Whether this role may create, edit, or deactivate accounts of `target`.
    pub fn can_manage(&self, target: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::PanchayatSecretary => matches!(target, Role::FieldOfficer),
            Role::FieldOfficer => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::PanchayatSecretary => "PANCHAYAT_SECRETARY",
            Role::FieldOfficer => "FIELD_OFFICER",
        }
    }
}

impl FromStr for Role {
    type Err = AccessError;

    /// Unknown role strings are rejected here, at the storage/claims boundary.
    /// Callers must treat the error as a denial, so an unrecognized role can
    /// never reach the filter builder.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "PANCHAYAT_SECRETARY" => Ok(Role::PanchayatSecretary),
            "FIELD_OFFICER" => Ok(Role::FieldOfficer),
            other => Err(AccessError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_ordering() {
        assert!(Role::Admin.rank() > Role::PanchayatSecretary.rank());
        assert!(Role::PanchayatSecretary.rank() > Role::FieldOfficer.rank());
    }

    #[test]
    fn manage_whitelist() {
        assert!(Role::Admin.can_manage(Role::Admin));
        assert!(Role::Admin.can_manage(Role::PanchayatSecretary));
        assert!(Role::Admin.can_manage(Role::FieldOfficer));

        assert!(!Role::PanchayatSecretary.can_manage(Role::Admin));
        assert!(!Role::PanchayatSecretary.can_manage(Role::PanchayatSecretary));
        assert!(Role::PanchayatSecretary.can_manage(Role::FieldOfficer));

        assert!(!Role::FieldOfficer.can_manage(Role::FieldOfficer));
        assert!(!Role::FieldOfficer.can_manage(Role::Admin));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "SUPERVISOR".parse::<Role>().unwrap_err();
        assert_eq!(err, AccessError::UnknownRole("SUPERVISOR".to_string()));
    }

    #[test]
    fn round_trips_through_str() {
        for role in [Role::Admin, Role::PanchayatSecretary, Role::FieldOfficer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }
}

use thiserror::Error;

/// Single result type for all access-control decisions.
///
/// `MissingMandal` and `NoAssignments` are operator configuration errors: the
/// account cannot be scoped at all and no query should run. `OutOfScope` is an
/// ordinary denial of a specific request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Mandal officer account has no assigned mandal")]
    MissingMandal,

    #[error("Field officer account has no secretariat assignments")]
    NoAssignments,

    #[error("Requested scope is not permitted: {0}")]
    OutOfScope(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

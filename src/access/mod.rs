//! Role-scoped access control for resident data.
//!
//! Everything here is a pure function of the caller's [`UserScope`] and the
//! data passed in; there is no ambient session state. Handlers derive a scope
//! from the request, build an [`AccessFilter`] once, and reuse it for query
//! scoping, per-record re-validation, and search validation.

pub mod assignments;
pub mod error;
pub mod filter;
pub mod role;
pub mod scope;

pub use assignments::{parse_assigned_secretariats, SecretariatAssignment};
pub use error::AccessError;
pub use filter::{
    build_resident_access_filter, can_access_resident, validate_search, AccessFilter,
    SearchSelection,
};
pub use role::Role;
pub use scope::UserScope;

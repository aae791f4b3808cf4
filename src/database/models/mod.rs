pub mod resident;
pub mod update_log;
pub mod user;

pub use resident::Resident;
pub use update_log::UpdateLog;
pub use user::User;

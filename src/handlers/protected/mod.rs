pub mod analytics;
pub mod auth;
pub mod residents;
pub mod users;

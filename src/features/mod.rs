pub mod auth;
pub mod emergencies;
pub mod notifications;
pub mod providers;

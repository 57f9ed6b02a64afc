pub mod config;
pub mod error;
pub mod i18n;
pub mod inventory;
pub mod telemetry;

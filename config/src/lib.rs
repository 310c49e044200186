//! # Configuration System
//!
//! Centralized configuration for the Innkeep reservation system.
//!
//! This crate provides:
//! - Configuration structures for the database, HTTP server, token
//!   verification and SMTP delivery
//! - Environment variable loading (12-factor app principles, `INNKEEP_*`)
//! - Configuration file loading (TOML/YAML)
//! - Validation via the `validator` crate

pub mod config;
pub mod file_loader;
pub mod loader;

pub use config::{AuthConfig, Config, DatabaseConfig, ServerConfig, SmtpConfig};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use validator::Validate;

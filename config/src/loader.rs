//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles. Every variable is optional; unset variables keep their
//! defaults.
//!
//! # Environment Variables
//! - `INNKEEP_DATABASE_URL`: PostgreSQL connection URL
//! - `INNKEEP_DB_MAX_CONNECTIONS`: Connection pool size (default: 10)
//! - `INNKEEP_DB_CONNECT_TIMEOUT_SECONDS`: Connection timeout (default: 30)
//! - `INNKEEP_SERVER_HOST`: Bind host (default: "0.0.0.0")
//! - `INNKEEP_SERVER_PORT`: Bind port (default: 8080)
//! - `INNKEEP_JWT_SECRET`: HS256 secret for bearer-token verification
//! - `INNKEEP_SMTP_ENABLED`: Enable SMTP delivery (true/false, default: false)
//! - `INNKEEP_SMTP_SERVER` / `INNKEEP_SMTP_PORT`: SMTP relay
//! - `INNKEEP_SMTP_USERNAME` / `INNKEEP_SMTP_PASSWORD`: SMTP credentials
//! - `INNKEEP_SMTP_FROM`: Sender address for approval notices

use crate::config::Config;
use std::env;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    var(name).and_then(|value| value.parse().ok())
}

/// Load configuration from environment variables on top of the defaults.
pub fn load_from_env() -> Config {
    let mut config = Config::default();

    if let Some(url) = var("INNKEEP_DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(max) = parse_var("INNKEEP_DB_MAX_CONNECTIONS") {
        config.database.max_connections = max;
    }
    if let Some(timeout) = parse_var("INNKEEP_DB_CONNECT_TIMEOUT_SECONDS") {
        config.database.connect_timeout_seconds = timeout;
    }

    if let Some(host) = var("INNKEEP_SERVER_HOST") {
        config.server.host = host;
    }
    if let Some(port) = parse_var("INNKEEP_SERVER_PORT") {
        config.server.port = port;
    }

    if let Some(secret) = var("INNKEEP_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }

    if let Some(enabled) = parse_var("INNKEEP_SMTP_ENABLED") {
        config.smtp.enabled = enabled;
    }
    if let Some(server) = var("INNKEEP_SMTP_SERVER") {
        config.smtp.server = server;
    }
    if let Some(port) = parse_var("INNKEEP_SMTP_PORT") {
        config.smtp.port = port;
    }
    if let Some(username) = var("INNKEEP_SMTP_USERNAME") {
        config.smtp.username = username;
    }
    if let Some(password) = var("INNKEEP_SMTP_PASSWORD") {
        config.smtp.password = password;
    }
    if let Some(from) = var("INNKEEP_SMTP_FROM") {
        config.smtp.from = from;
    }

    config
}

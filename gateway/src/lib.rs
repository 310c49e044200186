//! # Innkeep Gateway
//!
//! Thin HTTP surface over the reservation core. Each route maps to one
//! lifecycle operation; the gateway verifies the bearer token into a
//! [`ik_core::types::Principal`], delegates to the manager, and maps the
//! stable error kinds onto HTTP status codes. No business rules live
//! here.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use routes::create_router;
pub use server::{run_from_env, run_server};
pub use state::AppState;

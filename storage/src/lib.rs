//! # Storage Layer
//!
//! Catalog and reservation-store backends: an in-memory implementation
//! for tests and demos, and PostgreSQL for production.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalog, InMemoryReservationStore};
pub use postgres::PostgresStore;

//! Shared test fixtures for the Innkeep workspace.
//!
//! Provides:
//! - a deterministic id/email counter for unique test identities
//! - a [`fixtures::FixedClock`] to pin the calendar in lifecycle tests
//! - a seeded in-memory world (hotel, rooms, services, principals)
//! - a single shared PostgreSQL testcontainer, lazily started and
//!   skipped gracefully when Docker is unavailable

mod fixtures;

pub use fixtures::*;

//! # Innkeep Core
//!
//! Shared types and traits for the Innkeep reservation system.
//!
//! This crate provides:
//! - Type definitions for hotels, rooms, services and reservations
//! - The authenticated [`types::Principal`] passed explicitly into every
//!   lifecycle call
//! - Collaborator traits for catalogs, the reservation store, the notifier
//!   and the clock

pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    CreateReservation, Hotel, HotelId, Principal, Reservation, ReservationFilter, ReservationId,
    ReservationStatus, ReservationUpdate, Role, Room, RoomId, ServiceId, ServiceOffering, UserId,
    UserRef
};

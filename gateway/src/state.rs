//! Shared application state.

use reservations::ReservationManager;

use crate::auth::TokenVerifier;

/// State shared by all request handlers.
pub struct AppState {
    pub manager: ReservationManager,
    pub verifier: TokenVerifier
}

impl AppState {
    pub fn new(manager: ReservationManager, verifier: TokenVerifier) -> Self {
        Self { manager, verifier }
    }
}

//! Route definitions for the Innkeep gateway.

use axum::{
    Router,
    routing::{delete, get, post, put}
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer
};

use crate::handlers;
use crate::state::AppState;

/// Creates the Axum router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reservation = Router::new()
        .route("/add", post(handlers::add_reservation))
        .route("/update", post(handlers::update_reservation))
        .route("/delete/{id}", delete(handlers::delete_reservation))
        .route("/confirm/{id}", put(handlers::confirm_reservation))
        .route("/cancel/{id}", put(handlers::cancel_reservation))
        .route("/getById/{id}", get(handlers::get_by_id))
        .route("/getByClientId/{clientId}", get(handlers::get_by_client_id))
        .route("/getByHotelId/{hotelId}", get(handlers::get_by_hotel_id))
        .route("/getAllActive", get(handlers::get_all_active))
        .route("/search", get(handlers::search))
        .route(
            "/totalAmount/{clientId}",
            get(handlers::total_amount_by_client)
        )
        .route("/total/{id}", get(handlers::reservation_total));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/reservation", reservation)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

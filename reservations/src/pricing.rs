//! Reservation pricing.

use ik_core::types::{Room, ServiceOffering};

/// Total price of a stay: room price plus the price of every selected
/// service. A service without a price contributes zero. No currency
/// conversion, taxes or promotions.
pub fn total(room: &Room, services: &[ServiceOffering]) -> f64 {
    room.price
        + services
            .iter()
            .map(|service| service.price.unwrap_or(0.0))
            .sum::<f64>()
}

//! Authorization policy for reservation lifecycle actions and queries.
//!
//! All role and ownership decisions live here, keyed by
//! `(role, relationship-to-resource)`. The manager never re-derives a
//! role check on its own.

use errors::ReservationError;
use ik_core::types::{Hotel, Principal, Role, UserRef};

/// How the caller relates to the reservation under consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// The caller is the reservation's owning customer.
    Owner,
    /// The caller operates the reservation's hotel.
    Operator,
    Unrelated
}

/// Lifecycle actions gated by the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Modify,
    Delete,
    Confirm,
    Cancel,
    View
}

/// Visibility granted to a reservation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Every reservation, across all hotels.
    All,
    /// Only reservations booked into hotels the caller operates.
    OwnHotels,
    /// Only the caller's own reservations.
    SelfOnly
}

/// Capability decisions for the reservation domain.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Resolves the caller's relationship to a reservation, given its
    /// owning customer and (when resolvable) its hotel.
    pub fn relationship(
        principal: &Principal,
        customer: &UserRef,
        hotel: Option<&Hotel>
    ) -> Relationship {
        match principal.role {
            Role::Customer if customer.matches(principal) => Relationship::Owner,
            Role::HotelOperator if hotel.is_some_and(|h| h.operator.matches(principal)) => {
                Relationship::Operator
            }
            _ => Relationship::Unrelated
        }
    }

    /// The capability table.
    fn allows(role: Role, relationship: Relationship, action: Action) -> bool {
        match (role, relationship, action) {
            // Customers create reservations and control their own.
            (Role::Customer, _, Action::Create) => true,
            (
                Role::Customer,
                Relationship::Owner,
                Action::Modify | Action::Delete | Action::Confirm | Action::Cancel | Action::View
            ) => true,
            // Hotel operators control reservations booked into their
            // hotel, but never edit the customer's booking details.
            (
                Role::HotelOperator,
                Relationship::Operator,
                Action::Delete | Action::Confirm | Action::Cancel | Action::View
            ) => true,
            // Platform operators see everything and own nothing.
            (Role::PlatformOperator, _, Action::View) => true,
            _ => false
        }
    }

    pub fn authorize_create(principal: &Principal) -> Result<(), ReservationError> {
        if Self::allows(principal.role, Relationship::Unrelated, Action::Create) {
            Ok(())
        } else {
            Err(ReservationError::Unauthorized {
                reason: "only customers can create reservations".to_string()
            })
        }
    }

    pub fn authorize_modify(
        principal: &Principal,
        customer: &UserRef
    ) -> Result<(), ReservationError> {
        let relationship = Self::relationship(principal, customer, None);
        if Self::allows(principal.role, relationship, Action::Modify) {
            Ok(())
        } else {
            Err(ReservationError::Unauthorized {
                reason: "only the owning customer can modify a reservation".to_string()
            })
        }
    }

    /// Authorizes deletion and reports the granting relationship so the
    /// manager can apply the customer-only PENDING restriction.
    pub fn authorize_delete(
        principal: &Principal,
        customer: &UserRef,
        hotel: Option<&Hotel>
    ) -> Result<Relationship, ReservationError> {
        let relationship = Self::relationship(principal, customer, hotel);
        if Self::allows(principal.role, relationship, Action::Delete) {
            Ok(relationship)
        } else {
            Err(ReservationError::Unauthorized {
                reason: "not authorized to delete this reservation".to_string()
            })
        }
    }

    /// Confirmation: owner, operator, or the automatic near-start-date
    /// path (no ownership check at all when `auto_eligible`).
    pub fn authorize_confirm(
        principal: &Principal,
        customer: &UserRef,
        hotel: Option<&Hotel>,
        auto_eligible: bool
    ) -> Result<(), ReservationError> {
        let relationship = Self::relationship(principal, customer, hotel);
        if auto_eligible || Self::allows(principal.role, relationship, Action::Confirm) {
            Ok(())
        } else {
            Err(ReservationError::Unauthorized {
                reason: "not authorized to confirm this reservation".to_string()
            })
        }
    }

    /// Cancellation: owner or operator only; no automatic path.
    pub fn authorize_cancel(
        principal: &Principal,
        customer: &UserRef,
        hotel: Option<&Hotel>
    ) -> Result<(), ReservationError> {
        let relationship = Self::relationship(principal, customer, hotel);
        if Self::allows(principal.role, relationship, Action::Cancel) {
            Ok(())
        } else {
            Err(ReservationError::Unauthorized {
                reason: "not authorized to cancel this reservation".to_string()
            })
        }
    }

    pub fn authorize_view(
        principal: &Principal,
        customer: &UserRef,
        hotel: Option<&Hotel>
    ) -> Result<(), ReservationError> {
        let relationship = Self::relationship(principal, customer, hotel);
        if Self::allows(principal.role, relationship, Action::View) {
            Ok(())
        } else {
            Err(ReservationError::Unauthorized {
                reason: "not authorized to view this reservation".to_string()
            })
        }
    }

    /// Visibility over one client's reservation history (and totals).
    pub fn client_history_scope(
        principal: &Principal,
        client_id: ik_core::types::UserId
    ) -> Result<QueryScope, ReservationError> {
        match principal.role {
            Role::PlatformOperator => Ok(QueryScope::All),
            Role::HotelOperator => Ok(QueryScope::OwnHotels),
            Role::Customer if principal.user_id == client_id => Ok(QueryScope::SelfOnly),
            Role::Customer => Err(ReservationError::Unauthorized {
                reason: "customers can only view their own reservations".to_string()
            })
        }
    }

    /// Visibility over hotel-wide listings (`by_hotel`, `active`,
    /// `search`). Customers have none.
    pub fn hotel_query_scope(principal: &Principal) -> Result<QueryScope, ReservationError> {
        match principal.role {
            Role::PlatformOperator => Ok(QueryScope::All),
            Role::HotelOperator => Ok(QueryScope::OwnHotels),
            Role::Customer => Err(ReservationError::Unauthorized {
                reason: "customers cannot query hotel reservations".to_string()
            })
        }
    }
}

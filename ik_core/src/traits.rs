//! Collaborator traits consumed by the reservation core.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use errors::{NotifyError, StoreError};

use crate::types::{
    Hotel, HotelId, Reservation, ReservationFilter, ReservationId, ReservationStatus, Room, RoomId,
    ServiceId, ServiceOffering, UserId
};

/// Read access to room records.
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;
}

/// Read access to hotel service records.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn find_service(&self, id: ServiceId) -> Result<Option<ServiceOffering>, StoreError>;
}

/// Read access to hotel records.
#[async_trait]
pub trait HotelCatalog: Send + Sync {
    async fn find_hotel(&self, id: HotelId) -> Result<Option<Hotel>, StoreError>;

    /// Hotels operated by `operator`. Used to scope operator-wide queries.
    async fn hotels_by_operator(&self, operator: UserId) -> Result<Vec<Hotel>, StoreError>;
}

/// Persistence contract for reservations.
///
/// Implementations must treat the write operations as atomic per call:
/// a reservation row and its service associations commit or roll back
/// together.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Persists a new reservation, assigning its id. The id on the input
    /// value is ignored.
    async fn insert(&self, reservation: Reservation) -> Result<Reservation, StoreError>;

    /// Overwrites an existing reservation and its service associations.
    async fn update(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError>;

    async fn delete_by_id(&self, id: ReservationId) -> Result<(), StoreError>;

    async fn find_by_client(&self, client_id: UserId) -> Result<Vec<Reservation>, StoreError>;

    async fn find_by_hotel(&self, hotel_id: HotelId) -> Result<Vec<Reservation>, StoreError>;

    /// Reservations in `status` whose stay covers `on` (inclusive).
    async fn find_active(
        &self,
        status: ReservationStatus,
        on: NaiveDate
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Conjunctive filter over the reservation set; absent fields impose
    /// no constraint.
    async fn search(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StoreError>;

    /// Sum of `total_amount` over all of the client's reservations.
    async fn total_amount_by_client(&self, client_id: UserId) -> Result<f64, StoreError>;
}

/// Outbound notification channel.
///
/// Delivery is best-effort: the core logs failures and never fails the
/// triggering operation on a notification error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_approval_notice(
        &self,
        customer_email: &str,
        approver_login: &str,
        recipients: &[String]
    ) -> Result<(), NotifyError>;
}

/// Time source for date-sensitive rules (auto-confirm window, active
/// stays). Injected so tests can pin the calendar.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

//! In-memory catalog and reservation store.
//!
//! Backs tests, demos and single-process deployments. Writes are atomic
//! per operation (one map entry plus its embedded service ids), matching
//! the contract in [`ik_core::traits::ReservationStore`].

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use errors::StoreError;
use ik_core::traits::{HotelCatalog, ReservationStore, RoomCatalog, ServiceCatalog};
use ik_core::types::{
    Hotel, HotelId, Reservation, ReservationFilter, ReservationId, ReservationStatus, Room,
    RoomId, ServiceId, ServiceOffering, UserId
};

/// Hotel, room and service records held in process.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    hotels: DashMap<HotelId, Hotel>,
    rooms: DashMap<RoomId, Room>,
    services: DashMap<ServiceId, ServiceOffering>
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_hotel(&self, hotel: Hotel) {
        self.hotels.insert(hotel.id, hotel);
    }

    pub fn upsert_room(&self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    pub fn upsert_service(&self, service: ServiceOffering) {
        self.services.insert(service.id, service);
    }

    /// Flips a room's availability flag in place.
    pub fn set_room_available(&self, id: RoomId, available: bool) {
        if let Some(mut room) = self.rooms.get_mut(&id) {
            room.available = available;
        }
    }
}

#[async_trait]
impl RoomCatalog for InMemoryCatalog {
    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryCatalog {
    async fn find_service(&self, id: ServiceId) -> Result<Option<ServiceOffering>, StoreError> {
        Ok(self.services.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl HotelCatalog for InMemoryCatalog {
    async fn find_hotel(&self, id: HotelId) -> Result<Option<Hotel>, StoreError> {
        Ok(self.hotels.get(&id).map(|entry| entry.value().clone()))
    }

    async fn hotels_by_operator(&self, operator: UserId) -> Result<Vec<Hotel>, StoreError> {
        Ok(self
            .hotels
            .iter()
            .filter(|entry| entry.operator.id == operator)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Reservation rows held in process, with a monotonically assigned id
/// sequence.
#[derive(Debug)]
pub struct InMemoryReservationStore {
    reservations: DashMap<ReservationId, Reservation>,
    next_id: AtomicI64
}

impl Default for InMemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self {
            reservations: DashMap::new(),
            next_id: AtomicI64::new(1)
        }
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, mut reservation: Reservation) -> Result<Reservation, StoreError> {
        let id = ReservationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        reservation.id = id;
        self.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn update(&self, reservation: &Reservation) -> Result<(), StoreError> {
        if !self.reservations.contains_key(&reservation.id) {
            return Err(StoreError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation.id.to_string()
            });
        }
        self.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        Ok(self.reservations.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete_by_id(&self, id: ReservationId) -> Result<(), StoreError> {
        match self.reservations.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: "Reservation".to_string(),
                id: id.to_string()
            })
        }
    }

    async fn find_by_client(&self, client_id: UserId) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .iter()
            .filter(|entry| entry.customer.id == client_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_by_hotel(&self, hotel_id: HotelId) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .iter()
            .filter(|entry| entry.hotel_id == hotel_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_active(
        &self,
        status: ReservationStatus,
        on: NaiveDate
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .iter()
            .filter(|entry| entry.status == status && entry.covers(on))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn search(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .iter()
            .filter(|entry| filter.accepts(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn total_amount_by_client(&self, client_id: UserId) -> Result<f64, StoreError> {
        Ok(self
            .reservations
            .iter()
            .filter(|entry| entry.customer.id == client_id)
            .map(|entry| entry.total_amount)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ik_core::types::UserRef;

    fn reservation(client: i64, hotel: i64, status: ReservationStatus) -> Reservation {
        Reservation {
            id: ReservationId::new(0),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            booked_at: Utc::now(),
            status,
            total_amount: 100.0,
            customer: UserRef::new(UserId::new(client), format!("user{client}@example.com")),
            room_id: RoomId::new(1),
            hotel_id: HotelId::new(hotel),
            service_ids: vec![]
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryReservationStore::new();
        let first = store
            .insert(reservation(1, 1, ReservationStatus::Pending))
            .await
            .unwrap();
        let second = store
            .insert(reservation(1, 1, ReservationStatus::Pending))
            .await
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn update_of_unknown_row_is_not_found() {
        let store = InMemoryReservationStore::new();
        let ghost = reservation(1, 1, ReservationStatus::Pending);
        let err = store.update(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_and_reports_missing() {
        let store = InMemoryReservationStore::new();
        let stored = store
            .insert(reservation(1, 1, ReservationStatus::Pending))
            .await
            .unwrap();
        store.delete_by_id(stored.id).await.unwrap();
        assert!(store.delete_by_id(stored.id).await.is_err());
    }

    #[tokio::test]
    async fn search_applies_conjunctive_filters() {
        let store = InMemoryReservationStore::new();
        store
            .insert(reservation(1, 1, ReservationStatus::Confirmed))
            .await
            .unwrap();
        store
            .insert(reservation(1, 2, ReservationStatus::Confirmed))
            .await
            .unwrap();
        store
            .insert(reservation(2, 1, ReservationStatus::Pending))
            .await
            .unwrap();

        let filter = ReservationFilter {
            hotel_id: Some(HotelId::new(1)),
            status: Some(ReservationStatus::Confirmed),
            ..Default::default()
        };
        let hits = store.search(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hotel_id, HotelId::new(1));
        assert_eq!(hits[0].status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn active_requires_status_and_date_cover() {
        let store = InMemoryReservationStore::new();
        store
            .insert(reservation(1, 1, ReservationStatus::Confirmed))
            .await
            .unwrap();
        store
            .insert(reservation(2, 1, ReservationStatus::Pending))
            .await
            .unwrap();

        let inside = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let outside = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        let active = store
            .find_active(ReservationStatus::Confirmed, inside)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let none = store
            .find_active(ReservationStatus::Confirmed, outside)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn totals_sum_per_client() {
        let store = InMemoryReservationStore::new();
        store
            .insert(reservation(1, 1, ReservationStatus::Pending))
            .await
            .unwrap();
        store
            .insert(reservation(1, 2, ReservationStatus::Confirmed))
            .await
            .unwrap();
        store
            .insert(reservation(2, 1, ReservationStatus::Pending))
            .await
            .unwrap();

        let total = store.total_amount_by_client(UserId::new(1)).await.unwrap();
        assert_eq!(total, 200.0);
        assert_eq!(
            store.total_amount_by_client(UserId::new(3)).await.unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn catalog_round_trips_records() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert_room(Room {
            id: RoomId::new(101),
            number: "101".to_string(),
            room_type: "double".to_string(),
            price: 150.0,
            available: true,
            hotel_id: HotelId::new(1)
        });

        let room = catalog.find_room(RoomId::new(101)).await.unwrap().unwrap();
        assert_eq!(room.price, 150.0);

        catalog.set_room_available(RoomId::new(101), false);
        let room = catalog.find_room(RoomId::new(101)).await.unwrap().unwrap();
        assert!(!room.available);

        assert!(catalog.find_room(RoomId::new(999)).await.unwrap().is_none());
    }
}

//! Reservation lifecycle orchestration.
//!
//! [`ReservationManager`] drives every state transition: it validates
//! input, consults [`AccessPolicy`], resolves catalog records, reprices
//! through [`crate::pricing`] and persists through the
//! [`ReservationStore`] contract. Each operation is one synchronous
//! load → validate → compute → persist sequence; nothing here spans
//! requests or spawns background work.

use std::collections::HashSet;
use std::sync::Arc;

use errors::ReservationError;
use ik_core::traits::{
    Clock, HotelCatalog, Notifier, ReservationStore, RoomCatalog, ServiceCatalog, SystemClock
};
use ik_core::types::{
    CreateReservation, Hotel, HotelId, Principal, Reservation, ReservationFilter, ReservationId,
    ReservationStatus, ReservationUpdate, Room, RoomId, ServiceId, ServiceOffering, UserId, UserRef
};
use metrics::counter;

use crate::policy::{AccessPolicy, QueryScope, Relationship};
use crate::pricing;

pub struct ReservationManager {
    rooms: Arc<dyn RoomCatalog>,
    services: Arc<dyn ServiceCatalog>,
    hotels: Arc<dyn HotelCatalog>,
    store: Arc<dyn ReservationStore>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>
}

impl ReservationManager {
    pub fn new(
        rooms: Arc<dyn RoomCatalog>,
        services: Arc<dyn ServiceCatalog>,
        hotels: Arc<dyn HotelCatalog>,
        store: Arc<dyn ReservationStore>
    ) -> Self {
        Self {
            rooms,
            services,
            hotels,
            store,
            notifier: None,
            clock: Arc::new(SystemClock)
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ---------------- lifecycle ----------------

    /// Books a room for the calling customer, with optional services.
    ///
    /// The new reservation starts in `PENDING` with its total computed
    /// from the current catalog prices.
    pub async fn create_reservation(
        &self,
        principal: &Principal,
        request: CreateReservation
    ) -> Result<Reservation, ReservationError> {
        AccessPolicy::authorize_create(principal)?;

        if request.start_date > request.end_date {
            return Err(ReservationError::InvalidInput {
                field: "startDate".to_string(),
                reason: "start date is after end date".to_string()
            });
        }

        let room = self.available_room(request.room_id).await?;
        let hotel = self
            .hotels
            .find_hotel(room.hotel_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Hotel", room.hotel_id))?;

        let service_ids = dedupe(&request.service_ids);
        let selected = self.resolve_services(&service_ids).await?;
        let total = pricing::total(&room, &selected);

        let reservation = Reservation {
            id: ReservationId::new(0),
            start_date: request.start_date,
            end_date: request.end_date,
            booked_at: self.clock.now(),
            status: ReservationStatus::Pending,
            total_amount: total,
            customer: UserRef::new(principal.user_id, principal.login.clone()),
            room_id: room.id,
            hotel_id: hotel.id,
            service_ids
        };

        let stored = self.store.insert(reservation).await?;
        counter!("innkeep_reservations_created_total").increment(1);
        tracing::info!(
            reservation_id = %stored.id,
            customer_id = %stored.customer.id,
            room_id = %stored.room_id,
            total = stored.total_amount,
            "reservation created"
        );
        Ok(stored)
    }

    /// Applies a partial update to a `PENDING` reservation owned by the
    /// caller.
    ///
    /// A room change re-resolves the hotel and re-bases the price on the
    /// new room; the existing services keep contributing unless
    /// `service_ids` is supplied, in which case the new set (possibly
    /// empty) fully replaces the old one. The modification timestamp is
    /// refreshed and the status forced back to `PENDING`.
    pub async fn update_reservation(
        &self,
        principal: &Principal,
        id: ReservationId,
        update: ReservationUpdate
    ) -> Result<Reservation, ReservationError> {
        let mut reservation = self.load_reservation(id).await?;

        AccessPolicy::authorize_modify(principal, &reservation.customer)?;
        self.require_pending(&reservation)?;

        let mut priced_room: Option<Room> = None;

        if let Some(room_id) = update.room_id {
            let room = self.available_room(room_id).await?;
            let hotel = self
                .hotels
                .find_hotel(room.hotel_id)
                .await?
                .ok_or_else(|| ReservationError::not_found("Hotel", room.hotel_id))?;

            reservation.room_id = room.id;
            reservation.hotel_id = hotel.id;

            if update.service_ids.is_none() {
                // Keep the current services' contribution on top of the
                // new room price.
                let kept = self.resolve_services(&reservation.service_ids).await?;
                reservation.total_amount = pricing::total(&room, &kept);
            }
            priced_room = Some(room);
        }

        let start_date = update.start_date.unwrap_or(reservation.start_date);
        let end_date = update.end_date.unwrap_or(reservation.end_date);
        if start_date > end_date {
            return Err(ReservationError::InvalidInput {
                field: "startDate".to_string(),
                reason: "start date is after end date".to_string()
            });
        }
        reservation.start_date = start_date;
        reservation.end_date = end_date;

        if let Some(ids) = update.service_ids {
            let service_ids = dedupe(&ids);
            let selected = self.resolve_services(&service_ids).await?;
            let room = match priced_room {
                Some(room) => room,
                None => self
                    .rooms
                    .find_room(reservation.room_id)
                    .await?
                    .ok_or_else(|| ReservationError::not_found("Room", reservation.room_id))?
            };
            reservation.total_amount = pricing::total(&room, &selected);
            reservation.service_ids = service_ids;
        }

        reservation.status = ReservationStatus::Pending;
        reservation.booked_at = self.clock.now();

        self.store.update(&reservation).await?;
        counter!("innkeep_reservations_updated_total").increment(1);
        tracing::info!(
            reservation_id = %reservation.id,
            total = reservation.total_amount,
            "reservation updated"
        );
        Ok(reservation)
    }

    /// Removes a reservation. Customers may delete their own `PENDING`
    /// reservations; the hotel's operator may delete regardless of
    /// status.
    pub async fn delete_reservation(
        &self,
        principal: &Principal,
        id: ReservationId
    ) -> Result<(), ReservationError> {
        let reservation = self.load_reservation(id).await?;
        let hotel = self.hotels.find_hotel(reservation.hotel_id).await?;

        let granted =
            AccessPolicy::authorize_delete(principal, &reservation.customer, hotel.as_ref())?;
        if granted == Relationship::Owner {
            self.require_pending(&reservation)?;
        }

        self.store.delete_by_id(id).await?;
        counter!("innkeep_reservations_deleted_total").increment(1);
        tracing::info!(reservation_id = %id, by = %principal.user_id, "reservation deleted");
        Ok(())
    }

    /// Transitions a `PENDING` reservation to `CONFIRMED`.
    ///
    /// Authorized for the owning customer, the hotel's operator, or
    /// anyone when the stay starts today or tomorrow (automatic
    /// eligibility). Emits a best-effort approval notice on success.
    pub async fn confirm_reservation(
        &self,
        principal: &Principal,
        id: ReservationId
    ) -> Result<Reservation, ReservationError> {
        let mut reservation = self.load_reservation(id).await?;
        self.require_pending(&reservation)?;

        let hotel = self.hotels.find_hotel(reservation.hotel_id).await?;
        let auto_eligible = self.auto_confirm_eligible(&reservation);
        AccessPolicy::authorize_confirm(
            principal,
            &reservation.customer,
            hotel.as_ref(),
            auto_eligible
        )?;

        reservation.status = ReservationStatus::Confirmed;
        self.store.update(&reservation).await?;
        counter!("innkeep_reservations_confirmed_total").increment(1);
        tracing::info!(
            reservation_id = %id,
            by = %principal.user_id,
            auto_eligible,
            "reservation confirmed"
        );

        self.send_approval_notice(&reservation, hotel.as_ref(), principal)
            .await;
        Ok(reservation)
    }

    /// Transitions a `PENDING` reservation to `CANCELLED`. Owner or
    /// hotel operator only; there is no automatic path.
    pub async fn cancel_reservation(
        &self,
        principal: &Principal,
        id: ReservationId
    ) -> Result<Reservation, ReservationError> {
        let mut reservation = self.load_reservation(id).await?;
        self.require_pending(&reservation)?;

        let hotel = self.hotels.find_hotel(reservation.hotel_id).await?;
        AccessPolicy::authorize_cancel(principal, &reservation.customer, hotel.as_ref())?;

        reservation.status = ReservationStatus::Cancelled;
        self.store.update(&reservation).await?;
        counter!("innkeep_reservations_cancelled_total").increment(1);
        tracing::info!(reservation_id = %id, by = %principal.user_id, "reservation cancelled");
        Ok(reservation)
    }

    // ---------------- pricing ----------------

    /// Reprices a reservation from the current catalog records:
    /// `room.price + Σ service.price`. Read-only; services that no
    /// longer exist in the catalog simply do not contribute.
    pub async fn compute_total(&self, id: ReservationId) -> Result<f64, ReservationError> {
        let reservation = self.load_reservation(id).await?;
        let room = self
            .rooms
            .find_room(reservation.room_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Room", reservation.room_id))?;

        let mut selected = Vec::with_capacity(reservation.service_ids.len());
        for service_id in &reservation.service_ids {
            if let Some(service) = self.services.find_service(*service_id).await? {
                selected.push(service);
            }
        }

        Ok(pricing::total(&room, &selected))
    }

    // ---------------- queries ----------------

    /// Fetches one reservation, visible to its owner, its hotel's
    /// operator, or the platform operator.
    pub async fn reservation_by_id(
        &self,
        principal: &Principal,
        id: ReservationId
    ) -> Result<Reservation, ReservationError> {
        let reservation = self.load_reservation(id).await?;
        let hotel = self.hotels.find_hotel(reservation.hotel_id).await?;
        AccessPolicy::authorize_view(principal, &reservation.customer, hotel.as_ref())?;
        Ok(reservation)
    }

    /// All reservations belonging to `client_id`, scoped by role: the
    /// customer sees their own, a hotel operator the portion booked into
    /// their hotels, the platform operator everything.
    pub async fn reservations_by_client(
        &self,
        principal: &Principal,
        client_id: UserId
    ) -> Result<Vec<Reservation>, ReservationError> {
        let scope = AccessPolicy::client_history_scope(principal, client_id)?;
        let reservations = self.store.find_by_client(client_id).await?;
        self.scope_results(principal, scope, reservations).await
    }

    /// All reservations booked into `hotel_id`; the hotel's operator or
    /// the platform operator only.
    pub async fn reservations_by_hotel(
        &self,
        principal: &Principal,
        hotel_id: HotelId
    ) -> Result<Vec<Reservation>, ReservationError> {
        let scope = AccessPolicy::hotel_query_scope(principal)?;
        if scope == QueryScope::OwnHotels {
            let hotel = self
                .hotels
                .find_hotel(hotel_id)
                .await?
                .ok_or_else(|| ReservationError::not_found("Hotel", hotel_id))?;
            if !hotel.operator.matches(principal) {
                return Err(ReservationError::Unauthorized {
                    reason: "not the operator of this hotel".to_string()
                });
            }
        }
        Ok(self.store.find_by_hotel(hotel_id).await?)
    }

    /// Confirmed reservations whose stay covers today, scoped to the
    /// caller's hotels for operators.
    pub async fn active_reservations(
        &self,
        principal: &Principal
    ) -> Result<Vec<Reservation>, ReservationError> {
        let scope = AccessPolicy::hotel_query_scope(principal)?;
        let reservations = self
            .store
            .find_active(ReservationStatus::Confirmed, self.clock.today())
            .await?;
        self.scope_results(principal, scope, reservations).await
    }

    /// Conjunctive search over the reservation set. Hotel operators are
    /// confined to their own hotels: naming someone else's hotel is
    /// `Unauthorized`, and an unfiltered search fans out over the
    /// caller's hotels.
    pub async fn search(
        &self,
        principal: &Principal,
        filter: ReservationFilter
    ) -> Result<Vec<Reservation>, ReservationError> {
        let scope = AccessPolicy::hotel_query_scope(principal)?;
        if scope == QueryScope::All {
            return Ok(self.store.search(&filter).await?);
        }

        let own: Vec<HotelId> = self
            .hotels
            .hotels_by_operator(principal.user_id)
            .await?
            .into_iter()
            .map(|hotel| hotel.id)
            .collect();

        if let Some(hotel_id) = filter.hotel_id {
            if !own.contains(&hotel_id) {
                return Err(ReservationError::Unauthorized {
                    reason: "not the operator of this hotel".to_string()
                });
            }
            return Ok(self.store.search(&filter).await?);
        }

        let mut results = Vec::new();
        for hotel_id in own {
            let scoped = ReservationFilter {
                hotel_id: Some(hotel_id),
                ..filter.clone()
            };
            results.extend(self.store.search(&scoped).await?);
        }
        Ok(results)
    }

    /// Sum of `total_amount` over one client's reservations, with the
    /// same scoping as [`Self::reservations_by_client`].
    pub async fn total_amount_by_client(
        &self,
        principal: &Principal,
        client_id: UserId
    ) -> Result<f64, ReservationError> {
        let scope = AccessPolicy::client_history_scope(principal, client_id)?;
        match scope {
            QueryScope::All | QueryScope::SelfOnly => {
                Ok(self.store.total_amount_by_client(client_id).await?)
            }
            QueryScope::OwnHotels => {
                let reservations = self.store.find_by_client(client_id).await?;
                let scoped = self
                    .scope_results(principal, QueryScope::OwnHotels, reservations)
                    .await?;
                Ok(scoped.iter().map(|r| r.total_amount).sum())
            }
        }
    }

    // ---------------- internals ----------------

    async fn load_reservation(
        &self,
        id: ReservationId
    ) -> Result<Reservation, ReservationError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Reservation", id))
    }

    async fn available_room(&self, room_id: RoomId) -> Result<Room, ReservationError> {
        self.rooms
            .find_room(room_id)
            .await?
            .filter(|room| room.available)
            .ok_or(ReservationError::RoomUnavailable {
                room_id: room_id.get()
            })
    }

    fn require_pending(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        if reservation.status == ReservationStatus::Pending {
            Ok(())
        } else {
            Err(ReservationError::InvalidStatus {
                current: reservation.status.to_string()
            })
        }
    }

    /// Resolves every id or fails on the first missing one.
    async fn resolve_services(
        &self,
        ids: &[ServiceId]
    ) -> Result<Vec<ServiceOffering>, ReservationError> {
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let service = self.services.find_service(*id).await?.ok_or(
                ReservationError::ServiceNotFound {
                    service_id: id.get()
                }
            )?;
            selected.push(service);
        }
        Ok(selected)
    }

    /// Whether the stay starts today or tomorrow, which makes the
    /// reservation confirmable without an ownership check.
    fn auto_confirm_eligible(&self, reservation: &Reservation) -> bool {
        let today = self.clock.today();
        reservation.start_date >= today
            && reservation
                .start_date
                .signed_duration_since(today)
                .num_days()
                <= 1
    }

    /// Applies `OwnHotels` scoping to a result set; `All` and `SelfOnly`
    /// pass through (self-scoping happened in the store query).
    async fn scope_results(
        &self,
        principal: &Principal,
        scope: QueryScope,
        reservations: Vec<Reservation>
    ) -> Result<Vec<Reservation>, ReservationError> {
        if scope != QueryScope::OwnHotels {
            return Ok(reservations);
        }
        let own: HashSet<HotelId> = self
            .hotels
            .hotels_by_operator(principal.user_id)
            .await?
            .into_iter()
            .map(|hotel| hotel.id)
            .collect();
        Ok(reservations
            .into_iter()
            .filter(|reservation| own.contains(&reservation.hotel_id))
            .collect())
    }

    async fn send_approval_notice(
        &self,
        reservation: &Reservation,
        hotel: Option<&Hotel>,
        approver: &Principal
    ) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let recipients: Vec<String> = hotel
            .map(|h| vec![h.operator.email.clone()])
            .unwrap_or_default();
        if let Err(error) = notifier
            .send_approval_notice(&reservation.customer.email, &approver.login, &recipients)
            .await
        {
            // Best-effort: a failed notice never fails the confirmation.
            tracing::warn!(
                reservation_id = %reservation.id,
                error = %error,
                "approval notice delivery failed"
            );
        }
    }
}

fn dedupe(ids: &[ServiceId]) -> Vec<ServiceId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

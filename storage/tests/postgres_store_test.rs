//! PostgreSQL store integration tests.
//!
//! Runs against the shared testcontainers fixture; each test skips when
//! Docker is unavailable.

use chrono::{NaiveDate, Utc};
use ik_core::traits::{HotelCatalog, ReservationStore, RoomCatalog, ServiceCatalog};
use ik_core::types::{
    HotelId, Reservation, ReservationFilter, ReservationId, ReservationStatus, Role, RoomId,
    ServiceId, UserId, UserRef
};
use storage::PostgresStore;

struct Seed {
    customer: UserId,
    customer_email: String,
    hotel: HotelId,
    room: RoomId,
    breakfast: ServiceId
}

async fn seeded_store() -> Option<(PostgresStore, Seed)> {
    let fixture = testing::postgres().await?;
    let store = PostgresStore::connect(fixture.url()).await.ok()?;
    store.initialize_schema().await.unwrap();

    let operator_email = testing::unique_email("operator");
    let operator = store
        .insert_user(Some("Omar"), &operator_email, None, Role::HotelOperator)
        .await
        .unwrap();

    let customer_email = testing::unique_email("customer");
    let customer = store
        .insert_user(Some("Alice"), &customer_email, Some("alice"), Role::Customer)
        .await
        .unwrap();

    let hotel = store
        .insert_hotel("Grand Central", "1 Main St", 4, operator)
        .await
        .unwrap();
    let room = store
        .insert_room("101", "double", 150.0, true, hotel)
        .await
        .unwrap();
    let breakfast = store
        .insert_service("Breakfast", None, Some(20.0), hotel)
        .await
        .unwrap();

    Some((
        store,
        Seed {
            customer,
            customer_email,
            hotel,
            room,
            breakfast
        }
    ))
}

fn reservation(seed: &Seed, status: ReservationStatus) -> Reservation {
    Reservation {
        id: ReservationId::new(0),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
        booked_at: Utc::now(),
        status,
        total_amount: 170.0,
        customer: UserRef::new(seed.customer, seed.customer_email.clone())
            .with_username("alice"),
        room_id: seed.room,
        hotel_id: seed.hotel,
        service_ids: vec![seed.breakfast]
    }
}

#[tokio::test]
async fn reservation_round_trip_keeps_services() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let stored = store
        .insert(reservation(&seed, ReservationStatus::Pending))
        .await
        .unwrap();
    assert!(stored.id.get() > 0);

    let loaded = store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ReservationStatus::Pending);
    assert_eq!(loaded.total_amount, 170.0);
    assert_eq!(loaded.service_ids, vec![seed.breakfast]);
    assert_eq!(loaded.customer.email, seed.customer_email);
}

#[tokio::test]
async fn update_replaces_service_associations() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let stored = store
        .insert(reservation(&seed, ReservationStatus::Pending))
        .await
        .unwrap();

    let mut changed = stored.clone();
    changed.service_ids = vec![];
    changed.total_amount = 150.0;
    changed.status = ReservationStatus::Confirmed;
    store.update(&changed).await.unwrap();

    let loaded = store.find_by_id(stored.id).await.unwrap().unwrap();
    assert!(loaded.service_ids.is_empty());
    assert_eq!(loaded.status, ReservationStatus::Confirmed);
    assert_eq!(loaded.total_amount, 150.0);
}

#[tokio::test]
async fn update_of_missing_row_rolls_back_as_not_found() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let mut ghost = reservation(&seed, ReservationStatus::Pending);
    ghost.id = ReservationId::new(999_999_999);
    assert!(store.update(&ghost).await.is_err());
}

#[tokio::test]
async fn search_is_conjunctive_and_status_case_insensitive() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let confirmed = store
        .insert(reservation(&seed, ReservationStatus::Confirmed))
        .await
        .unwrap();
    store
        .insert(reservation(&seed, ReservationStatus::Pending))
        .await
        .unwrap();

    let filter = ReservationFilter {
        hotel_id: Some(seed.hotel),
        status: Some("confirmed".parse().unwrap()),
        ..Default::default()
    };
    let hits = store.search(&filter).await.unwrap();
    assert!(hits.iter().any(|r| r.id == confirmed.id));
    assert!(hits.iter().all(|r| r.status == ReservationStatus::Confirmed));
    assert!(hits.iter().all(|r| r.hotel_id == seed.hotel));
}

#[tokio::test]
async fn active_reservations_cover_the_given_date() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let stored = store
        .insert(reservation(&seed, ReservationStatus::Confirmed))
        .await
        .unwrap();

    let inside = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
    let active = store
        .find_active(ReservationStatus::Confirmed, inside)
        .await
        .unwrap();
    assert!(active.iter().any(|r| r.id == stored.id));

    let outside = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let none = store
        .find_active(ReservationStatus::Confirmed, outside)
        .await
        .unwrap();
    assert!(none.iter().all(|r| r.id != stored.id));
}

#[tokio::test]
async fn catalog_lookups_resolve_operator_and_prices() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let room = store.find_room(seed.room).await.unwrap().unwrap();
    assert_eq!(room.price, 150.0);
    assert_eq!(room.hotel_id, seed.hotel);

    let hotel = store.find_hotel(seed.hotel).await.unwrap().unwrap();
    assert_eq!(hotel.stars, 4);
    let operated = store
        .hotels_by_operator(hotel.operator.id)
        .await
        .unwrap();
    assert!(operated.iter().any(|h| h.id == seed.hotel));

    let breakfast = store.find_service(seed.breakfast).await.unwrap().unwrap();
    assert_eq!(breakfast.price, Some(20.0));

    assert!(
        store
            .find_room(RoomId::new(888_888_888))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn delete_cascades_and_totals_sum() {
    let Some((store, seed)) = seeded_store().await else {
        eprintln!("skipping: no docker available");
        return;
    };

    let first = store
        .insert(reservation(&seed, ReservationStatus::Pending))
        .await
        .unwrap();
    store
        .insert(reservation(&seed, ReservationStatus::Pending))
        .await
        .unwrap();

    let before = store.total_amount_by_client(seed.customer).await.unwrap();
    assert!(before >= 340.0);

    store.delete_by_id(first.id).await.unwrap();
    assert!(store.find_by_id(first.id).await.unwrap().is_none());
    assert!(store.delete_by_id(first.id).await.is_err());

    let after = store.total_amount_by_client(seed.customer).await.unwrap();
    assert_eq!(after, before - 170.0);
}

//! End-to-end lifecycle tests over the in-memory backend.

use std::sync::Arc;

use chrono::NaiveDate;
use errors::{ErrorKind, ReservationError};
use ik_core::types::{
    CreateReservation, Principal, ReservationFilter, ReservationId, ReservationStatus,
    ReservationUpdate, Role, UserId
};
use reservations::ReservationManager;
use testing::{FixedClock, SeededWorld};

const TODAY: &str = "2025-06-01";

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn manager(world: &SeededWorld) -> ReservationManager {
    manager_at(world, TODAY)
}

fn manager_at(world: &SeededWorld, today: &str) -> ReservationManager {
    ReservationManager::new(
        world.catalog.clone(),
        world.catalog.clone(),
        world.catalog.clone(),
        world.store.clone(),
    )
    .with_clock(Arc::new(FixedClock::on(date(today))))
    .with_notifier(Arc::new(notify::LogNotifier::new()))
}

fn booking(world: &SeededWorld) -> CreateReservation {
    CreateReservation {
        room_id: world.room_101,
        start_date: date("2025-06-10"),
        end_date: date("2025-06-12"),
        service_ids: vec![],
    }
}

fn kind(err: &ReservationError) -> ErrorKind {
    err.kind()
}

// -------- create --------

#[tokio::test]
async fn create_prices_room_plus_services_and_starts_pending() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let reservation = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                service_ids: vec![world.breakfast, world.spa],
                ..booking(&world)
            },
        )
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.total_amount, 205.0);
    assert_eq!(reservation.hotel_id, world.grand_central);
    assert_eq!(reservation.customer.id, world.alice.user_id);
    assert_eq!(world.store.len(), 1);
}

#[tokio::test]
async fn create_by_non_customer_is_unauthorized() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    for principal in [&world.operator_grand, &world.platform] {
        let err = manager
            .create_reservation(principal, booking(&world))
            .await
            .unwrap_err();
        assert_eq!(kind(&err), ErrorKind::Unauthorized);
    }
    assert_eq!(world.store.len(), 0);
}

#[tokio::test]
async fn create_rejects_unavailable_or_unknown_room() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let unavailable = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                room_id: world.room_103,
                ..booking(&world)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&unavailable), ErrorKind::Conflict);

    let unknown = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                room_id: ik_core::types::RoomId::new(999),
                ..booking(&world)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&unknown), ErrorKind::Conflict);
}

#[tokio::test]
async fn create_fails_on_first_missing_service() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let err = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                service_ids: vec![world.breakfast, ik_core::types::ServiceId::new(77)],
                ..booking(&world)
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReservationError::ServiceNotFound { service_id: 77 }
    ));
    assert_eq!(world.store.len(), 0);
}

#[tokio::test]
async fn create_rejects_reversed_dates() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let err = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                start_date: date("2025-06-12"),
                end_date: date("2025-06-10"),
                ..booking(&world)
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn create_treats_unpriced_services_as_free() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let reservation = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                service_ids: vec![world.late_checkout],
                ..booking(&world)
            },
        )
        .await
        .unwrap();
    assert_eq!(reservation.total_amount, 150.0);
}

// -------- update --------

#[tokio::test]
async fn update_by_stranger_is_unauthorized() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .update_reservation(
            &world.bob,
            reservation.id,
            ReservationUpdate {
                start_date: Some(date("2025-06-11")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn update_replaces_services_and_reprices() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    assert_eq!(reservation.total_amount, 150.0);

    // Scenario: add Breakfast (20) to a 150.0 room.
    let updated = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                service_ids: Some(vec![world.breakfast]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total_amount, 170.0);
    assert_eq!(updated.service_ids, vec![world.breakfast]);

    // An explicitly empty list clears the selection and reprices.
    let cleared = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                service_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.total_amount, 150.0);
    assert!(cleared.service_ids.is_empty());
}

#[tokio::test]
async fn room_change_rebases_price_and_keeps_service_contribution() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                service_ids: vec![world.breakfast],
                ..booking(&world)
            },
        )
        .await
        .unwrap();
    assert_eq!(reservation.total_amount, 170.0);

    // Move to room 102 (200.0) without touching services.
    let moved = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                room_id: Some(world.room_102),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.total_amount, 220.0);
    assert_eq!(moved.service_ids, vec![world.breakfast]);

    // Move again, replacing services in the same update.
    let replaced = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                room_id: Some(world.room_101),
                service_ids: Some(vec![world.spa]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.total_amount, 185.0);
    assert_eq!(replaced.hotel_id, world.grand_central);
}

#[tokio::test]
async fn update_validates_the_merged_date_range() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    // New start after the existing end.
    let err = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                start_date: Some(date("2025-06-20")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::InvalidInput);

    // Both supplied and coherent.
    let moved = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                start_date: Some(date("2025-06-20")),
                end_date: Some(date("2025-06-22")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.start_date, date("2025-06-20"));
    assert_eq!(moved.end_date, date("2025-06-22"));
}

#[tokio::test]
async fn update_requires_pending_status() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .confirm_reservation(&world.alice, reservation.id)
        .await
        .unwrap();

    let err = manager
        .update_reservation(
            &world.alice,
            reservation.id,
            ReservationUpdate {
                start_date: Some(date("2025-06-11")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn update_of_unknown_reservation_is_not_found() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let err = manager
        .update_reservation(
            &world.alice,
            ReservationId::new(404),
            ReservationUpdate::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::NotFound);
}

// -------- confirm / cancel --------

#[tokio::test]
async fn confirm_then_second_confirm_conflicts() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let confirmed = manager
        .confirm_reservation(&world.alice, reservation.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    let err = manager
        .confirm_reservation(&world.alice, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn operator_confirms_a_strangers_reservation_in_their_hotel() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let confirmed = manager
        .confirm_reservation(&world.operator_grand, reservation.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn foreign_operator_cannot_confirm_or_cancel() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    let err = manager
        .confirm_reservation(&world.operator_seaside, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    let err = manager
        .cancel_reservation(&world.operator_seaside, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn near_start_date_confirm_needs_no_ownership() {
    let world = SeededWorld::new();
    // Stay starts 2025-06-10; a clock the day before is within the window.
    let manager = manager_at(&world, "2025-06-09");
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let confirmed = manager
        .confirm_reservation(&world.bob, reservation.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn far_start_date_gives_no_automatic_confirm() {
    let world = SeededWorld::new();
    let manager = manager(&world); // 2025-06-01, nine days ahead of the stay
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .confirm_reservation(&world.bob, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn past_start_date_gives_no_automatic_confirm() {
    let world = SeededWorld::new();
    let manager = manager_at(&world, "2025-06-20"); // after the stay began
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .confirm_reservation(&world.bob, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn cancel_twice_yields_conflict_the_second_time() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let cancelled = manager
        .cancel_reservation(&world.alice, reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    let err = manager
        .cancel_reservation(&world.alice, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn cancel_has_no_near_start_date_path() {
    let world = SeededWorld::new();
    let manager = manager_at(&world, "2025-06-09");
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .cancel_reservation(&world.bob, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

// -------- delete --------

#[tokio::test]
async fn customer_deletes_only_their_own_pending_reservation() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .delete_reservation(&world.bob, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    manager
        .confirm_reservation(&world.alice, reservation.id)
        .await
        .unwrap();
    let err = manager
        .delete_reservation(&world.alice, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Conflict);
    assert_eq!(world.store.len(), 1);
}

#[tokio::test]
async fn operator_deletes_regardless_of_status() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .confirm_reservation(&world.alice, reservation.id)
        .await
        .unwrap();

    manager
        .delete_reservation(&world.operator_grand, reservation.id)
        .await
        .unwrap();
    assert_eq!(world.store.len(), 0);
}

#[tokio::test]
async fn platform_operator_cannot_delete() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let err = manager
        .delete_reservation(&world.platform, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

// -------- pricing --------

#[tokio::test]
async fn compute_total_includes_services() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                service_ids: vec![world.breakfast, world.spa, world.late_checkout],
                ..booking(&world)
            },
        )
        .await
        .unwrap();

    let total = manager.compute_total(reservation.id).await.unwrap();
    assert_eq!(total, 205.0);
}

#[tokio::test]
async fn compute_total_for_unknown_reservation_is_not_found() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let err = manager
        .compute_total(ReservationId::new(404))
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::NotFound);
}

// -------- queries --------

#[tokio::test]
async fn client_history_is_scoped_by_role() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                room_id: world.room_201,
                ..booking(&world)
            },
        )
        .await
        .unwrap();

    // The customer sees both of their reservations.
    let own = manager
        .reservations_by_client(&world.alice, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(own.len(), 2);

    // Another customer's history is off-limits.
    let err = manager
        .reservations_by_client(&world.bob, world.alice.user_id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    // The Grand Central operator sees only the stay in their hotel.
    let scoped = manager
        .reservations_by_client(&world.operator_grand, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].hotel_id, world.grand_central);

    // The platform operator sees everything.
    let all = manager
        .reservations_by_client(&world.platform, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn hotel_listing_requires_operating_that_hotel() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    let listed = manager
        .reservations_by_hotel(&world.operator_grand, world.grand_central)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let err = manager
        .reservations_by_hotel(&world.operator_seaside, world.grand_central)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    let err = manager
        .reservations_by_hotel(&world.alice, world.grand_central)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    let platform_view = manager
        .reservations_by_hotel(&world.platform, world.grand_central)
        .await
        .unwrap();
    assert_eq!(platform_view.len(), 1);
}

#[tokio::test]
async fn active_means_confirmed_and_covering_today() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let current = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .confirm_reservation(&world.alice, current.id)
        .await
        .unwrap();

    // Confirmed but outside the stay window today.
    let later = manager
        .create_reservation(
            &world.bob,
            CreateReservation {
                start_date: date("2025-07-01"),
                end_date: date("2025-07-03"),
                ..booking(&world)
            },
        )
        .await
        .unwrap();
    manager
        .confirm_reservation(&world.bob, later.id)
        .await
        .unwrap();

    // Pending stay covering today.
    manager
        .create_reservation(&world.bob, booking(&world))
        .await
        .unwrap();

    let during_stay = manager_at(&world, "2025-06-11");
    let active = during_stay
        .active_reservations(&world.operator_grand)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, current.id);
}

#[tokio::test]
async fn search_filters_conjunctively_with_case_insensitive_status() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    let in_grand = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .confirm_reservation(&world.alice, in_grand.id)
        .await
        .unwrap();
    manager
        .create_reservation(&world.bob, booking(&world))
        .await
        .unwrap();

    let filter = ReservationFilter {
        hotel_id: Some(world.grand_central),
        status: Some("confirmed".parse().unwrap()),
        ..Default::default()
    };

    let hits = manager
        .search(&world.operator_grand, filter.clone())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, in_grand.id);

    let platform_hits = manager.search(&world.platform, filter).await.unwrap();
    assert_eq!(platform_hits.len(), 1);
}

#[tokio::test]
async fn search_scopes_operators_to_their_hotels() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();
    manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                room_id: world.room_201,
                ..booking(&world)
            },
        )
        .await
        .unwrap();

    // Unfiltered search fans out over the operator's hotels only.
    let grand_only = manager
        .search(&world.operator_grand, ReservationFilter::default())
        .await
        .unwrap();
    assert_eq!(grand_only.len(), 1);
    assert_eq!(grand_only[0].hotel_id, world.grand_central);

    // Naming another operator's hotel is rejected outright.
    let err = manager
        .search(
            &world.operator_grand,
            ReservationFilter {
                hotel_id: Some(world.seaside),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    // Customers cannot search at all.
    let err = manager
        .search(&world.alice, ReservationFilter::default())
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn totals_sum_with_role_scoping() {
    let world = SeededWorld::new();
    let manager = manager(&world);

    manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap(); // 150.0 at Grand Central
    manager
        .create_reservation(
            &world.alice,
            CreateReservation {
                room_id: world.room_201,
                ..booking(&world)
            },
        )
        .await
        .unwrap(); // 120.0 at Seaside

    let own_total = manager
        .total_amount_by_client(&world.alice, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(own_total, 270.0);

    let err = manager
        .total_amount_by_client(&world.bob, world.alice.user_id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    let grand_share = manager
        .total_amount_by_client(&world.operator_grand, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(grand_share, 150.0);

    let platform_total = manager
        .total_amount_by_client(&world.platform, world.alice.user_id)
        .await
        .unwrap();
    assert_eq!(platform_total, 270.0);
}

#[tokio::test]
async fn reservation_by_id_respects_visibility() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    assert!(
        manager
            .reservation_by_id(&world.alice, reservation.id)
            .await
            .is_ok()
    );
    assert!(
        manager
            .reservation_by_id(&world.operator_grand, reservation.id)
            .await
            .is_ok()
    );
    assert!(
        manager
            .reservation_by_id(&world.platform, reservation.id)
            .await
            .is_ok()
    );

    let err = manager
        .reservation_by_id(&world.bob, reservation.id)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Unauthorized);

    let err = manager
        .reservation_by_id(&world.alice, ReservationId::new(404))
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::NotFound);
}

// -------- ownership by login --------

#[tokio::test]
async fn ownership_matches_login_case_insensitively() {
    let world = SeededWorld::new();
    let manager = manager(&world);
    let reservation = manager
        .create_reservation(&world.alice, booking(&world))
        .await
        .unwrap();

    // Same person, different id and shouty login, as issued by a second
    // identity provider.
    let alias = Principal::new(UserId::new(9000), Role::Customer, "ALICE@EXAMPLE.COM");
    let cancelled = manager
        .cancel_reservation(&alias, reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

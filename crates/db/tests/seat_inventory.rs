//! Integration tests for seat inventory and hold persistence.
//!
//! Exercises the conditional-update contract against a real database:
//! - Batch seat creation and availability listing
//! - AVAILABLE -> HELD transitions that lose a race report fewer rows
//! - Hold creation with seat links
//! - Releasing an expired hold's seats without touching seats claimed elsewhere

use boxoffice_core::seats::SeatRef;
use boxoffice_core::status::{EventStatus, HoldStatus, SeatStatus, SessionStatus};
use boxoffice_db::models::seat::Seat;
use boxoffice_db::models::session::{CreateEvent, CreateSession};
use boxoffice_db::repositories::{HoldRepo, SeatRepo, SessionRepo};
use chrono::{Duration, Utc};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_session(pool: &PgPool, seat_count: i32) -> (i64, Vec<Seat>) {
    let event = SessionRepo::create_event(
        pool,
        &CreateEvent {
            tenant_id: 1,
            name: "Concert".to_string(),
            status: EventStatus::Published,
        },
    )
    .await
    .unwrap();
    let session = SessionRepo::create_session(
        pool,
        &CreateSession {
            event_id: event.id,
            starts_at: Utc::now() + Duration::days(7),
            status: SessionStatus::Published,
            price_cents: 5000,
            currency_code: "BRL".to_string(),
        },
    )
    .await
    .unwrap();

    let positions: Vec<SeatRef> = (1..=seat_count).map(|n| SeatRef::new("a", "1", n)).collect();
    let mut conn = pool.acquire().await.unwrap();
    let seats = SeatRepo::create_many(&mut conn, session.id, &positions)
        .await
        .unwrap();
    (session.id, seats)
}

fn ids(seats: &[Seat]) -> Vec<i64> {
    seats.iter().map(|s| s.id).collect()
}

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seats_are_created_available_and_normalised(pool: PgPool) {
    let (session_id, seats) = seed_session(&pool, 3).await;

    assert_eq!(seats.len(), 3);
    assert!(seats.iter().all(|s| s.status == SeatStatus::Available));
    assert!(seats.iter().all(|s| s.sector_code == "A"));

    let available = SeatRepo::list_available(&pool, session_id).await.unwrap();
    assert_eq!(available.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_by_positions_ignores_case_and_whitespace(pool: PgPool) {
    let (session_id, _) = seed_session(&pool, 3).await;

    let found = SeatRepo::find_by_positions(
        &pool,
        session_id,
        &[SeatRef::new(" a ", "1", 2), SeatRef::new("A", "1", 99)],
    )
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].seat_number, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_conditional_transition_reports_lost_race(pool: PgPool) {
    let (session_id, seats) = seed_session(&pool, 2).await;
    let seat_ids = ids(&seats);

    let first = SeatRepo::transition(&pool, &seat_ids, SeatStatus::Available, SeatStatus::Held)
        .await
        .unwrap();
    assert_eq!(first, 2);

    let second = SeatRepo::transition(&pool, &seat_ids, SeatStatus::Available, SeatStatus::Held)
        .await
        .unwrap();
    assert_eq!(second, 0, "seats already HELD must not move again");

    let held = SeatRepo::list_by_session(&pool, session_id, Some(SeatStatus::Held))
        .await
        .unwrap();
    assert_eq!(held.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_transitions_move_each_seat_once(pool: PgPool) {
    let (_, seats) = seed_session(&pool, 4).await;
    let seat_ids = ids(&seats);

    let (a, b) = futures::join!(
        SeatRepo::transition(&pool, &seat_ids, SeatStatus::Available, SeatStatus::Held),
        SeatRepo::transition(&pool, &seat_ids, SeatStatus::Available, SeatStatus::Held),
    );

    assert_eq!(a.unwrap() + b.unwrap(), 4);
}

// ---------------------------------------------------------------------------
// Holds
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hold_links_its_seats(pool: PgPool) {
    let (session_id, seats) = seed_session(&pool, 3).await;
    let seat_ids = ids(&seats[..2]);

    let mut conn = pool.acquire().await.unwrap();
    let expires_at = Utc::now() + Duration::minutes(10);
    let hold = HoldRepo::create(&mut conn, session_id, expires_at, &seat_ids)
        .await
        .unwrap();

    assert_eq!(hold.status, HoldStatus::Active);
    let linked = HoldRepo::list_seats(&pool, hold.id).await.unwrap();
    assert_eq!(ids(&linked), seat_ids);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expire_if_lapsed_leaves_open_holds_alone(pool: PgPool) {
    let (session_id, seats) = seed_session(&pool, 1).await;
    let now = Utc::now();

    let mut conn = pool.acquire().await.unwrap();
    let hold = HoldRepo::create(&mut conn, session_id, now + Duration::minutes(10), &ids(&seats))
        .await
        .unwrap();

    assert!(!HoldRepo::expire_if_lapsed(&pool, hold.id, now).await.unwrap());
    assert!(
        HoldRepo::expire_if_lapsed(&pool, hold.id, now + Duration::minutes(11))
            .await
            .unwrap()
    );
    // Already expired: a second flip is a no-op.
    assert!(
        !HoldRepo::expire_if_lapsed(&pool, hold.id, now + Duration::minutes(11))
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_skips_seats_claimed_by_another_live_hold(pool: PgPool) {
    let (session_id, seats) = seed_session(&pool, 2).await;
    let now = Utc::now();
    let all = ids(&seats);

    let mut conn = pool.acquire().await.unwrap();
    let stale = HoldRepo::create(&mut conn, session_id, now - Duration::minutes(1), &all)
        .await
        .unwrap();
    SeatRepo::transition(&pool, &all, SeatStatus::Available, SeatStatus::Held)
        .await
        .unwrap();
    // A second, live hold also references the first seat.
    HoldRepo::create(&mut conn, session_id, now + Duration::minutes(10), &all[..1])
        .await
        .unwrap();

    let lapsed = HoldRepo::find_lapsed_for_seats(&pool, &all, now).await.unwrap();
    assert_eq!(lapsed, vec![stale.id]);

    HoldRepo::expire_if_lapsed(&pool, stale.id, now).await.unwrap();
    let released = SeatRepo::release_for_hold(&pool, stale.id, now).await.unwrap();
    assert_eq!(released, 1);

    let after = SeatRepo::find_by_ids(&pool, &all).await.unwrap();
    assert_eq!(after[0].status, SeatStatus::Held);
    assert_eq!(after[1].status, SeatStatus::Available);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_seat_position_is_rejected(pool: PgPool) {
    let (session_id, _) = seed_session(&pool, 1).await;

    let mut conn = pool.acquire().await.unwrap();
    let err = SeatRepo::create_many(&mut conn, session_id, &[SeatRef::new("A", "1", 1)])
        .await
        .unwrap_err();

    assert!(boxoffice_db::tx::is_unique_violation_on(&err, "uq_seats_position"));
}

//! Races the engine must win: duplicate review submission, conflicting
//! transitions on one booking, and webhook redelivery arriving concurrently.

mod support;

use support::TestEngine;
use wayfare_domain::{BookingStatus, DomainError};

#[tokio::test]
async fn concurrent_review_submissions_allow_exactly_one() {
    let engine = TestEngine::bootstrap().await;
    let booking = engine
        .booking_in(BookingStatus::Completed, engine.instant_booking(60.0))
        .await;

    let (first, second) = tokio::join!(
        engine
            .reviews
            .create_review(booking.id, engine.tourist.id, 5, None),
        engine
            .reviews
            .create_review(booking.id, engine.tourist.id, 1, None),
    );

    let outcomes = [first, second];
    assert_eq!(
        outcomes.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one submission wins"
    );
    let loser = outcomes
        .iter()
        .find(|r| r.is_err())
        .and_then(|r| r.as_ref().err())
        .expect("one submission loses");
    assert!(matches!(loser, DomainError::DuplicateReview { .. }));

    // The rating reflects the single surviving review.
    let rating_sources = engine
        .reviews
        .list_for_guide(engine.guide.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(rating_sources.len(), 1);
}

#[tokio::test]
async fn concurrent_start_and_cancel_cannot_both_win() {
    let engine = TestEngine::bootstrap().await;
    let booking = engine
        .booking_in(BookingStatus::Confirmed, engine.instant_booking(60.0))
        .await;

    let (started, cancelled) = tokio::join!(
        engine.bookings.start_tour(booking.id, engine.guide.user_id),
        engine
            .bookings
            .cancel_booking(booking.id, engine.tourist.user_id),
    );

    let winners = usize::from(started.is_ok()) + usize::from(cancelled.is_ok());
    assert_eq!(winners, 1, "start and cancel must serialize");

    let final_status = engine.bookings.get(booking.id).await.unwrap().status;
    match (started.is_ok(), cancelled.is_ok()) {
        (true, false) => assert_eq!(final_status, BookingStatus::Started),
        (false, true) => assert_eq!(final_status, BookingStatus::Cancelled),
        _ => unreachable!("exactly one side won"),
    }
}

#[tokio::test]
async fn concurrent_webhook_redeliveries_confirm_once() {
    let engine = TestEngine::bootstrap().await;
    let created = engine
        .bookings
        .create_booking(engine.instant_booking(60.0))
        .await
        .unwrap();
    let id = created.booking.id;

    let (a, b) = tokio::join!(
        engine.bookings.confirm_payment(id, "pi_dup"),
        engine.bookings.confirm_payment(id, "pi_dup"),
    );

    // Redelivery is a no-op, not an error: both calls succeed.
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(
        engine.bookings.get(id).await.unwrap().status,
        BookingStatus::Confirmed
    );

    // But only one confirmation reached each party.
    assert_eq!(
        engine
            .notifications_of(engine.tourist.user_id, "BookingConfirmed")
            .len(),
        1
    );
    assert_eq!(
        engine
            .notifications_of(engine.guide.user_id, "BookingConfirmed")
            .len(),
        1
    );
}

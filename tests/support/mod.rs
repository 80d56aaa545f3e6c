//! Shared test harness: a fully wired engine over in-memory stores and the
//! recording payment gateway.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use wayfare_domain::persistence::{
    BookingRepository, GuideRepository, InMemoryBookingStore, InMemoryGuideStore,
    InMemoryLocationStore, InMemoryMessageStore, InMemoryReviewStore, InMemoryTouristStore,
    TouristRepository,
};
use wayfare_domain::{
    Booking, BookingService, BookingStatus, BookingType, EngineConfig, Guide, LocationService,
    MessagingService, NewBooking, Notification, NotificationHub, RecordingPaymentGateway,
    ReviewService, Tourist, UserId,
};

/// The whole engine wired together, plus handles the tests poke directly.
pub struct TestEngine {
    pub bookings: Arc<BookingService>,
    pub messaging: MessagingService,
    pub reviews: ReviewService,
    pub locations: LocationService,
    pub notifications: Arc<NotificationHub>,
    pub gateway: Arc<RecordingPaymentGateway>,
    pub booking_store: Arc<InMemoryBookingStore>,
    pub guide_store: Arc<InMemoryGuideStore>,
    pub tourist_store: Arc<InMemoryTouristStore>,
    pub guide: Guide,
    pub tourist: Tourist,
}

impl TestEngine {
    /// Build the engine with one available guide and one tourist registered.
    pub async fn bootstrap() -> Self {
        let config = EngineConfig::default();

        let booking_store = Arc::new(InMemoryBookingStore::new());
        let guide_store = Arc::new(InMemoryGuideStore::new());
        let tourist_store = Arc::new(InMemoryTouristStore::new());
        let notifications = Arc::new(NotificationHub::new(config.notification_capacity));
        let gateway = Arc::new(RecordingPaymentGateway::new());

        let guide = guide_store
            .insert(Guide::new(UserId::new(), true))
            .await
            .expect("insert guide");
        let tourist = tourist_store
            .insert(Tourist::new(UserId::new()))
            .await
            .expect("insert tourist");

        let bookings = Arc::new(BookingService::new(
            booking_store.clone(),
            guide_store.clone(),
            tourist_store.clone(),
            gateway.clone(),
            notifications.clone(),
            config.clone(),
        ));
        let messaging = MessagingService::new(
            bookings.clone(),
            Arc::new(InMemoryMessageStore::new()),
            notifications.clone(),
        );
        let reviews = ReviewService::new(
            bookings.clone(),
            Arc::new(InMemoryReviewStore::new()),
            guide_store.clone(),
        );
        let locations = LocationService::new(
            bookings.clone(),
            Arc::new(InMemoryLocationStore::new()),
            notifications.clone(),
            config.location_history_limit,
        );

        Self {
            bookings,
            messaging,
            reviews,
            locations,
            notifications,
            gateway,
            booking_store,
            guide_store,
            tourist_store,
            guide,
            tourist,
        }
    }

    /// Register another guide profile.
    pub async fn add_guide(&self, is_available: bool) -> Guide {
        self.guide_store
            .insert(Guide::new(UserId::new(), is_available))
            .await
            .expect("insert guide")
    }

    /// Register another tourist profile.
    pub async fn add_tourist(&self) -> Tourist {
        self.tourist_store
            .insert(Tourist::new(UserId::new()))
            .await
            .expect("insert tourist")
    }

    /// Valid INSTANT booking input against the default guide and tourist.
    pub fn instant_booking(&self, total_price: f64) -> NewBooking {
        NewBooking {
            tourist_id: self.tourist.id,
            guide_id: self.guide.id,
            tour_id: None,
            booking_type: BookingType::Instant,
            scheduled_date: None,
            duration_minutes: 90,
            meeting_point: "Astronomical clock, old town side".to_string(),
            total_price,
        }
    }

    /// Valid SCHEDULED booking input `hours_out` hours in the future.
    pub fn scheduled_booking(&self, total_price: f64, hours_out: i64) -> NewBooking {
        NewBooking {
            scheduled_date: Some(chrono::Utc::now() + chrono::Duration::hours(hours_out)),
            booking_type: BookingType::Scheduled,
            ..self.instant_booking(total_price)
        }
    }

    /// Create a booking and walk it through the lifecycle up to `status`.
    pub async fn booking_in(&self, status: BookingStatus, input: NewBooking) -> Booking {
        let created = self
            .bookings
            .create_booking(input)
            .await
            .expect("create booking");
        let id = created.booking.id;

        match status {
            BookingStatus::Pending => {}
            BookingStatus::Confirmed => {
                self.confirm(id).await;
            }
            BookingStatus::Started => {
                self.confirm(id).await;
                self.bookings
                    .start_tour(id, self.guide.user_id)
                    .await
                    .expect("start tour");
            }
            BookingStatus::Completed => {
                self.confirm(id).await;
                self.bookings
                    .start_tour(id, self.guide.user_id)
                    .await
                    .expect("start tour");
                self.bookings
                    .complete_tour(id, self.guide.user_id)
                    .await
                    .expect("complete tour");
            }
            BookingStatus::Cancelled => {
                self.bookings
                    .cancel_booking(id, self.tourist.user_id)
                    .await
                    .expect("cancel booking");
            }
            // No engine operation produces REFUNDED; seed it directly the way
            // an out-of-band settlement would land in storage.
            BookingStatus::Refunded => {
                let mut booking = created.booking.clone();
                booking.status = BookingStatus::Refunded;
                self.booking_store
                    .insert(booking)
                    .await
                    .expect("seed refunded booking");
            }
        }

        self.bookings.get(id).await.expect("reload booking")
    }

    /// Confirm the booking's payment the way the webhook path would.
    pub async fn confirm(&self, id: wayfare_domain::BookingId) -> Booking {
        self.bookings
            .confirm_payment(id, &format!("pi_{id}"))
            .await
            .expect("confirm payment")
    }

    /// Notifications of the given event name buffered for a recipient.
    pub fn notifications_of(&self, recipient: UserId, event: &str) -> Vec<Notification> {
        self.notifications
            .poll(recipient, None)
            .into_iter()
            .filter(|n| n.payload["event"] == event)
            .collect()
    }
}

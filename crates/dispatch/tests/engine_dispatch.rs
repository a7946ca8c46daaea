//! Dispatch engine tests
//!
//! Matching, notification policy, sweeps and the acceptance window,
//! exercised against the in-memory repository and a recording notifier.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rideline_clock::FixedClock;
use rideline_core::{RideEvent, RideStatus, UserId};
use rideline_dispatch::{
    CallerRole, DispatchConfig, DispatchEngine, DispatchOutcome, DriverRegistry,
    InMemoryRideRepository, RideAction, RideRequest, RideStore,
};
use rideline_geo::FareSchedule;
use rideline_ports::{DispatchError, Notifier};
use uuid::Uuid;

/// Test notifier: records every delivery, connectivity is switchable
struct RecordingNotifier {
    connected: Mutex<bool>,
    deliveries: Mutex<Vec<(UserId, String)>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            connected: Mutex::new(true),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    fn set_connected(&self, connected: bool) {
        *self.connected.lock().unwrap() = connected;
    }

    fn deliveries(&self) -> Vec<(UserId, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, user_id: UserId, event: &RideEvent) -> bool {
        if !*self.connected.lock().unwrap() {
            return false;
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((user_id, event.name().to_string()));
        true
    }
}

struct Harness {
    engine: Arc<DispatchEngine>,
    store: Arc<RideStore>,
    registry: Arc<DriverRegistry>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<FixedClock>,
}

fn harness() -> Harness {
    let _ = env_logger::try_init();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    ));
    let repo = Arc::new(InMemoryRideRepository::new());
    let store = Arc::new(RideStore::new(repo, clock.clone()));
    let registry = Arc::new(DriverRegistry::new(clock.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Arc::new(DispatchEngine::new(
        store.clone(),
        registry.clone(),
        notifier.clone(),
        clock.clone(),
        FareSchedule::default(),
        DispatchConfig::default(),
    ));
    Harness {
        engine,
        store,
        registry,
        notifier,
        clock,
    }
}

fn online_driver(h: &Harness, lat: f64, lon: f64) -> UserId {
    let id = Uuid::new_v4();
    h.registry.register(id, true);
    h.registry.update_location(id, lat, lon).unwrap();
    h.registry.set_availability(id, true).unwrap();
    id
}

fn request(rider: UserId) -> RideRequest {
    RideRequest {
        rider_id: rider,
        pickup_latitude: 6.6885,
        pickup_longitude: -1.6244,
        dropoff_latitude: 6.7000,
        dropoff_longitude: -1.6100,
        pickup_address: "Adum".to_string(),
        dropoff_address: "KNUST".to_string(),
    }
}

#[tokio::test]
async fn request_ride_assigns_the_nearest_candidate() {
    let h = harness();
    let near = online_driver(&h, 6.6900, -1.6250); // ~0.2 km
    let _far = online_driver(&h, 6.7400, -1.6244); // ~5.7 km

    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();

    match dispatched.outcome {
        DispatchOutcome::Assigned {
            driver_id,
            distance_km,
            notified,
        } => {
            assert_eq!(driver_id, near);
            assert!(distance_km < 1.0);
            assert!(notified);
        }
        other => panic!("expected assignment, got {other:?}"),
    }
    assert_eq!(dispatched.ride.status, RideStatus::Requested);
    assert_eq!(dispatched.ride.driver_id, Some(near));

    let deliveries = h.notifier.deliveries();
    assert_eq!(deliveries, vec![(near, "new_ride_request".to_string())]);
}

#[tokio::test]
async fn request_ride_computes_distance_and_fare() {
    let h = harness();
    let rider = Uuid::new_v4();
    let dispatched = h
        .engine
        .request_ride(RideRequest {
            rider_id: rider,
            pickup_latitude: 6.6885,
            pickup_longitude: -1.6244,
            dropoff_latitude: 5.6037,
            dropoff_longitude: -0.1870,
            pickup_address: "Kumasi".to_string(),
            dropoff_address: "Accra".to_string(),
        })
        .await
        .unwrap();

    assert!((dispatched.ride.distance_km - 199.506).abs() < 0.01);
    assert_eq!(
        dispatched.ride.estimated_fare,
        rust_decimal::Decimal::new(30426, 2)
    );
}

#[tokio::test]
async fn invalid_coordinates_are_rejected_up_front() {
    let h = harness();
    let mut bad = request(Uuid::new_v4());
    bad.pickup_latitude = 95.0;
    let err = h.engine.request_ride(bad).await.unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[tokio::test]
async fn no_candidates_leaves_the_ride_requested_and_unassigned() {
    let h = harness();
    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    assert!(matches!(
        dispatched.outcome,
        DispatchOutcome::NoDriversAvailable
    ));

    let persisted = h.store.get(dispatched.ride.id).await.unwrap();
    assert_eq!(persisted.status, RideStatus::Requested);
    assert!(persisted.driver_id.is_none());
    assert!(h.notifier.deliveries().is_empty());
}

#[tokio::test]
async fn driver_coming_online_plus_sweep_picks_up_a_waiting_ride() {
    let h = harness();
    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    assert!(matches!(
        dispatched.outcome,
        DispatchOutcome::NoDriversAvailable
    ));

    let driver = online_driver(&h, 6.6900, -1.6250);

    let assigned = h.engine.dispatch_pending().await.unwrap();
    assert_eq!(assigned, 1);

    let persisted = h.store.get(dispatched.ride.id).await.unwrap();
    assert_eq!(persisted.driver_id, Some(driver));
    assert_eq!(persisted.status, RideStatus::Requested);
}

#[tokio::test]
async fn offline_driver_keeps_the_assignment() {
    let h = harness();
    let driver = online_driver(&h, 6.6900, -1.6250);
    h.notifier.set_connected(false);

    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    match dispatched.outcome {
        DispatchOutcome::Assigned { notified, .. } => assert!(!notified),
        other => panic!("expected assignment, got {other:?}"),
    }
    // at-least-once policy: assignment survives the missed push
    assert_eq!(dispatched.ride.driver_id, Some(driver));
}

#[tokio::test]
async fn reject_then_redispatch_moves_to_the_next_candidate() {
    let h = harness();
    let first = online_driver(&h, 6.6900, -1.6250);
    let second = online_driver(&h, 6.7400, -1.6244);

    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    assert_eq!(dispatched.ride.driver_id, Some(first));

    h.engine.reject_ride(dispatched.ride.id, first).await.unwrap();
    // the driver's client goes off duty after declining
    h.registry.set_availability(first, false).unwrap();

    let redispatched = h.engine.redispatch(dispatched.ride.id).await.unwrap();
    match redispatched.outcome {
        DispatchOutcome::Assigned { driver_id, .. } => assert_eq!(driver_id, second),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[tokio::test]
async fn redispatch_of_a_handled_ride_is_a_no_op() {
    let h = harness();
    let driver = online_driver(&h, 6.6900, -1.6250);
    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    h.engine.accept_ride(dispatched.ride.id, driver).await.unwrap();

    let again = h.engine.redispatch(dispatched.ride.id).await.unwrap();
    assert!(matches!(again.outcome, DispatchOutcome::AlreadyDispatched));
    assert_eq!(again.ride.status, RideStatus::Accepted);
}

#[tokio::test]
async fn acceptance_window_expires_and_the_sweep_retries() {
    let h = harness();
    let slow = online_driver(&h, 6.6900, -1.6250);

    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    assert_eq!(dispatched.ride.driver_id, Some(slow));

    // within the window nothing expires
    h.clock.advance(Duration::seconds(60));
    assert_eq!(h.engine.expire_stale_assignments().await.unwrap(), 0);

    // past the 120s default the assignment is released
    h.clock.advance(Duration::seconds(90));
    assert_eq!(h.engine.expire_stale_assignments().await.unwrap(), 1);

    let released = h.store.get(dispatched.ride.id).await.unwrap();
    assert_eq!(released.status, RideStatus::Requested);
    assert!(released.driver_id.is_none());

    // the sweep immediately re-offers (the slow driver is still the only
    // candidate, and a fresh assignment restarts the window)
    assert_eq!(h.engine.dispatch_pending().await.unwrap(), 1);
    let reassigned = h.store.get(dispatched.ride.id).await.unwrap();
    assert_eq!(reassigned.driver_id, Some(slow));
}

#[tokio::test]
async fn accepting_marks_the_driver_busy_and_tells_the_rider() {
    let h = harness();
    let rider = Uuid::new_v4();
    let driver = online_driver(&h, 6.6900, -1.6250);

    let dispatched = h.engine.request_ride(request(rider)).await.unwrap();
    let accepted = h.engine.accept_ride(dispatched.ride.id, driver).await.unwrap();
    assert_eq!(accepted.status, RideStatus::Accepted);

    assert!(!h.registry.get(driver).unwrap().is_available);
    assert!(h
        .notifier
        .deliveries()
        .contains(&(rider, "ride_accepted".to_string())));
}

#[tokio::test]
async fn completing_returns_the_driver_to_the_pool() {
    let h = harness();
    let rider = Uuid::new_v4();
    let driver = online_driver(&h, 6.6900, -1.6250);

    let dispatched = h.engine.request_ride(request(rider)).await.unwrap();
    let id = dispatched.ride.id;
    h.engine.accept_ride(id, driver).await.unwrap();
    h.engine
        .advance_ride_status(id, driver, RideAction::DriverArrived)
        .await
        .unwrap();
    h.engine
        .advance_ride_status(id, driver, RideAction::StartTrip)
        .await
        .unwrap();
    let done = h
        .engine
        .advance_ride_status(id, driver, RideAction::CompleteTrip)
        .await
        .unwrap();

    assert_eq!(done.status, RideStatus::Completed);
    assert!(h.registry.get(driver).unwrap().is_available);

    let status_updates = h
        .notifier
        .deliveries()
        .iter()
        .filter(|(user, name)| *user == rider && name == "ride_status_updated")
        .count();
    assert_eq!(status_updates, 3);
}

#[tokio::test]
async fn driver_cancel_notifies_the_rider_and_frees_the_driver() {
    let h = harness();
    let rider = Uuid::new_v4();
    let driver = online_driver(&h, 6.6900, -1.6250);

    let dispatched = h.engine.request_ride(request(rider)).await.unwrap();
    h.engine.accept_ride(dispatched.ride.id, driver).await.unwrap();

    let cancelled = h
        .engine
        .cancel_ride(dispatched.ride.id, driver, CallerRole::Driver)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RideStatus::CancelledByDriver);
    assert!(h.registry.get(driver).unwrap().is_available);
    assert!(h
        .notifier
        .deliveries()
        .contains(&(rider, "ride_cancelled_by_driver".to_string())));
}

#[tokio::test]
async fn rider_cancel_reaches_the_assigned_driver() {
    let h = harness();
    let rider = Uuid::new_v4();
    let driver = online_driver(&h, 6.6900, -1.6250);

    let dispatched = h.engine.request_ride(request(rider)).await.unwrap();
    h.engine.accept_ride(dispatched.ride.id, driver).await.unwrap();

    let cancelled = h
        .engine
        .cancel_ride(dispatched.ride.id, rider, CallerRole::Rider)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RideStatus::CancelledByRider);
    assert!(h
        .notifier
        .deliveries()
        .contains(&(driver, "ride_status_updated".to_string())));
}

#[tokio::test]
async fn concurrent_engine_accepts_keep_one_driver_per_ride() {
    let h = harness();
    let driver = online_driver(&h, 6.6900, -1.6250);
    let rival = online_driver(&h, 6.7400, -1.6244);

    let dispatched = h.engine.request_ride(request(Uuid::new_v4())).await.unwrap();
    let id = dispatched.ride.id;

    let (a, b) = tokio::join!(
        h.engine.accept_ride(id, driver),
        h.engine.accept_ride(id, rival),
    );
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);

    let current = h.store.get(id).await.unwrap();
    assert_eq!(current.status, RideStatus::Accepted);
    assert_eq!(current.driver_id, Some(driver));
}

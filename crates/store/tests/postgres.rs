//! PostgreSQL store tests.
//!
//! These need a disposable database:
//! `DATABASE_URL=postgres://... cargo test -p store -- --ignored`

use std::sync::Arc;

use entities::{
    Driver, DriverProfile, FareQuote, Message, Place, Rating, Ride, RideStatus, User, Workspace,
};
use pagination::{Cursor, PageRequest};
use rust_decimal::Decimal;
use store::{PgStore, ReviewSubmission, Store, StoreError};
use uuid::Uuid;

async fn connect() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgStore::connect(&url, 10).await.unwrap()
}

/// Creates a user whose identity cannot collide with earlier runs.
async fn user(store: &PgStore, name: &str) -> User {
    let external_id = format!("{name}-{}", Uuid::new_v4());
    store
        .ensure_user(User::new(&external_id, format!("{external_id}@example.com")).with_name(name))
        .await
        .unwrap()
}

async fn driver(store: &PgStore, name: &str) -> Driver {
    let user = user(store, name).await;
    let profile = DriverProfile {
        license_number: "D1234567".to_string(),
        vehicle_model: "Toyota Prius".to_string(),
        vehicle_color: "Silver".to_string(),
        vehicle_plate: format!("{name}-1"),
    };
    store.register_driver(user.id, profile).await.unwrap()
}

async fn pending_ride(store: &PgStore, rider_id: Uuid) -> Ride {
    let ride = Ride::new(
        rider_id,
        Place::new(37.7749, -122.4194, "Market St"),
        Place::new(37.7849, -122.4094, "Polk St"),
        FareQuote::new(Decimal::new(10, 0), 20),
    );
    store.create_ride(ride).await.unwrap()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_concurrent_accepts_have_one_winner() {
    let store = Arc::new(connect().await);
    let rider = user(&store, "rider").await;
    let ride = pending_ride(&store, rider.id).await;
    let mut drivers = Vec::new();
    for name in ["d1", "d2", "d3", "d4", "d5"] {
        drivers.push(driver(&store, name).await);
    }

    let handles: Vec<_> = drivers
        .iter()
        .map(|d| {
            let store = Arc::clone(&store);
            let (ride_id, driver_id) = (ride.id, d.id);
            tokio::spawn(async move { store.accept_ride(ride_id, driver_id).await })
        })
        .collect();

    let mut winners = Vec::new();
    for (handle, d) in handles.into_iter().zip(&drivers) {
        match handle.await.unwrap() {
            Ok(_) => winners.push(d.id),
            Err(err) => assert!(matches!(err, StoreError::InvalidStateTransition { .. })),
        }
    }
    assert_eq!(winners.len(), 1);

    let stored = store.get_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RideStatus::Accepted);
    assert_eq!(stored.driver_id, Some(winners[0]));

    for d in &drivers {
        let d = store.get_driver(d.id).await.unwrap().unwrap();
        assert_eq!(d.is_available, d.id != winners[0]);
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_cancel_accepted_releases_driver() {
    let store = connect().await;
    let rider = user(&store, "rider").await;
    let dana = driver(&store, "dana").await;
    let ride = pending_ride(&store, rider.id).await;

    store.accept_ride(ride.id, dana.id).await.unwrap();
    let cancelled = store.cancel_ride(ride.id, rider.id).await.unwrap();

    assert_eq!(cancelled.status, RideStatus::Cancelled);
    assert!(cancelled.driver_id.is_none());
    assert!(store.get_driver(dana.id).await.unwrap().unwrap().is_available);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_review_updates_aggregate_once() {
    let store = connect().await;
    let rider = user(&store, "rider").await;
    let dana = driver(&store, "dana").await;
    let ride = pending_ride(&store, rider.id).await;
    store.accept_ride(ride.id, dana.id).await.unwrap();
    store.start_ride(ride.id, dana.id).await.unwrap();
    store.complete_ride(ride.id, dana.id).await.unwrap();

    let submission = ReviewSubmission {
        ride_id: ride.id,
        rider_id: rider.id,
        rating: Rating::new(4).unwrap(),
        comment: None,
    };
    store.create_review(submission.clone()).await.unwrap();
    let again = store.create_review(submission).await;
    assert!(matches!(again, Err(StoreError::AlreadyExists { .. })));

    let dana = store.get_driver(dana.id).await.unwrap().unwrap();
    assert_eq!(dana.rating, Decimal::new(400, 2));
    assert_eq!(dana.total_rides, 1);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_concurrent_messages_are_seen_by_pollers() {
    let store = Arc::new(connect().await);
    let alice = user(&store, "alice").await;
    let workspace = store
        .create_workspace(Workspace::new("Platform", alice.id))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = Arc::clone(&store);
            let message = Message::new(workspace.id, alice.id, format!("message {i}"));
            tokio::spawn(async move { store.create_message(message).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut seen = 0;
    let mut cursor: Option<Cursor> = None;
    loop {
        let mut page = PageRequest::bounded(Some(3), 100);
        if let Some(cursor) = cursor {
            page = page.after(cursor);
        }
        let page = store.list_messages(workspace.id, page).await.unwrap();
        let Some(last) = page.items.last() else { break };
        cursor = Some(Cursor::new(last.message.created_at, last.message.id));
        seen += page.items.len();
    }
    assert_eq!(seen, 20);
}

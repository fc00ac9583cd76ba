// src/storage/memory.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{BookingRepository, DriverRepository, RideRequestRepository};
use crate::errors::{DispatchError, DispatchResult};
use crate::models::booking::Booking;
use crate::models::driver::Driver;
use crate::models::ride_request::{RideRequest, RideRequestStatus};

/// In-memory driver store. Keeps registration order alongside the map so
/// listings (and therefore matching tie-breaks) are stable.
pub struct InMemoryDriverRepository {
    inner: RwLock<DriverStore>,
}

#[derive(Default)]
struct DriverStore {
    by_id: HashMap<String, Driver>,
    order: Vec<String>,
}

impl InMemoryDriverRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DriverStore::default()),
        }
    }
}

impl Default for InMemoryDriverRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverRepository for InMemoryDriverRepository {
    async fn upsert(&self, driver: Driver) -> DispatchResult<()> {
        let mut store = self.inner.write().await;
        if !store.by_id.contains_key(&driver.id) {
            store.order.push(driver.id.clone());
        }
        store.by_id.insert(driver.id.clone(), driver);
        Ok(())
    }

    async fn get(&self, driver_id: &str) -> DispatchResult<Option<Driver>> {
        let store = self.inner.read().await;
        Ok(store.by_id.get(driver_id).cloned())
    }

    async fn update(&self, driver: Driver) -> DispatchResult<()> {
        let mut store = self.inner.write().await;
        if !store.by_id.contains_key(&driver.id) {
            return Err(DispatchError::driver_not_found(&driver.id));
        }
        store.by_id.insert(driver.id.clone(), driver);
        Ok(())
    }

    async fn list(&self) -> DispatchResult<Vec<Driver>> {
        let store = self.inner.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.by_id.get(id).cloned())
            .collect())
    }
}

pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<String, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, booking: Booking) -> DispatchResult<()> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    async fn get(&self, booking_id: &str) -> DispatchResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(booking_id).cloned())
    }

    async fn list(&self) -> DispatchResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().cloned().collect())
    }
}

pub struct InMemoryRideRequestRepository {
    requests: RwLock<HashMap<String, RideRequest>>,
}

impl InMemoryRideRequestRepository {
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRideRequestRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideRequestRepository for InMemoryRideRequestRepository {
    async fn save(&self, request: RideRequest) -> DispatchResult<()> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.clone(), request);
        Ok(())
    }

    async fn get(&self, request_id: &str) -> DispatchResult<Option<RideRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(request_id).cloned())
    }

    async fn try_accept(
        &self,
        request_id: &str,
        driver_id: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<RideRequest> {
        // Single write lock makes the status check and flip one atomic step
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| DispatchError::request_not_found(request_id))?;

        if request.status == RideRequestStatus::Accepted {
            return Err(DispatchError::RequestAlreadyAccepted(request_id.to_string()));
        }
        if now > request.expires_at {
            return Err(DispatchError::RequestExpired(request_id.to_string()));
        }

        request.status = RideRequestStatus::Accepted;
        request.accepted_by = Some(driver_id.to_string());
        Ok(request.clone())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> DispatchResult<usize> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|_, r| !r.is_expired(now));
        Ok(before - requests.len())
    }
}

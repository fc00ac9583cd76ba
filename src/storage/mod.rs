// src/storage/mod.rs
//
// Repository traits the services are wired against. Production deployments
// plug a durable backend in here; the in-memory implementations below are
// the default for development and testing.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DispatchResult;
use crate::models::booking::Booking;
use crate::models::driver::Driver;
use crate::models::ride_request::RideRequest;

#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Insert or replace by id. Re-registration is not an error.
    async fn upsert(&self, driver: Driver) -> DispatchResult<()>;
    async fn get(&self, driver_id: &str) -> DispatchResult<Option<Driver>>;
    /// Replace an existing record; `DriverNotFound` if the id is unknown.
    async fn update(&self, driver: Driver) -> DispatchResult<()>;
    /// All drivers, in stable registration order.
    async fn list(&self) -> DispatchResult<Vec<Driver>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn save(&self, booking: Booking) -> DispatchResult<()>;
    async fn get(&self, booking_id: &str) -> DispatchResult<Option<Booking>>;
    async fn list(&self) -> DispatchResult<Vec<Booking>>;
}

#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    async fn save(&self, request: RideRequest) -> DispatchResult<()>;
    async fn get(&self, request_id: &str) -> DispatchResult<Option<RideRequest>>;
    /// Atomic compare-and-swap of status pending -> accepted. The first
    /// caller wins; later calls fail with `RequestAlreadyAccepted`. An
    /// expired pending request fails with `RequestExpired`.
    async fn try_accept(
        &self,
        request_id: &str,
        driver_id: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<RideRequest>;
    /// Drop pending requests past their TTL; returns how many were removed.
    async fn prune_expired(&self, now: DateTime<Utc>) -> DispatchResult<usize>;
}

// src/models/ride_request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::Location;
use super::driver::VehicleClass;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RideRequestStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RideRequest {
    pub id: String,
    pub customer_id: String,
    pub pickup: Location,
    pub dropoff: Location,
    pub vehicle_class: VehicleClass,
    pub status: RideRequestStatus,
    /// Set exactly once, by the first driver whose acceptance wins.
    pub accepted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == RideRequestStatus::Pending && now > self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RideRequestDraft {
    pub customer_id: String,
    pub pickup: Location,
    pub dropoff: Location,
    pub vehicle_class: VehicleClass,
}

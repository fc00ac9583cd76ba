// src/models/driver.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Sedan,
    Suv,
    Van,
    Luxury,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleClass::Sedan => "sedan",
            VehicleClass::Suv => "suv",
            VehicleClass::Van => "van",
            VehicleClass::Luxury => "luxury",
        };
        write!(f, "{}", s)
    }
}

/// Administrative approval state. A single tagged value so that
/// "approved with a rejection reason" is not representable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected(String),
}

impl ApprovalStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

/// Filter for administrative driver listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalFilter {
    Pending,
    Approved,
    Rejected,
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Vehicle {
    pub license_plate: String,
    pub class: VehicleClass,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub color: String,
}

/// Last reported driver position, refreshed by the driver's own heartbeat.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriverLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,   // Direction in degrees (0-360)
    pub speed_kmh: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Driver {
    pub id: String,
    pub display_name: String,
    pub phone_number: String,
    pub vehicle: Vehicle,
    pub approval: ApprovalStatus,
    pub available: bool,
    pub location: Option<DriverLocation>,
    pub rating: f32,            // Average rating (0-5)
    pub total_rides: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Matching eligibility: approved, available, and driving the requested class.
    pub fn is_eligible_for(&self, class: VehicleClass) -> bool {
        self.approval.is_approved() && self.available && self.vehicle.class == class
    }

    pub fn snapshot(&self) -> DriverSnapshot {
        DriverSnapshot {
            driver_id: self.id.clone(),
            display_name: self.display_name.clone(),
            vehicle_model: format!("{} {}", self.vehicle.make, self.vehicle.model),
            rating: self.rating,
            total_rides: self.total_rides,
        }
    }
}

/// Point-in-time view of a driver embedded in offers shown to the customer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriverSnapshot {
    pub driver_id: String,
    pub display_name: String,
    pub vehicle_model: String,
    pub rating: f32,
    pub total_rides: u32,
}

// Request models
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriverRegistration {
    /// Re-registration with an existing id replaces the record (idempotent upsert).
    pub driver_id: Option<String>,
    pub display_name: String,
    pub phone_number: String,
    pub license_plate: String,
    pub vehicle_class: VehicleClass,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: u16,
    pub vehicle_color: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverLocationUpdate {
    pub driver_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>,
    pub speed_kmh: Option<f64>,
}

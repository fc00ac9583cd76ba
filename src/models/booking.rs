// src/models/booking.rs
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::driver::VehicleClass;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,       // Created by the customer, no driver yet
    Accepted,      // A driver committed to the ride
    DriverEnRoute, // Driver is on the way to pickup
    DriverArrived, // Driver is waiting at the pickup point
    InProgress,    // Passenger on board
    Completed,     // Ride finished
    Cancelled,     // Terminated before completion
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Legality check against the directed lifecycle graph. Cancellation is
    /// reachable from every non-terminal state; everything else moves one
    /// step forward.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if next == BookingStatus::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Accepted, BookingStatus::DriverEnRoute)
                | (BookingStatus::DriverEnRoute, BookingStatus::DriverArrived)
                | (BookingStatus::DriverArrived, BookingStatus::InProgress)
                | (BookingStatus::InProgress, BookingStatus::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::DriverEnRoute => "driver_en_route",
            BookingStatus::DriverArrived => "driver_arrived",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

/// Pickup/dropoff endpoint as entered by the customer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Recorded paths attached post-acceptance for tracking playback.
/// Owned exclusively by the booking.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteTrace {
    pub driver_path: Vec<RoutePoint>,
    pub customer_path: Vec<RoutePoint>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    pub id: String,
    pub reference_code: String, // Customer-facing code for support lookups
    pub customer_id: String,
    pub driver_id: Option<String>,

    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub pickup_time: Option<DateTime<Utc>>,
    pub passenger_count: u8,
    pub vehicle_class: VehicleClass,

    pub base_price: f64,
    pub final_price: Option<f64>,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,

    pub status: BookingStatus,
    pub route: Option<RouteTrace>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

const REFERENCE_ALPHABET: [char; 32] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

impl Booking {
    /// Short customer-facing code, unambiguous alphabet (no 0/O/1/I).
    pub fn generate_reference_code() -> String {
        format!("KD-{}", nanoid!(8, &REFERENCE_ALPHABET))
    }
}

/// Customer submission. Required fields are validated by the booking service,
/// not by the type, so a partial draft is representable and rejected with a
/// field-level error.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BookingDraft {
    pub customer_id: String,
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
    pub passenger_count: Option<u8>,
    pub vehicle_class: Option<VehicleClass>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub base_price: Option<f64>,
    pub driver_id: Option<String>,
}

// src/models/events.rs
use serde::Serialize;

use super::booking::Location;
use super::driver::VehicleClass;

/// Logical events the core emits towards the external transport layer
/// (push channel, websocket hub, ...). Delivery is best-effort,
/// at-least-once; the core never depends on it for state changes.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    RideRequested {
        request_id: String,
        customer_id: String,
        vehicle_class: VehicleClass,
        pickup: Location,
        dropoff: Location,
    },
    RideAccepted {
        booking_id: String,
        request_id: String,
        customer_id: String,
        driver_id: String,
        final_price: f64,
    },
    RideCancelled {
        booking_id: String,
        customer_id: String,
        driver_id: Option<String>,
    },
}

impl DispatchEvent {
    /// Channel name understood by the transport layer.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchEvent::RideRequested { .. } => "ride:request",
            DispatchEvent::RideAccepted { .. } => "ride:accepted",
            DispatchEvent::RideCancelled { .. } => "ride:cancelled",
        }
    }
}

// src/state.rs
use std::sync::Arc;

use crate::pricing::PricingConfig;
use crate::services::booking::BookingService;
use crate::services::events::{EventSink, NoopEventSink, WebhookConfig, WebhookEventSink};
use crate::services::matcher::RideMatcher;
use crate::services::negotiation::{MinimumFarePolicy, NegotiationController};
use crate::services::registry::DriverRegistry;
use crate::storage::memory::{
    InMemoryBookingRepository, InMemoryDriverRepository, InMemoryRideRequestRepository,
};

/// Engine-wide tunables. Defaults are the production values; tests override
/// individual fields.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Candidate shortlist size per ride request.
    pub max_candidates: usize,
    /// Negotiation session length.
    pub session_ttl_secs: i64,
    /// How long a pending ride request stays acceptable.
    pub request_ttl_secs: i64,
    /// Counter-offer floor as a fraction of the quoted price.
    pub min_fare_ratio: f64,
    pub pricing: PricingConfig,
    /// Endpoint the realtime gateway listens on; absent in development.
    pub event_webhook_url: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            session_ttl_secs: 30,
            request_ttl_secs: 120,
            min_fare_ratio: 0.8,
            pricing: PricingConfig::default(),
            event_webhook_url: None,
        }
    }
}

/// Shared application state: one instance of every service, wired against
/// the in-memory repositories and cloned into each handler task.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DriverRegistry>,
    pub matcher: Arc<RideMatcher>,
    pub negotiation: Arc<NegotiationController>,
    pub bookings: Arc<BookingService>,
    pub events: Arc<dyn EventSink>,
    pub config: DispatchConfig,
}

impl AppState {
    pub fn new(config: DispatchConfig) -> Self {
        let events: Arc<dyn EventSink> = match &config.event_webhook_url {
            Some(url) => Arc::new(WebhookEventSink::new(WebhookConfig { url: url.clone() })),
            None => {
                tracing::warn!("No event webhook configured, events will not leave the process");
                Arc::new(NoopEventSink)
            }
        };

        let drivers = Arc::new(InMemoryDriverRepository::new());
        let requests = Arc::new(InMemoryRideRequestRepository::new());
        let booking_repo = Arc::new(InMemoryBookingRepository::new());

        let registry = Arc::new(DriverRegistry::new(drivers.clone()));
        let matcher = Arc::new(RideMatcher::new(
            drivers,
            requests.clone(),
            events.clone(),
            config.max_candidates,
            config.request_ttl_secs,
        ));
        let bookings = Arc::new(BookingService::new(booking_repo, events.clone()));
        let negotiation = Arc::new(NegotiationController::new(
            requests,
            bookings.clone(),
            Arc::new(MinimumFarePolicy {
                min_fare_ratio: config.min_fare_ratio,
            }),
            config.session_ttl_secs,
        ));

        Self {
            registry,
            matcher,
            negotiation,
            bookings,
            events,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::Location;
    use crate::models::driver::{ApprovalStatus, DriverLocationUpdate, DriverRegistration, VehicleClass};
    use crate::models::ride_request::RideRequestDraft;
    use crate::services::matcher::MatcherOperations;
    use crate::services::registry::RegistryOperations;

    #[tokio::test]
    async fn test_end_to_end_dispatch_flow() {
        let state = AppState::new(DispatchConfig::default());

        let driver = state
            .registry
            .register(DriverRegistration {
                driver_id: None,
                display_name: "Ama".to_string(),
                phone_number: "+233201234567".to_string(),
                license_plate: "GR-1234-25".to_string(),
                vehicle_class: VehicleClass::Sedan,
                vehicle_make: "Toyota".to_string(),
                vehicle_model: "Corolla".to_string(),
                vehicle_year: 2021,
                vehicle_color: "silver".to_string(),
            })
            .await
            .unwrap();
        state
            .registry
            .set_approval(&driver.id, ApprovalStatus::Approved)
            .await
            .unwrap();
        state
            .registry
            .set_availability(&driver.id, true)
            .await
            .unwrap();
        state
            .registry
            .update_location(DriverLocationUpdate {
                driver_id: driver.id.clone(),
                latitude: 5.6040,
                longitude: -0.1870,
                heading: None,
                speed_kmh: None,
            })
            .await
            .unwrap();

        let request = state
            .matcher
            .submit_request(RideRequestDraft {
                customer_id: "cus-250830-aaaaaa".to_string(),
                pickup: Location {
                    latitude: 5.6037,
                    longitude: -0.1870,
                    address: "Independence Ave".to_string(),
                },
                dropoff: Location {
                    latitude: 5.6500,
                    longitude: -0.2000,
                    address: "Airport Rd".to_string(),
                },
                vehicle_class: VehicleClass::Sedan,
            })
            .await
            .unwrap();

        let candidates = state.matcher.match_request(&request).await.unwrap();
        assert_eq!(candidates.len(), 1);

        let session = state
            .negotiation
            .open_session(&request, candidates)
            .await
            .unwrap();
        let booking = state
            .negotiation
            .accept(&session.id, &driver.id)
            .await
            .unwrap();

        assert_eq!(booking.driver_id.as_deref(), Some(driver.id.as_str()));
        assert_eq!(booking.customer_id, "cus-250830-aaaaaa");
    }
}

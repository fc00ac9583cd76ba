// src/services/matcher.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::errors::{DispatchError as AppError, DispatchResult};
use crate::models::driver::Driver;
use crate::models::events::DispatchEvent;
use crate::models::offer::Candidate;
use crate::models::ride_request::{RideRequest, RideRequestDraft, RideRequestStatus};
use crate::pricing::estimate_fare;
use crate::services::events::EventSink;
use crate::storage::{DriverRepository, RideRequestRepository};
use crate::utils::geo::{estimate_duration_min, haversine_km, planar_delta};
use crate::utils::id_generator::{IdGenerator, IdType};

#[async_trait]
pub trait MatcherOperations {
    /// Store a new ride request and announce it. The request stays
    /// acceptable until its TTL runs out.
    async fn submit_request(&self, draft: RideRequestDraft) -> DispatchResult<RideRequest>;
    async fn get_request(&self, request_id: &str) -> DispatchResult<RideRequest>;
    /// Ranked candidate shortlist for a request: eligible drivers with a
    /// known position, nearest first, capped at the configured size.
    async fn match_request(&self, request: &RideRequest) -> DispatchResult<Vec<Candidate>>;
    /// Drop pending requests past their TTL.
    async fn prune_expired(&self) -> DispatchResult<usize>;
}

pub struct RideMatcher {
    drivers: Arc<dyn DriverRepository>,
    requests: Arc<dyn RideRequestRepository>,
    sink: Arc<dyn EventSink>,
    max_candidates: usize,
    request_ttl_secs: i64,
}

impl RideMatcher {
    pub fn new(
        drivers: Arc<dyn DriverRepository>,
        requests: Arc<dyn RideRequestRepository>,
        sink: Arc<dyn EventSink>,
        max_candidates: usize,
        request_ttl_secs: i64,
    ) -> Self {
        Self {
            drivers,
            requests,
            sink,
            max_candidates,
            request_ttl_secs,
        }
    }

    fn candidate_for(&self, driver: &Driver, request: &RideRequest) -> Option<Candidate> {
        let location = driver.location.as_ref()?;

        let distance_km = haversine_km(
            location.latitude,
            location.longitude,
            request.pickup.latitude,
            request.pickup.longitude,
        );
        let eta_min = estimate_duration_min(distance_km);

        // The quote covers the trip itself, not the approach
        let trip_km = haversine_km(
            request.pickup.latitude,
            request.pickup.longitude,
            request.dropoff.latitude,
            request.dropoff.longitude,
        );
        let trip_min = estimate_duration_min(trip_km) as f64;
        let quoted_price = estimate_fare(trip_km, trip_min, request.vehicle_class);

        Some(Candidate {
            driver: driver.snapshot(),
            distance_km,
            eta_min,
            quoted_price,
        })
    }
}

#[async_trait]
impl MatcherOperations for RideMatcher {
    async fn submit_request(&self, draft: RideRequestDraft) -> DispatchResult<RideRequest> {
        let now = Utc::now();
        let request = RideRequest {
            id: IdGenerator::generate(IdType::RideRequest),
            customer_id: draft.customer_id,
            pickup: draft.pickup,
            dropoff: draft.dropoff,
            vehicle_class: draft.vehicle_class,
            status: RideRequestStatus::Pending,
            accepted_by: None,
            created_at: now,
            expires_at: now + Duration::seconds(self.request_ttl_secs),
        };

        self.requests.save(request.clone()).await?;
        tracing::info!(
            "Ride request {} submitted by {} ({})",
            request.id,
            request.customer_id,
            request.vehicle_class
        );

        let event = DispatchEvent::RideRequested {
            request_id: request.id.clone(),
            customer_id: request.customer_id.clone(),
            vehicle_class: request.vehicle_class,
            pickup: request.pickup.clone(),
            dropoff: request.dropoff.clone(),
        };
        if let Err(e) = self.sink.deliver(&event).await {
            tracing::warn!("Failed to announce ride request {}: {}", request.id, e);
        }

        Ok(request)
    }

    async fn get_request(&self, request_id: &str) -> DispatchResult<RideRequest> {
        self.requests
            .get(request_id)
            .await?
            .ok_or_else(|| AppError::request_not_found(request_id))
    }

    async fn match_request(&self, request: &RideRequest) -> DispatchResult<Vec<Candidate>> {
        let drivers = self.drivers.list().await?;

        let mut ranked: Vec<(f64, Candidate)> = drivers
            .iter()
            .filter(|d| d.is_eligible_for(request.vehicle_class))
            .filter_map(|d| {
                let location = d.location.as_ref()?;
                let key = planar_delta(
                    location.latitude,
                    location.longitude,
                    request.pickup.latitude,
                    request.pickup.longitude,
                );
                Some((key, self.candidate_for(d, request)?))
            })
            .collect();

        // Stable sort keeps registration order between equally-distant drivers
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.max_candidates);

        let candidates: Vec<Candidate> = ranked.into_iter().map(|(_, c)| c).collect();
        tracing::debug!(
            "Matched {} candidates for request {}",
            candidates.len(),
            request.id
        );
        Ok(candidates)
    }

    async fn prune_expired(&self) -> DispatchResult<usize> {
        let removed = self.requests.prune_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!("Pruned {} expired ride requests", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::Location;
    use crate::models::driver::{ApprovalStatus, DriverLocation, Vehicle, VehicleClass};
    use crate::services::events::NoopEventSink;
    use crate::storage::memory::{InMemoryDriverRepository, InMemoryRideRequestRepository};

    fn driver(id: &str, class: VehicleClass, lat: f64, lng: f64) -> Driver {
        let now = Utc::now();
        Driver {
            id: id.to_string(),
            display_name: format!("Driver {}", id),
            phone_number: "+233201234567".to_string(),
            vehicle: Vehicle {
                license_plate: "GR-1234-25".to_string(),
                class,
                make: "Toyota".to_string(),
                model: "Corolla".to_string(),
                year: 2021,
                color: "silver".to_string(),
            },
            approval: ApprovalStatus::Approved,
            available: true,
            location: Some(DriverLocation {
                latitude: lat,
                longitude: lng,
                heading: None,
                speed_kmh: None,
                recorded_at: now,
            }),
            rating: 4.5,
            total_rides: 120,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(class: VehicleClass) -> RideRequest {
        let now = Utc::now();
        RideRequest {
            id: "req-250830-aaaaaa".to_string(),
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
            vehicle_class: class,
            status: RideRequestStatus::Pending,
            accepted_by: None,
            created_at: now,
            expires_at: now + Duration::seconds(120),
        }
    }

    async fn matcher_with(drivers: Vec<Driver>) -> RideMatcher {
        let driver_repo = Arc::new(InMemoryDriverRepository::new());
        for d in drivers {
            driver_repo.upsert(d).await.unwrap();
        }
        RideMatcher::new(
            driver_repo,
            Arc::new(InMemoryRideRequestRepository::new()),
            Arc::new(NoopEventSink),
            10,
            120,
        )
    }

    #[tokio::test]
    async fn test_match_filters_ineligible_drivers() {
        let mut offline = driver("drv-250830-000001", VehicleClass::Sedan, 5.60, -0.18);
        offline.available = false;
        let mut unapproved = driver("drv-250830-000002", VehicleClass::Sedan, 5.60, -0.18);
        unapproved.approval = ApprovalStatus::Pending;
        let wrong_class = driver("drv-250830-000003", VehicleClass::Van, 5.60, -0.18);
        let mut no_location = driver("drv-250830-000004", VehicleClass::Sedan, 0.0, 0.0);
        no_location.location = None;
        let eligible = driver("drv-250830-000005", VehicleClass::Sedan, 5.61, -0.18);

        let matcher =
            matcher_with(vec![offline, unapproved, wrong_class, no_location, eligible]).await;
        let candidates = matcher
            .match_request(&request(VehicleClass::Sedan))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].driver.driver_id, "drv-250830-000005");
    }

    #[tokio::test]
    async fn test_match_ranks_by_proximity_and_caps() {
        // Fifteen drivers spaced progressively further from the pickup,
        // registered furthest-first
        let mut drivers = Vec::new();
        for i in (0..15).rev() {
            drivers.push(driver(
                &format!("drv-250830-0000{:02}", i),
                VehicleClass::Sedan,
                5.6037 + 0.01 * i as f64,
                -0.1870,
            ));
        }
        let matcher = matcher_with(drivers).await;

        let candidates = matcher
            .match_request(&request(VehicleClass::Sedan))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 10);
        assert_eq!(candidates[0].driver.driver_id, "drv-250830-000000");
        for pair in candidates.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[tokio::test]
    async fn test_match_empty_registry_yields_no_candidates() {
        let matcher = matcher_with(vec![]).await;
        let candidates = matcher
            .match_request(&request(VehicleClass::Sedan))
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_quote_uses_trip_distance_not_approach() {
        let near = driver("drv-250830-000001", VehicleClass::Sedan, 5.6040, -0.1870);
        let far = driver("drv-250830-000002", VehicleClass::Sedan, 5.6500, -0.1870);
        let matcher = matcher_with(vec![near, far]).await;

        let candidates = matcher
            .match_request(&request(VehicleClass::Sedan))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        // Same trip means the same quote regardless of driver position
        assert_eq!(candidates[0].quoted_price, candidates[1].quoted_price);
        assert!(candidates[0].distance_km < candidates[1].distance_km);
        assert!(candidates[0].quoted_price >= crate::pricing::MINIMUM_FARE);
    }

    #[tokio::test]
    async fn test_submit_request_sets_ttl() {
        let matcher = matcher_with(vec![]).await;
        let draft = RideRequestDraft {
            customer_id: "cus-250830-aaaaaa".to_string(),
            pickup: request(VehicleClass::Sedan).pickup,
            dropoff: request(VehicleClass::Sedan).dropoff,
            vehicle_class: VehicleClass::Sedan,
        };

        let stored = matcher.submit_request(draft).await.unwrap();
        assert!(stored.id.starts_with("req-"));
        assert_eq!(stored.status, RideRequestStatus::Pending);
        let ttl = (stored.expires_at - stored.created_at).num_seconds();
        assert_eq!(ttl, 120);

        let fetched = matcher.get_request(&stored.id).await.unwrap();
        assert_eq!(fetched.customer_id, "cus-250830-aaaaaa");
    }

    #[tokio::test]
    async fn test_submit_request_announces_event() {
        let sink = Arc::new(crate::services::events::test_support::RecordingEventSink::default());
        let matcher = RideMatcher::new(
            Arc::new(InMemoryDriverRepository::new()),
            Arc::new(InMemoryRideRequestRepository::new()),
            sink.clone(),
            10,
            120,
        );

        let stored = matcher
            .submit_request(RideRequestDraft {
                customer_id: "cus-250830-aaaaaa".to_string(),
                pickup: request(VehicleClass::Sedan).pickup,
                dropoff: request(VehicleClass::Sedan).dropoff,
                vehicle_class: VehicleClass::Sedan,
            })
            .await
            .unwrap();

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].kind(), "ride:request");
        match &delivered[0] {
            DispatchEvent::RideRequested { request_id, .. } => assert_eq!(*request_id, stored.id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prune_expired_requests() {
        let matcher = RideMatcher::new(
            Arc::new(InMemoryDriverRepository::new()),
            Arc::new(InMemoryRideRequestRepository::new()),
            Arc::new(NoopEventSink),
            10,
            -1,
        );

        matcher
            .submit_request(RideRequestDraft {
                customer_id: "cus-250830-aaaaaa".to_string(),
                pickup: request(VehicleClass::Sedan).pickup,
                dropoff: request(VehicleClass::Sedan).dropoff,
                vehicle_class: VehicleClass::Sedan,
            })
            .await
            .unwrap();

        assert_eq!(matcher.prune_expired().await.unwrap(), 1);
        assert_eq!(matcher.prune_expired().await.unwrap(), 0);
    }
}

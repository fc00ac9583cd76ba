// src/services/booking.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::errors::{DispatchError as AppError, DispatchResult};
use crate::models::booking::{
    Booking, BookingDraft, BookingStatus, PaymentStatus, RouteTrace,
};
use crate::models::events::DispatchEvent;
use crate::models::offer::Offer;
use crate::models::ride_request::RideRequest;
use crate::services::events::EventSink;
use crate::storage::BookingRepository;
use crate::utils::id_generator::{IdGenerator, IdType};

#[async_trait]
pub trait BookingOperations: Send + Sync {
    /// Create a booking from a customer draft. Missing required fields fail
    /// with a field-level error; the booking starts pending and unpaid.
    async fn create(&self, draft: BookingDraft) -> DispatchResult<Booking>;
    /// Create the booking that results from a won negotiation. It starts in
    /// accepted state with the settlement price already fixed.
    async fn create_for_accepted_offer(
        &self,
        request: &RideRequest,
        offer: &Offer,
    ) -> DispatchResult<Booking>;
    async fn get_booking(&self, booking_id: &str) -> DispatchResult<Booking>;
    /// Move a booking along the lifecycle graph. Illegal transitions fail
    /// without touching the record.
    async fn set_status(&self, booking_id: &str, next: BookingStatus) -> DispatchResult<Booking>;
    async fn attach_route(&self, booking_id: &str, route: RouteTrace) -> DispatchResult<Booking>;
    /// Mark a booking paid. A settlement amount, when given, becomes the
    /// final price.
    async fn pay(&self, booking_id: &str, amount: Option<f64>) -> DispatchResult<Booking>;
    async fn list_by_customer(&self, customer_id: &str) -> DispatchResult<Vec<Booking>>;
    async fn list_by_driver(&self, driver_id: &str) -> DispatchResult<Vec<Booking>>;
}

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    sink: Arc<dyn EventSink>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, sink: Arc<dyn EventSink>) -> Self {
        Self { repo, sink }
    }
}

#[async_trait]
impl BookingOperations for BookingService {
    async fn create(&self, draft: BookingDraft) -> DispatchResult<Booking> {
        if draft.customer_id.is_empty() {
            return Err(AppError::missing_field("customer_id"));
        }
        let pickup_location = draft
            .pickup_location
            .ok_or_else(|| AppError::missing_field("pickup_location"))?;
        let dropoff_location = draft
            .dropoff_location
            .ok_or_else(|| AppError::missing_field("dropoff_location"))?;
        let passenger_count = draft
            .passenger_count
            .ok_or_else(|| AppError::missing_field("passenger_count"))?;
        let vehicle_class = draft
            .vehicle_class
            .ok_or_else(|| AppError::missing_field("vehicle_class"))?;

        let now = Utc::now();
        let booking = Booking {
            id: IdGenerator::generate(IdType::Booking),
            reference_code: Booking::generate_reference_code(),
            customer_id: draft.customer_id,
            driver_id: draft.driver_id,
            pickup_location,
            dropoff_location,
            pickup_time: draft.pickup_time,
            passenger_count,
            vehicle_class,
            base_price: draft.base_price.unwrap_or(0.0),
            final_price: None,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            status: BookingStatus::Pending,
            route: None,
            created_at: now,
            updated_at: now,
            picked_up_at: None,
            completed_at: None,
            cancelled_at: None,
        };

        self.repo.save(booking.clone()).await?;
        tracing::info!(
            "Created booking {} ({}) for customer {}",
            booking.id,
            booking.reference_code,
            booking.customer_id
        );
        Ok(booking)
    }

    async fn create_for_accepted_offer(
        &self,
        request: &RideRequest,
        offer: &Offer,
    ) -> DispatchResult<Booking> {
        let now = Utc::now();
        let final_price = offer.settlement_price();
        let booking = Booking {
            id: IdGenerator::generate(IdType::Booking),
            reference_code: Booking::generate_reference_code(),
            customer_id: request.customer_id.clone(),
            driver_id: Some(offer.driver.driver_id.clone()),
            pickup_location: request.pickup.clone(),
            dropoff_location: request.dropoff.clone(),
            pickup_time: None,
            passenger_count: 1,
            vehicle_class: request.vehicle_class,
            base_price: offer.quoted_price,
            final_price: Some(final_price),
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            status: BookingStatus::Accepted,
            route: None,
            created_at: now,
            updated_at: now,
            picked_up_at: None,
            completed_at: None,
            cancelled_at: None,
        };

        self.repo.save(booking.clone()).await?;
        tracing::info!(
            "Created booking {} from request {} accepted by driver {}",
            booking.id,
            request.id,
            offer.driver.driver_id
        );

        let event = DispatchEvent::RideAccepted {
            booking_id: booking.id.clone(),
            request_id: request.id.clone(),
            customer_id: booking.customer_id.clone(),
            driver_id: offer.driver.driver_id.clone(),
            final_price,
        };
        if let Err(e) = self.sink.deliver(&event).await {
            tracing::warn!("Failed to announce acceptance of {}: {}", booking.id, e);
        }

        Ok(booking)
    }

    async fn get_booking(&self, booking_id: &str) -> DispatchResult<Booking> {
        self.repo
            .get(booking_id)
            .await?
            .ok_or_else(|| AppError::booking_not_found(booking_id))
    }

    async fn set_status(&self, booking_id: &str, next: BookingStatus) -> DispatchResult<Booking> {
        let mut booking = self.get_booking(booking_id).await?;

        if !booking.status.can_transition_to(next) {
            return Err(AppError::invalid_transition(
                booking.status.as_str(),
                next.as_str(),
            ));
        }

        let now = Utc::now();
        booking.status = next;
        booking.updated_at = now;
        match next {
            BookingStatus::InProgress => booking.picked_up_at = Some(now),
            BookingStatus::Completed => booking.completed_at = Some(now),
            BookingStatus::Cancelled => booking.cancelled_at = Some(now),
            _ => {}
        }

        self.repo.save(booking.clone()).await?;
        tracing::info!("Booking {} moved to {}", booking_id, next);

        if next == BookingStatus::Cancelled {
            let event = DispatchEvent::RideCancelled {
                booking_id: booking.id.clone(),
                customer_id: booking.customer_id.clone(),
                driver_id: booking.driver_id.clone(),
            };
            if let Err(e) = self.sink.deliver(&event).await {
                tracing::warn!("Failed to announce cancellation of {}: {}", booking_id, e);
            }
        }

        Ok(booking)
    }

    async fn attach_route(&self, booking_id: &str, route: RouteTrace) -> DispatchResult<Booking> {
        if route.driver_path.is_empty() {
            return Err(AppError::InvalidRoute(
                "driver path must contain at least one point".to_string(),
            ));
        }

        let mut booking = self.get_booking(booking_id).await?;
        booking.route = Some(route);
        booking.updated_at = Utc::now();

        self.repo.save(booking.clone()).await?;
        tracing::debug!("Attached route trace to booking {}", booking_id);
        Ok(booking)
    }

    async fn pay(&self, booking_id: &str, amount: Option<f64>) -> DispatchResult<Booking> {
        let mut booking = self.get_booking(booking_id).await?;

        let now = Utc::now();
        booking.payment_status = PaymentStatus::Paid;
        booking.paid_at = Some(now);
        booking.updated_at = now;
        if let Some(amount) = amount {
            booking.final_price = Some(amount);
        }

        self.repo.save(booking.clone()).await?;
        tracing::info!(
            "Booking {} paid ({:?})",
            booking_id,
            booking.final_price
        );
        Ok(booking)
    }

    async fn list_by_customer(&self, customer_id: &str) -> DispatchResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .repo
            .list()
            .await?
            .into_iter()
            .filter(|b| b.customer_id == customer_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_by_driver(&self, driver_id: &str) -> DispatchResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .repo
            .list()
            .await?
            .into_iter()
            .filter(|b| b.driver_id.as_deref() == Some(driver_id))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{Location, RoutePoint};
    use crate::models::driver::VehicleClass;
    use crate::services::events::NoopEventSink;
    use crate::storage::memory::InMemoryBookingRepository;

    fn service() -> BookingService {
        BookingService::new(
            Arc::new(InMemoryBookingRepository::new()),
            Arc::new(NoopEventSink),
        )
    }

    fn location(address: &str) -> Location {
        Location {
            latitude: 5.6037,
            longitude: -0.1870,
            address: address.to_string(),
        }
    }

    fn draft() -> BookingDraft {
        BookingDraft {
            customer_id: "cus-250830-aaaaaa".to_string(),
            pickup_location: Some(location("Independence Ave")),
            dropoff_location: Some(location("Airport Rd")),
            passenger_count: Some(2),
            vehicle_class: Some(VehicleClass::Sedan),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_booking_defaults() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();

        assert!(booking.id.starts_with("bok-"));
        assert!(booking.reference_code.starts_with("KD-"));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
        assert!(booking.driver_id.is_none());
        assert!(booking.final_price.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let service = service();

        let mut missing_pickup = draft();
        missing_pickup.pickup_location = None;
        match service.create(missing_pickup).await {
            Err(AppError::MissingRequiredField(field)) => assert_eq!(field, "pickup_location"),
            other => panic!("expected missing field error, got {:?}", other.map(|b| b.id)),
        }

        let mut missing_class = draft();
        missing_class.vehicle_class = None;
        match service.create(missing_class).await {
            Err(AppError::MissingRequiredField(field)) => assert_eq!(field, "vehicle_class"),
            other => panic!("expected missing field error, got {:?}", other.map(|b| b.id)),
        }

        let mut missing_count = draft();
        missing_count.passenger_count = None;
        assert!(matches!(
            service.create(missing_count).await,
            Err(AppError::MissingRequiredField(_))
        ));
    }

    #[tokio::test]
    async fn test_full_lifecycle_stamps_timestamps() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();

        let steps = [
            BookingStatus::Accepted,
            BookingStatus::DriverEnRoute,
            BookingStatus::DriverArrived,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ];
        let mut current = booking;
        for step in steps {
            current = service.set_status(&current.id, step).await.unwrap();
            assert_eq!(current.status, step);
        }

        assert!(current.picked_up_at.is_some());
        assert!(current.completed_at.is_some());
        assert!(current.cancelled_at.is_none());
    }

    #[tokio::test]
    async fn test_illegal_transition_leaves_record_untouched() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();

        let result = service
            .set_status(&booking.id, BookingStatus::InProgress)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));

        let stored = service.get_booking(&booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert!(stored.picked_up_at.is_none());
    }

    #[tokio::test]
    async fn test_cancel_from_in_progress() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();
        for step in [
            BookingStatus::Accepted,
            BookingStatus::DriverEnRoute,
            BookingStatus::DriverArrived,
            BookingStatus::InProgress,
        ] {
            service.set_status(&booking.id, step).await.unwrap();
        }

        let cancelled = service
            .set_status(&booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        // Terminal: nothing moves out of cancelled
        let result = service
            .set_status(&booking.id, BookingStatus::Completed)
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_attach_route_requires_driver_path() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();

        let empty = RouteTrace {
            driver_path: vec![],
            customer_path: vec![],
        };
        assert!(matches!(
            service.attach_route(&booking.id, empty).await,
            Err(AppError::InvalidRoute(_))
        ));

        let trace = RouteTrace {
            driver_path: vec![RoutePoint {
                latitude: 5.60,
                longitude: -0.18,
                recorded_at: Utc::now(),
            }],
            customer_path: vec![],
        };
        let updated = service.attach_route(&booking.id, trace).await.unwrap();
        assert!(updated.route.is_some());
    }

    #[tokio::test]
    async fn test_pay_sets_final_price() {
        let service = service();
        let booking = service.create(draft()).await.unwrap();

        let paid = service.pay(&booking.id, Some(23.50)).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.final_price, Some(23.50));
        assert!(paid.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_listings_filter_and_sort() {
        let service = service();
        let first = service.create(draft()).await.unwrap();

        let mut other = draft();
        other.customer_id = "cus-250830-bbbbbb".to_string();
        other.driver_id = Some("drv-250830-111111".to_string());
        let second = service.create(other).await.unwrap();

        let mine = service.list_by_customer("cus-250830-aaaaaa").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);

        let driven = service.list_by_driver("drv-250830-111111").await.unwrap();
        assert_eq!(driven.len(), 1);
        assert_eq!(driven[0].id, second.id);

        assert!(service
            .list_by_driver("drv-250830-999999")
            .await
            .unwrap()
            .is_empty());
    }
}

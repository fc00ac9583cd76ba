// src/services/registry.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::errors::{DispatchError as AppError, DispatchResult};
use crate::models::driver::{
    ApprovalFilter, ApprovalStatus, Driver, DriverLocation, DriverLocationUpdate,
    DriverRegistration, Vehicle,
};
use crate::storage::DriverRepository;
use crate::utils::id_generator::{IdGenerator, IdType};

#[async_trait]
pub trait RegistryOperations {
    /// Register a new driver, or replace the full record when the
    /// registration carries an existing id.
    async fn register(&self, registration: DriverRegistration) -> DispatchResult<Driver>;
    async fn get_driver(&self, driver_id: &str) -> DispatchResult<Driver>;
    async fn update_location(&self, update: DriverLocationUpdate) -> DispatchResult<Driver>;
    async fn set_availability(&self, driver_id: &str, available: bool) -> DispatchResult<Driver>;
    async fn set_approval(&self, driver_id: &str, approval: ApprovalStatus)
        -> DispatchResult<Driver>;
    async fn list_by_status(&self, filter: ApprovalFilter) -> DispatchResult<Vec<Driver>>;
}

pub struct DriverRegistry {
    repo: Arc<dyn DriverRepository>,
}

impl DriverRegistry {
    pub fn new(repo: Arc<dyn DriverRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RegistryOperations for DriverRegistry {
    async fn register(&self, registration: DriverRegistration) -> DispatchResult<Driver> {
        let id = match registration.driver_id {
            Some(id) => {
                if !IdGenerator::validate_id(&id, Some(IdType::Driver)) {
                    return Err(AppError::InvalidDriverId(id));
                }
                id
            }
            None => IdGenerator::generate(IdType::Driver),
        };

        let now = Utc::now();
        let driver = Driver {
            id: id.clone(),
            display_name: registration.display_name,
            phone_number: registration.phone_number,
            vehicle: Vehicle {
                license_plate: registration.license_plate,
                class: registration.vehicle_class,
                make: registration.vehicle_make,
                model: registration.vehicle_model,
                year: registration.vehicle_year,
                color: registration.vehicle_color,
            },
            // Every registration starts unapproved and offline
            approval: ApprovalStatus::Pending,
            available: false,
            location: None,
            rating: 0.0,
            total_rides: 0,
            created_at: now,
            updated_at: now,
        };

        self.repo.upsert(driver.clone()).await?;
        tracing::info!("Registered driver {} ({})", driver.id, driver.display_name);
        Ok(driver)
    }

    async fn get_driver(&self, driver_id: &str) -> DispatchResult<Driver> {
        self.repo
            .get(driver_id)
            .await?
            .ok_or_else(|| AppError::driver_not_found(driver_id))
    }

    async fn update_location(&self, update: DriverLocationUpdate) -> DispatchResult<Driver> {
        let mut driver = self.get_driver(&update.driver_id).await?;

        driver.location = Some(DriverLocation {
            latitude: update.latitude,
            longitude: update.longitude,
            heading: update.heading,
            speed_kmh: update.speed_kmh,
            recorded_at: Utc::now(),
        });
        driver.updated_at = Utc::now();

        self.repo.update(driver.clone()).await?;
        tracing::debug!(
            "Updated location for driver {}: ({}, {})",
            driver.id,
            update.latitude,
            update.longitude
        );
        Ok(driver)
    }

    async fn set_availability(&self, driver_id: &str, available: bool) -> DispatchResult<Driver> {
        let mut driver = self.get_driver(driver_id).await?;

        driver.available = available;
        driver.updated_at = Utc::now();

        self.repo.update(driver.clone()).await?;
        tracing::info!("Driver {} is now {}", driver_id, if available { "online" } else { "offline" });
        Ok(driver)
    }

    async fn set_approval(
        &self,
        driver_id: &str,
        approval: ApprovalStatus,
    ) -> DispatchResult<Driver> {
        let mut driver = self.get_driver(driver_id).await?;

        driver.approval = approval;
        driver.updated_at = Utc::now();

        self.repo.update(driver.clone()).await?;
        tracing::info!("Set approval for driver {}: {:?}", driver_id, driver.approval);
        Ok(driver)
    }

    async fn list_by_status(&self, filter: ApprovalFilter) -> DispatchResult<Vec<Driver>> {
        let drivers = self.repo.list().await?;
        Ok(drivers
            .into_iter()
            .filter(|d| match filter {
                ApprovalFilter::All => true,
                ApprovalFilter::Pending => d.approval == ApprovalStatus::Pending,
                ApprovalFilter::Approved => d.approval == ApprovalStatus::Approved,
                ApprovalFilter::Rejected => matches!(d.approval, ApprovalStatus::Rejected(_)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::VehicleClass;
    use crate::storage::memory::InMemoryDriverRepository;

    fn registration(name: &str) -> DriverRegistration {
        DriverRegistration {
            driver_id: None,
            display_name: name.to_string(),
            phone_number: "+233201234567".to_string(),
            license_plate: "GR-1234-25".to_string(),
            vehicle_class: VehicleClass::Sedan,
            vehicle_make: "Toyota".to_string(),
            vehicle_model: "Corolla".to_string(),
            vehicle_year: 2021,
            vehicle_color: "silver".to_string(),
        }
    }

    fn registry() -> DriverRegistry {
        DriverRegistry::new(Arc::new(InMemoryDriverRepository::new()))
    }

    #[tokio::test]
    async fn test_register_defaults() {
        let registry = registry();
        let driver = registry.register(registration("Ama")).await.unwrap();

        assert!(driver.id.starts_with("drv-"));
        assert_eq!(driver.approval, ApprovalStatus::Pending);
        assert!(!driver.available);
        assert!(driver.location.is_none());
        assert_eq!(driver.rating, 0.0);
        assert_eq!(driver.total_rides, 0);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_record() {
        let registry = registry();
        let first = registry.register(registration("Ama")).await.unwrap();
        registry
            .set_approval(&first.id, ApprovalStatus::Approved)
            .await
            .unwrap();

        let mut again = registration("Ama Serwaa");
        again.driver_id = Some(first.id.clone());
        let replaced = registry.register(again).await.unwrap();

        assert_eq!(replaced.id, first.id);
        assert_eq!(replaced.display_name, "Ama Serwaa");
        // Replacement resets approval like any fresh registration
        assert_eq!(replaced.approval, ApprovalStatus::Pending);

        let all = registry.list_by_status(ApprovalFilter::All).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_id() {
        let registry = registry();
        let mut bad = registration("Ama");
        bad.driver_id = Some("not-a-driver-id".to_string());

        let result = registry.register(bad).await;
        assert!(matches!(result, Err(AppError::InvalidDriverId(_))));
    }

    #[tokio::test]
    async fn test_location_update_unknown_driver() {
        let registry = registry();
        let result = registry
            .update_location(DriverLocationUpdate {
                driver_id: "drv-250830-zzzzzz".to_string(),
                latitude: 5.60,
                longitude: -0.18,
                heading: None,
                speed_kmh: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::DriverNotFound(_))));
    }

    #[tokio::test]
    async fn test_location_and_availability_roundtrip() {
        let registry = registry();
        let driver = registry.register(registration("Kwame")).await.unwrap();

        let updated = registry
            .update_location(DriverLocationUpdate {
                driver_id: driver.id.clone(),
                latitude: 5.6037,
                longitude: -0.1870,
                heading: Some(90.0),
                speed_kmh: Some(35.0),
            })
            .await
            .unwrap();
        let location = updated.location.unwrap();
        assert_eq!(location.latitude, 5.6037);
        assert_eq!(location.heading, Some(90.0));

        let online = registry.set_availability(&driver.id, true).await.unwrap();
        assert!(online.available);
    }

    #[tokio::test]
    async fn test_list_by_status_filters() {
        let registry = registry();
        let a = registry.register(registration("Ama")).await.unwrap();
        let b = registry.register(registration("Kwame")).await.unwrap();
        let _c = registry.register(registration("Efua")).await.unwrap();

        registry
            .set_approval(&a.id, ApprovalStatus::Approved)
            .await
            .unwrap();
        registry
            .set_approval(&b.id, ApprovalStatus::Rejected("expired license".to_string()))
            .await
            .unwrap();

        let approved = registry
            .list_by_status(ApprovalFilter::Approved)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, a.id);

        let rejected = registry
            .list_by_status(ApprovalFilter::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.len(), 1);

        let pending = registry
            .list_by_status(ApprovalFilter::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        let all = registry.list_by_status(ApprovalFilter::All).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}

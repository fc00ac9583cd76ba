// src/pricing.rs
//
// Pure fare math. Nothing here touches storage or the clock; both the
// matcher (quoting) and the booking service (settlement) call into it.

use serde::{Deserialize, Serialize};

use crate::models::driver::VehicleClass;

/// Base per-kilometer rate, scaled by the vehicle class multiplier.
pub const BASE_PER_KM: f64 = 1.2;
/// Base per-minute rate.
pub const BASE_PER_MIN: f64 = 0.2;
/// Base flag drop added to every trip.
pub const BASE_FLAG_DROP: f64 = 3.0;
/// No quote goes below this, regardless of distance or duration.
pub const MINIMUM_FARE: f64 = 5.0;

fn class_multiplier(class: VehicleClass) -> f64 {
    match class {
        VehicleClass::Sedan => 0.8,
        VehicleClass::Suv => 1.0,
        VehicleClass::Van => 1.1,
        VehicleClass::Luxury => 1.5,
    }
}

/// Round to 2 decimal places, half-up.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Deterministic fare quote for a trip.
///
/// `max(MINIMUM_FARE, round2(per_km * distance + per_min * duration + flag_drop))`
/// where each rate is the base rate scaled by the vehicle class multiplier.
/// Monotonic non-decreasing in both distance and duration.
pub fn estimate_fare(distance_km: f64, duration_min: f64, class: VehicleClass) -> f64 {
    let multiplier = class_multiplier(class);
    let raw = BASE_PER_KM * multiplier * distance_km
        + BASE_PER_MIN * multiplier * duration_min
        + BASE_FLAG_DROP * multiplier;
    round2(raw).max(MINIMUM_FARE)
}

/// Platform pricing knobs, supplied by the (external) configuration store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PricingConfig {
    pub driver_per_km: f64,
    pub platform_fee_percent: f64,
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            driver_per_km: 1.0,
            platform_fee_percent: 3.0,
            currency: "EUR".to_string(),
        }
    }
}

/// Driver payout / platform fee / customer total split for one trip.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripPricing {
    pub driver_fare: f64,
    pub platform_fee: f64,
    pub total: f64,
    pub currency: String,
}

pub fn compute_trip_pricing(distance_km: f64, config: &PricingConfig) -> TripPricing {
    let driver_fare = round2(distance_km * config.driver_per_km);
    let total = round2(driver_fare * (1.0 + config.platform_fee_percent / 100.0));
    let platform_fee = round2(total - driver_fare);

    TripPricing {
        driver_fare,
        platform_fee,
        total,
        currency: config.currency.clone(),
    }
}

/// Settlement breakdown of a gross amount into tax, platform fee and driver net.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentBreakdown {
    pub gross: f64,
    pub tax: f64,
    pub platform_fee: f64,
    pub net: f64,
}

pub fn compute_payment(gross: f64, tax_percent: f64, fee_percent: f64) -> PaymentBreakdown {
    let gross = round2(gross);
    let tax = round2(gross * tax_percent / 100.0);
    let platform_fee = round2(gross * fee_percent / 100.0);
    let net = round2(gross - tax - platform_fee);

    PaymentBreakdown {
        gross,
        tax,
        platform_fee,
        net,
    }
}

// src/models/offer.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::driver::DriverSnapshot;

/// Ranked matching result: one eligible driver plus the quote shown to the
/// customer. Candidates are the input to a negotiation session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Candidate {
    pub driver: DriverSnapshot,
    /// Road-agnostic distance from the driver to the pickup point, in km.
    pub distance_km: f64,
    pub eta_min: i32,
    pub quoted_price: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Ephemeral, price-bearing offer inside one negotiation session.
/// The offer id doubles as the candidate driver id for that session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Offer {
    pub id: String,
    pub driver: DriverSnapshot,
    pub distance_km: f64,
    pub eta_min: i32,
    pub quoted_price: f64,
    pub negotiated_price: Option<f64>,
    /// One counter-offer per candidate per session.
    pub counter_submitted: bool,
    pub status: OfferStatus,
}

impl Offer {
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            id: candidate.driver.driver_id.clone(),
            driver: candidate.driver,
            distance_km: candidate.distance_km,
            eta_min: candidate.eta_min,
            quoted_price: candidate.quoted_price,
            negotiated_price: None,
            counter_submitted: false,
            status: OfferStatus::Pending,
        }
    }

    /// Price the booking settles at: the negotiated price when one was
    /// agreed, the original quote otherwise.
    pub fn settlement_price(&self) -> f64 {
        self.negotiated_price.unwrap_or(self.quoted_price)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    ClosedAccepted,
    ClosedExpired,
}

/// Bounded-time negotiation over the candidate shortlist of one ride request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NegotiationSession {
    pub id: String,
    pub request_id: String,
    pub customer_id: String,
    pub offers: Vec<Offer>,
    pub state: SessionState,
    pub opened_at: DateTime<Utc>,
    /// Authoritative wall-clock deadline; no accept is honored past it.
    pub deadline: DateTime<Utc>,
    pub accepted_offer_id: Option<String>,
}

impl NegotiationSession {
    /// Seconds left on the session timer, for countdown display. Zero once
    /// the deadline has passed or the session is closed.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        if self.state != SessionState::Open {
            return 0;
        }
        (self.deadline - now).num_seconds().max(0)
    }

    pub fn offer(&self, offer_id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == offer_id)
    }
}

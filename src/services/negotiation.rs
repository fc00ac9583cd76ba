// src/services/negotiation.rs
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{DispatchError as AppError, DispatchResult};
use crate::models::booking::Booking;
use crate::models::offer::{Candidate, NegotiationSession, Offer, OfferStatus, SessionState};
use crate::models::ride_request::RideRequest;
use crate::services::booking::BookingOperations;
use crate::storage::RideRequestRepository;

/// Decides whether the driver side takes a customer counter-offer.
pub trait CounterOfferPolicy: Send + Sync {
    fn should_accept(&self, offer: &Offer, counter_price: f64) -> bool;
}

/// Accepts any counter-offer at or above a fixed fraction of the quote.
/// Deterministic, so customers get consistent outcomes for the same trip.
pub struct MinimumFarePolicy {
    pub min_fare_ratio: f64,
}

impl Default for MinimumFarePolicy {
    fn default() -> Self {
        Self { min_fare_ratio: 0.8 }
    }
}

impl CounterOfferPolicy for MinimumFarePolicy {
    fn should_accept(&self, offer: &Offer, counter_price: f64) -> bool {
        counter_price >= self.min_fare_ratio * offer.quoted_price
    }
}

/// Coin-flip acceptance with a seedable generator. Only useful for demos
/// and simulation runs where a fixed seed makes the outcome reproducible.
pub struct SeededCoinFlipPolicy {
    rng: Mutex<StdRng>,
}

impl SeededCoinFlipPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CounterOfferPolicy for SeededCoinFlipPolicy {
    fn should_accept(&self, _offer: &Offer, _counter_price: f64) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>() < 0.5
    }
}

/// Outcome of one counter-offer round.
#[derive(Debug, Clone)]
pub struct CounterDecision {
    pub accepted: bool,
    pub offer: Offer,
}

/// Runs bounded-time negotiation sessions over candidate shortlists.
///
/// The session deadline is checked on every mutation instead of being
/// enforced by a background timer, so a session that nobody touches after
/// its deadline simply reports itself expired on the next access.
pub struct NegotiationController {
    sessions: RwLock<HashMap<String, NegotiationSession>>,
    requests: Arc<dyn RideRequestRepository>,
    bookings: Arc<dyn BookingOperations>,
    policy: Arc<dyn CounterOfferPolicy>,
    session_ttl_secs: i64,
}

impl NegotiationController {
    pub fn new(
        requests: Arc<dyn RideRequestRepository>,
        bookings: Arc<dyn BookingOperations>,
        policy: Arc<dyn CounterOfferPolicy>,
        session_ttl_secs: i64,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            requests,
            bookings,
            policy,
            session_ttl_secs,
        }
    }

    /// Open a session over the candidate shortlist of a request. The clock
    /// starts immediately.
    pub async fn open_session(
        &self,
        request: &RideRequest,
        candidates: Vec<Candidate>,
    ) -> DispatchResult<NegotiationSession> {
        let now = Utc::now();
        let session = NegotiationSession {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            customer_id: request.customer_id.clone(),
            offers: candidates.into_iter().map(Offer::from_candidate).collect(),
            state: SessionState::Open,
            opened_at: now,
            deadline: now + Duration::seconds(self.session_ttl_secs),
            accepted_offer_id: None,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        tracing::info!(
            "Opened negotiation session {} for request {} with {} offers",
            session.id,
            session.request_id,
            session.offers.len()
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> DispatchResult<NegotiationSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    /// Seconds left on the session countdown.
    pub async fn remaining_secs(&self, session_id: &str) -> DispatchResult<i64> {
        let session = self.get_session(session_id).await?;
        Ok(session.remaining_secs(Utc::now()))
    }

    /// Accept one offer. First acceptance on the underlying request wins;
    /// everything after that fails and the session stays as the winner left
    /// it. A successful accept closes the session and creates the booking.
    pub async fn accept(&self, session_id: &str, offer_id: &str) -> DispatchResult<Booking> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        if session.state != SessionState::Open {
            return Err(AppError::SessionClosed(session_id.to_string()));
        }
        let now = Utc::now();
        if now > session.deadline {
            close_expired(session);
            return Err(AppError::SessionClosed(session_id.to_string()));
        }

        let driver_id = session
            .offer(offer_id)
            .map(|o| o.driver.driver_id.clone())
            .ok_or_else(|| AppError::OfferNotFound(offer_id.to_string()))?;

        // The request-level CAS is the single point of arbitration between
        // concurrent sessions and drivers
        let request = self
            .requests
            .try_accept(&session.request_id, &driver_id, now)
            .await?;

        for offer in &mut session.offers {
            offer.status = if offer.id == offer_id {
                OfferStatus::Accepted
            } else {
                OfferStatus::Rejected
            };
        }
        session.state = SessionState::ClosedAccepted;
        session.accepted_offer_id = Some(offer_id.to_string());

        let accepted = session
            .offer(offer_id)
            .cloned()
            .ok_or_else(|| AppError::OfferNotFound(offer_id.to_string()))?;
        tracing::info!(
            "Session {} accepted offer {} at {}",
            session_id,
            offer_id,
            accepted.settlement_price()
        );

        self.bookings
            .create_for_accepted_offer(&request, &accepted)
            .await
    }

    /// Submit a customer counter-price against one offer. Each offer takes
    /// at most one counter per session; the configured policy decides.
    pub async fn negotiate(
        &self,
        session_id: &str,
        offer_id: &str,
        counter_price: f64,
    ) -> DispatchResult<CounterDecision> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        if session.state != SessionState::Open {
            return Err(AppError::SessionClosed(session_id.to_string()));
        }
        if Utc::now() > session.deadline {
            close_expired(session);
            return Err(AppError::SessionClosed(session_id.to_string()));
        }

        let offer = session
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| AppError::OfferNotFound(offer_id.to_string()))?;

        if offer.counter_submitted {
            return Err(AppError::CounterAlreadySubmitted(offer_id.to_string()));
        }
        offer.counter_submitted = true;

        let accepted = self.policy.should_accept(offer, counter_price);
        if accepted {
            offer.negotiated_price = Some(counter_price);
        }
        tracing::info!(
            "Counter-offer of {} on offer {} in session {}: {}",
            counter_price,
            offer_id,
            session_id,
            if accepted { "accepted" } else { "declined" }
        );

        Ok(CounterDecision {
            accepted,
            offer: offer.clone(),
        })
    }

    /// Close a session as expired. Idempotent; a session that already
    /// resolved keeps its outcome.
    pub async fn expire(&self, session_id: &str) -> DispatchResult<NegotiationSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        if session.state == SessionState::Open {
            close_expired(session);
            tracing::info!("Session {} expired unresolved", session_id);
        }
        Ok(session.clone())
    }
}

fn close_expired(session: &mut NegotiationSession) {
    for offer in &mut session.offers {
        if offer.status == OfferStatus::Pending {
            offer.status = OfferStatus::Rejected;
        }
    }
    session.state = SessionState::ClosedExpired;
}

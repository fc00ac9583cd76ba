// src/services/mod.rs
pub mod booking;
pub mod events;
pub mod matcher;
pub mod negotiation;
pub mod registry;

pub use booking::{BookingOperations, BookingService};
pub use events::{EventSink, NoopEventSink, WebhookConfig, WebhookEventSink};
pub use matcher::{MatcherOperations, RideMatcher};
pub use negotiation::{
    CounterDecision, CounterOfferPolicy, MinimumFarePolicy, NegotiationController,
    SeededCoinFlipPolicy,
};
pub use registry::{DriverRegistry, RegistryOperations};

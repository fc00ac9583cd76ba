// src/lib.rs
//
// kite-dispatch: dispatch and booking lifecycle engine for a ride-hailing
// platform. Driver registry, request matching, offer negotiation, booking
// lifecycle and fare math live here; transports (HTTP, websockets, push)
// sit on top of the services this crate exposes.

pub mod errors;
pub mod models;
pub mod pricing;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod utils;

pub use errors::{DispatchError, DispatchResult, ValidationError};
pub use state::{AppState, DispatchConfig};

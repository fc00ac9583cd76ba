// src/models/mod.rs
pub mod booking;
pub mod driver;
pub mod events;
pub mod offer;
pub mod ride_request;

pub use booking::*;
pub use driver::*;
pub use events::*;
pub use offer::*;
pub use ride_request::*;

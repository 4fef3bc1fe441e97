//! ClassPulse domain logic.
//!
//! Pure building blocks shared by the persistence layer, the delivery engine
//! and the HTTP API. Nothing in this crate performs I/O.

pub mod delivery;
pub mod error;
pub mod hashing;
pub mod messages;
pub mod otp;
pub mod phone;
pub mod rate_limit;
pub mod reminder;
pub mod render;
pub mod types;

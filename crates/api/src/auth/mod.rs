//! Authentication and abuse-protection primitives.
//!
//! - [`jwt`] -- staff access tokens and parent session tokens.
//! - [`otp`] -- phone-based one-time passcode login for parents.
//! - [`rate_limit`] -- sliding one-hour limits on costly actions.

pub mod jwt;
pub mod otp;
pub mod rate_limit;

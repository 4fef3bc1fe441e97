//! Row models for the ClassPulse tables.

pub mod attendance;
pub mod delivery_record;
pub mod institute;
pub mod invitation;
pub mod invoice;
pub mod leave_request;
pub mod otp;
pub mod parent;

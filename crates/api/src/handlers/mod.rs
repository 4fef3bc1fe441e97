pub mod institutes;
pub mod invitations;
pub mod notifications;
pub mod parents;
pub mod triggers;
pub mod webhooks;

//! Kontrol event bus and notification delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the domain event envelope, plus the event type
//!   names in [`event_types`].
//! - [`notify`] -- turns events into [`OutgoingMessage`]s and runs the
//!   [`NotificationDispatcher`] loop.
//! - [`delivery`] -- SMTP delivery.

pub mod bus;
pub mod delivery;
pub mod event_types;
pub mod notify;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notify::{
    NotificationDispatcher, OutgoingMessage, Recipient, RecipientDirectory, RecipientLookupError,
};

//! # Notifications
//!
//! Fans a message out to chat and email concurrently and reports a per-channel
//! delivery result. Transport failures never reach the caller.

pub mod chat;
pub mod dispatcher;
pub mod email;
pub mod notifier;
pub mod transport;

pub use chat::SlackTransport;
pub use dispatcher::Dispatcher;
pub use email::SmtpTransport;
pub use notifier::Notifier;
pub use transport::{DEFAULT_EMAIL_SUBJECT, DispatchOptions, Transport};

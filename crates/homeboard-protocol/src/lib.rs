//! Wire types shared by the homeboard core and CLI.
//!
//! No I/O lives here: only the domain table, the push-channel frame format,
//! the notification record, and the user-intent actions posted to the server.

mod actions;
mod domain;
mod errors;
mod messages;
mod types;

pub use actions::{Action, LightMode, MediaCommand};
pub use domain::{Churn, Domain, TIMERS_WIDGET};
pub use errors::ProtocolError;
pub use messages::{Frame, InboundMessage, MessageKind, decode_frame};
pub use types::{MAX_NOTIFICATIONS, Notification, NotificationKind, NotificationList};

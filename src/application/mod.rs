//! Application Layer
//!
//! The tracker service, its runtime message protocol and notification fan-out.

pub mod messages;
pub mod notifications;
pub mod tracker;

pub use messages::{PendingRequest, TrackerRequest, TrackerResponse, TrackerUpdate, UNKNOWN_MESSAGE_TYPE};
pub use notifications::{NotificationCenter, NOTIFICATION_TITLE};
pub use tracker::{TrackerError, TrackerService, TrackerSettings, WRAPPED_SOL_MINT};

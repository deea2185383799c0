//! Data models
//!
//! This module contains all data structures used throughout the alertdash
//! dashboard. Models represent:
//! - Server-held session state
//! - Subscription settings and tracked-alert records
//! - The notification-category bitmask

mod session;
mod subscription;

pub use session::Session;
pub use subscription::{NotificationKind, NotificationStatus, Subscription, TrackedAlert};

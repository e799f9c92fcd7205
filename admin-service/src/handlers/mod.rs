//! HTTP handlers for admin-service.

pub mod auth;
pub mod health;
pub mod identities;
pub mod metrics;
pub mod schemas;
pub mod sessions;
pub mod stats;

pub use auth::*;
pub use health::*;
pub use identities::*;
pub use schemas::*;
pub use sessions::*;
pub use stats::*;

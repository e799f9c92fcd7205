//! Upstream records this service passes through. Nothing here is persisted.

pub mod identity;
pub mod schema;
pub mod session;

pub use identity::{Identity, IdentityState, INCLUDED_CREDENTIAL_TYPES};
pub use schema::IdentitySchema;
pub use session::Session;

//! Services layer for admin-service.
//!
//! `JwtService` authenticates the single administrator; `KratosClient` is the
//! gateway to the upstream identity service.

pub mod error;
mod jwt;
pub mod kratos;
pub mod metrics;

pub use error::{GatewayError, TokenError};
pub use jwt::{AdminClaims, IssuedToken, JwtService, ADMIN_SUBJECT};
pub use kratos::{
    CreateIdentityBody, DeletableCredential, IdentityPage, KratosClient, UpdateIdentityBody,
    MIN_PASSWORD_LENGTH,
};

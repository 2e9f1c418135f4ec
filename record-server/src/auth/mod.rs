//! Authentication
//!
//! Anonymous principals identified by a JWT:
//! - [`JwtService`] - token minting and validation
//! - [`CurrentPrincipal`] - caller identity injected into requests
//! - [`require_auth`] - bearer token middleware

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentPrincipal, IssuedToken, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;

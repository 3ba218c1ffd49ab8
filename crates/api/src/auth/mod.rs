//! Bearer-token verification.
//!
//! - [`jwt`] -- HS256 claims, token validation, and token generation for
//!   tooling and tests. Credentials themselves are owned by the external
//!   identity provider.

pub mod jwt;

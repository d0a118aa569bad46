//! `habitlog-auth`: credentials and session tokens.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{Claims, ClaimsError, validate_claims};
pub use password::{DEFAULT_BCRYPT_COST, PasswordError, PasswordHasher};
pub use token::{DEFAULT_TOKEN_TTL_HOURS, Hs256Jwt, JwtValidator, TokenError, TokenIssuer};

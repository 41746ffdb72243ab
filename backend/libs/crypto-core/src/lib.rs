//! Shared cryptographic primitives for the blog platform.
//!
//! - `jwt`: signed, time-limited identity tokens (HS256)
//! - `password`: Argon2id password hashing and verification
pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys, TokenError};
pub use password::{hash_password, verify_password, PasswordError};

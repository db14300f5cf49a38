//! Authentication module.
//!
//! Credentials, principals, password hashing, JWT verification and the
//! providers that turn one into the other.
//!
//! # Pre-conditions
//! - Providers are configured with valid key material at startup.
//!
//! # Post-conditions
//! - Authentication configuration is immutable once loaded.
//!
//! # Invariants
//! - Failed basic credentials and unknown users are indistinguishable on the wire.

pub mod basic;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod provider;

pub use jwt::{JwtConfig, JwtConfigError, JwtError};
pub use password::{PasswordEncoder, PasswordError};
pub use principal::{
    Authentication, AuthenticationFailure, AuthenticationMethod, Credentials, Principal,
};
pub use provider::{
    AuthenticationManager, AuthenticationProvider, InMemoryUserStore, JwtAuthenticationProvider,
    PasswordAuthenticationProvider, UserStore,
};

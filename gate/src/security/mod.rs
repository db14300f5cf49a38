//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware.rs (runs the gate, writes response headers)
//!     → gate.rs (channel → basic auth → token auth → access rules)
//!     → handler, with a SecurityContext in its extensions
//!     → method.rs guards on individual operations
//! ```
//!
//! Cross-site request forgery protection is not part of this pipeline:
//! state-changing requests are never asked for a token.

pub mod channel;
pub mod gate;
pub mod headers;
pub mod method;
pub mod middleware;
pub mod pattern;
pub mod policy;

pub use gate::{GateDecision, RequestGate, SecurityContext};
pub use method::{AccessDenied, Authenticated, require_subject};
pub use middleware::request_gate;
pub use pattern::{PathPattern, RequestMatcher};
pub use policy::{Access, AccessRule, FrameOptions, SecurityPolicy};

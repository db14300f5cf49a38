//! The security policy applied to every request.
//!
//! # Post-conditions
//! - A policy is immutable once built and shared by reference.
//!
//! # Invariants
//! - Access and frame rules are evaluated top-down; the first match wins.
//! - Rules after a universal matcher are kept but can never match.

use axum::http::StatusCode;

use super::pattern::RequestMatcher;

/// Pattern of the embedded database console.
pub const CONSOLE_PATTERN: &str = "/h2-console/**";

/// Authorization verdict attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    Authenticated,
    DenyAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub matcher: RequestMatcher,
    pub access: Access,
}

/// `X-Frame-Options` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOptions {
    Deny,
    SameOrigin,
}

impl FrameOptions {
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOptionsRule {
    pub matcher: RequestMatcher,
    pub options: FrameOptions,
}

/// Everything the request gate needs to decide on a request.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    require_https: bool,
    secure_channel: Vec<RequestMatcher>,
    trust_forwarded_proto: bool,
    https_ports: Vec<(u16, u16)>,
    access_rules: Vec<AccessRule>,
    entry_point_status: StatusCode,
    frame_rules: Vec<FrameOptionsRule>,
    default_frame_options: FrameOptions,
}

impl SecurityPolicy {
    /// The policy of the retro board API: everything is public at the
    /// authorization stage, failures answer 401, and the console may be
    /// framed by its own origin.
    #[must_use]
    pub fn new(require_https: bool) -> Self {
        Self {
            require_https,
            secure_channel: vec![RequestMatcher::path("/**")],
            trust_forwarded_proto: true,
            https_ports: vec![(80, 443), (8080, 8443)],
            access_rules: vec![
                AccessRule {
                    matcher: RequestMatcher::path("/**"),
                    access: Access::PermitAll,
                },
                AccessRule {
                    matcher: RequestMatcher::AnyRequest,
                    access: Access::Authenticated,
                },
            ],
            entry_point_status: StatusCode::UNAUTHORIZED,
            frame_rules: vec![FrameOptionsRule {
                matcher: RequestMatcher::path(CONSOLE_PATTERN),
                options: FrameOptions::SameOrigin,
            }],
            default_frame_options: FrameOptions::Deny,
        }
    }

    #[must_use]
    pub fn with_trust_forwarded_proto(mut self, trust: bool) -> Self {
        self.trust_forwarded_proto = trust;
        self
    }

    /// Replace the paths that must be served over https.
    #[must_use]
    pub fn with_secure_channel(mut self, matchers: Vec<RequestMatcher>) -> Self {
        self.secure_channel = matchers;
        self
    }

    /// Replace the ordered access rules.
    #[must_use]
    pub fn with_access_rules(mut self, rules: Vec<AccessRule>) -> Self {
        self.access_rules = rules;
        self
    }

    #[must_use]
    pub const fn require_https(&self) -> bool {
        self.require_https
    }

    #[must_use]
    pub const fn trust_forwarded_proto(&self) -> bool {
        self.trust_forwarded_proto
    }

    #[must_use]
    pub const fn entry_point_status(&self) -> StatusCode {
        self.entry_point_status
    }

    #[must_use]
    pub fn access_rules(&self) -> &[AccessRule] {
        &self.access_rules
    }

    /// Whether `path` must arrive over an encrypted channel.
    #[must_use]
    pub fn requires_secure_channel(&self, path: &str) -> bool {
        self.require_https && self.secure_channel.iter().any(|m| m.matches(path))
    }

    /// The https port to redirect to from a plaintext port.
    #[must_use]
    pub fn https_port_for(&self, http_port: u16) -> Option<u16> {
        self.https_ports
            .iter()
            .find(|(http, _)| *http == http_port)
            .map(|(_, https)| *https)
    }

    /// First matching access verdict. Paths no rule matches are denied.
    #[must_use]
    pub fn access_for(&self, path: &str) -> Access {
        self.access_rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map_or(Access::DenyAll, |rule| rule.access)
    }

    #[must_use]
    pub fn frame_options_for(&self, path: &str) -> FrameOptions {
        self.frame_rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map_or(self.default_frame_options, |rule| rule.options)
    }

    /// Access rules that follow a universal matcher and so never apply.
    #[must_use]
    pub fn unreachable_rules(&self) -> &[AccessRule] {
        match self
            .access_rules
            .iter()
            .position(|rule| rule.matcher.is_universal())
        {
            Some(index) => &self.access_rules[index + 1..],
            None => &[],
        }
    }
}

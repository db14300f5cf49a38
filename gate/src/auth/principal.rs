//! Identities and credentials flowing through the request gate.
//!
//! # Invariants
//! - A `Principal` name is never empty.
//! - Every failure to authenticate is an `AuthenticationFailure`; callers on
//!   the wire only ever see the entry-point status.

/// How a principal proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationMethod {
    /// `Authorization: Basic` username and password.
    Basic,
    /// `Authorization: Bearer` signed token.
    BearerToken,
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    method: AuthenticationMethod,
}

impl Principal {
    /// Create a principal.
    ///
    /// # Errors
    /// Returns `AuthenticationFailure::BadCredentials` if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        method: AuthenticationMethod,
    ) -> Result<Self, AuthenticationFailure> {
        let name = name.into();
        if name.is_empty() {
            return Err(AuthenticationFailure::BadCredentials);
        }
        Ok(Self { name, method })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn method(&self) -> AuthenticationMethod {
        self.method
    }
}

/// The outcome of the authentication steps for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Anonymous,
    Authenticated(Principal),
}

impl Authentication {
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(principal) => Some(principal),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Credentials extracted from a request, handed to the providers.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    UsernamePassword { username: String, password: String },
    BearerToken(String),
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&"<redacted>").finish(),
        }
    }
}

/// Error returned when credentials cannot be authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationFailure {
    /// Unknown user, wrong password, or an unusable identity.
    BadCredentials,
    /// The bearer token failed verification.
    InvalidToken(String),
    /// The `Authorization` header could not be decoded.
    MalformedHeader(String),
    /// No registered provider accepts this kind of credentials.
    ProviderNotFound,
}

impl std::fmt::Display for AuthenticationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadCredentials => write!(f, "bad credentials"),
            Self::InvalidToken(reason) => write!(f, "invalid token: {reason}"),
            Self::MalformedHeader(reason) => write!(f, "malformed authorization header: {reason}"),
            Self::ProviderNotFound => write!(f, "no authentication provider supports these credentials"),
        }
    }
}

impl std::error::Error for AuthenticationFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_rejects_empty_name() {
        let result = Principal::new("", AuthenticationMethod::Basic);
        assert_eq!(result, Err(AuthenticationFailure::BadCredentials));
    }

    #[test]
    fn test_authentication_principal_access() {
        let principal =
            Principal::new("team-a", AuthenticationMethod::BearerToken).expect("valid principal");
        let authenticated = Authentication::Authenticated(principal.clone());

        assert!(authenticated.is_authenticated());
        assert_eq!(authenticated.principal(), Some(&principal));
        assert!(!Authentication::Anonymous.is_authenticated());
        assert_eq!(Authentication::Anonymous.principal(), None);
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let basic = Credentials::UsernamePassword {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let bearer = Credentials::BearerToken("secret.token.value".to_string());

        let basic_debug = format!("{basic:?}");
        assert!(basic_debug.contains("admin"));
        assert!(!basic_debug.contains("hunter2"));
        assert!(!format!("{bearer:?}").contains("secret.token.value"));
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(AuthenticationFailure::BadCredentials.to_string(), "bad credentials");
        assert_eq!(
            AuthenticationFailure::InvalidToken("JWT has expired".to_string()).to_string(),
            "invalid token: JWT has expired"
        );
        assert_eq!(
            AuthenticationFailure::ProviderNotFound.to_string(),
            "no authentication provider supports these credentials"
        );
    }
}

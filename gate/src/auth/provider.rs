//! Authentication providers and the manager that dispatches to them.
//!
//! # Pre-conditions
//! - Providers are registered once at startup.
//!
//! # Post-conditions
//! - `AuthenticationManager::authenticate` consults exactly one provider: the
//!   first registered one that supports the credentials.
//!
//! # Invariants
//! - Providers and the manager are immutable and `Send + Sync`.

use std::collections::HashMap;
use std::sync::Arc;

use super::jwt::{JwtConfig, verify_token};
use super::{
    AuthenticationFailure, AuthenticationMethod, Credentials, PasswordEncoder, PasswordError,
    Principal,
};

/// A pluggable authentication mechanism.
pub trait AuthenticationProvider: Send + Sync {
    /// Whether this provider understands the given kind of credentials.
    fn supports(&self, credentials: &Credentials) -> bool;

    /// Authenticate the credentials.
    ///
    /// Only called with credentials for which `supports` returned true.
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthenticationFailure>;
}

/// Ordered list of providers.
#[derive(Clone, Default)]
pub struct AuthenticationManager {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
}

impl AuthenticationManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Earlier providers take precedence.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn AuthenticationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// # Errors
    /// Returns `AuthenticationFailure::ProviderNotFound` if no provider
    /// supports the credentials, or the supporting provider's failure.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthenticationFailure> {
        let provider = self
            .providers
            .iter()
            .find(|provider| provider.supports(credentials))
            .ok_or(AuthenticationFailure::ProviderNotFound)?;
        provider.authenticate(credentials)
    }
}

impl std::fmt::Debug for AuthenticationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationManager")
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// Authenticates bearer tokens.
#[derive(Debug, Clone)]
pub struct JwtAuthenticationProvider {
    config: JwtConfig,
}

impl JwtAuthenticationProvider {
    #[must_use]
    pub const fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl AuthenticationProvider for JwtAuthenticationProvider {
    fn supports(&self, credentials: &Credentials) -> bool {
        matches!(credentials, Credentials::BearerToken(_))
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthenticationFailure> {
        let Credentials::BearerToken(token) = credentials else {
            return Err(AuthenticationFailure::ProviderNotFound);
        };
        let subject = verify_token(token, &self.config)
            .map_err(|e| AuthenticationFailure::InvalidToken(e.to_string()))?;
        Principal::new(subject, AuthenticationMethod::BearerToken)
    }
}

/// Lookup of stored password digests.
pub trait UserStore: Send + Sync {
    /// The bcrypt digest for `username`, if the user exists.
    fn find_password_hash(&self, username: &str) -> Option<String>;
}

/// A `UserStore` backed by a map built at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, String>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        self.users.insert(username.into(), password_hash.into());
        self
    }
}

impl UserStore for InMemoryUserStore {
    fn find_password_hash(&self, username: &str) -> Option<String> {
        self.users.get(username).cloned()
    }
}

/// Plaintext behind the digest checked for unknown users.
const UNKNOWN_USER_PLAINTEXT: &str = "unknown-user";

/// Authenticates username/password pairs against a `UserStore`.
///
/// Unknown users are checked against a placeholder digest of the same cost,
/// so both failures spend the same bcrypt work.
pub struct PasswordAuthenticationProvider {
    users: Arc<dyn UserStore>,
    encoder: PasswordEncoder,
    unknown_user_digest: String,
}

impl PasswordAuthenticationProvider {
    /// # Errors
    /// Returns `PasswordError` if the placeholder digest cannot be computed.
    pub fn new(users: Arc<dyn UserStore>, encoder: PasswordEncoder) -> Result<Self, PasswordError> {
        let unknown_user_digest = encoder.hash(UNKNOWN_USER_PLAINTEXT)?;
        Ok(Self {
            users,
            encoder,
            unknown_user_digest,
        })
    }
}

impl AuthenticationProvider for PasswordAuthenticationProvider {
    fn supports(&self, credentials: &Credentials) -> bool {
        matches!(credentials, Credentials::UsernamePassword { .. })
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthenticationFailure> {
        let Credentials::UsernamePassword { username, password } = credentials else {
            return Err(AuthenticationFailure::ProviderNotFound);
        };
        let Some(digest) = self.users.find_password_hash(username) else {
            // Result ignored; the work matches a wrong-password check.
            let _ = self.encoder.verify(password, &self.unknown_user_digest);
            return Err(AuthenticationFailure::BadCredentials);
        };
        if !self.encoder.verify(password, &digest) {
            return Err(AuthenticationFailure::BadCredentials);
        }
        if self.encoder.needs_rehash(&digest) {
            tracing::info!(username = %username, "stored password digest uses a weaker cost than configured");
        }
        Principal::new(username.clone(), AuthenticationMethod::Basic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::auth::jwt::tests::{TEST_SECRET, create_hs512_token};
    use crate::auth::password::MIN_COST;

    fn jwt_provider() -> Arc<dyn AuthenticationProvider> {
        Arc::new(JwtAuthenticationProvider::new(
            JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret"),
        ))
    }

    fn password_provider() -> Arc<dyn AuthenticationProvider> {
        let encoder = PasswordEncoder::new(MIN_COST).expect("valid cost");
        let store = InMemoryUserStore::new()
            .with_user("admin", encoder.hash("s3cret").expect("hash succeeds"));
        Arc::new(PasswordAuthenticationProvider::new(Arc::new(store), encoder).expect("provider builds"))
    }

    fn basic(username: &str, password: &str) -> Credentials {
        Credentials::UsernamePassword {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_jwt_provider_authenticates_subject() {
        let manager = AuthenticationManager::new().with_provider(jwt_provider());
        let token = create_hs512_token("team-a", TEST_SECRET);

        let principal = manager
            .authenticate(&Credentials::BearerToken(token))
            .expect("valid token");
        assert_eq!(principal.name(), "team-a");
        assert_eq!(principal.method(), AuthenticationMethod::BearerToken);
    }

    #[test]
    fn test_jwt_provider_rejects_bad_token() {
        let manager = AuthenticationManager::new().with_provider(jwt_provider());
        let result = manager.authenticate(&Credentials::BearerToken("garbage".to_string()));

        assert_eq!(
            result,
            Err(AuthenticationFailure::InvalidToken("malformed JWT".to_string()))
        );
    }

    #[test]
    fn test_basic_credentials_without_password_provider() {
        let manager = AuthenticationManager::new().with_provider(jwt_provider());

        assert_eq!(
            manager.authenticate(&basic("admin", "s3cret")),
            Err(AuthenticationFailure::ProviderNotFound)
        );
    }

    #[test]
    fn test_password_provider() {
        let manager = AuthenticationManager::new()
            .with_provider(jwt_provider())
            .with_provider(password_provider());

        let principal = manager
            .authenticate(&basic("admin", "s3cret"))
            .expect("correct password");
        assert_eq!(principal.name(), "admin");
        assert_eq!(principal.method(), AuthenticationMethod::Basic);

        assert_eq!(
            manager.authenticate(&basic("admin", "wrong")),
            Err(AuthenticationFailure::BadCredentials)
        );
        assert_eq!(
            manager.authenticate(&basic("nobody", "s3cret")),
            Err(AuthenticationFailure::BadCredentials)
        );
    }

    #[test]
    fn test_unknown_user_costs_a_bcrypt_check() {
        // Cost high enough that a skipped check is orders of magnitude faster.
        let encoder = PasswordEncoder::new(8).expect("valid cost");
        let store = InMemoryUserStore::new()
            .with_user("admin", encoder.hash("s3cret").expect("hash succeeds"));
        let provider = PasswordAuthenticationProvider::new(Arc::new(store), encoder)
            .expect("provider builds");

        let fastest = |credentials: &Credentials| {
            (0..3)
                .map(|_| {
                    let started = Instant::now();
                    assert_eq!(
                        provider.authenticate(credentials),
                        Err(AuthenticationFailure::BadCredentials)
                    );
                    started.elapsed()
                })
                .min()
                .expect("three runs")
        };

        let wrong_password = fastest(&basic("admin", "nope"));
        let unknown_user = fastest(&basic("nobody", "nope"));
        assert!(
            unknown_user * 4 >= wrong_password,
            "unknown user took {unknown_user:?}, wrong password {wrong_password:?}"
        );
    }

    #[test]
    fn test_unknown_user_digest_matches_encoder_cost() {
        let encoder = PasswordEncoder::new(MIN_COST).expect("valid cost");
        let provider = PasswordAuthenticationProvider::new(Arc::new(InMemoryUserStore::new()), encoder)
            .expect("provider builds");

        assert!(!encoder.needs_rehash(&provider.unknown_user_digest));
        assert!(encoder.verify(UNKNOWN_USER_PLAINTEXT, &provider.unknown_user_digest));
        // The placeholder plaintext is not a way in.
        assert_eq!(
            provider.authenticate(&basic("nobody", UNKNOWN_USER_PLAINTEXT)),
            Err(AuthenticationFailure::BadCredentials)
        );
    }

    #[test]
    fn test_first_supporting_provider_wins() {
        struct Fixed(&'static str);

        impl AuthenticationProvider for Fixed {
            fn supports(&self, _credentials: &Credentials) -> bool {
                true
            }

            fn authenticate(&self, _credentials: &Credentials) -> Result<Principal, AuthenticationFailure> {
                Principal::new(self.0, AuthenticationMethod::Basic)
            }
        }

        let manager = AuthenticationManager::new()
            .with_provider(Arc::new(Fixed("first")))
            .with_provider(Arc::new(Fixed("second")));

        let principal = manager.authenticate(&basic("x", "y")).expect("authenticated");
        assert_eq!(principal.name(), "first");
        assert_eq!(manager.provider_count(), 2);
    }

    #[test]
    fn test_empty_manager() {
        let manager = AuthenticationManager::new();
        assert_eq!(
            manager.authenticate(&Credentials::BearerToken("t".to_string())),
            Err(AuthenticationFailure::ProviderNotFound)
        );
    }
}

//! JWT verification.
//!
//! Verifies bearer tokens signed with HS256, HS512 or RS256 and extracts the
//! subject they were issued to.
//!
//! # Pre-conditions
//! - For HMAC algorithms: the secret must be non-empty.
//! - For RS256: the public key must be a valid PEM-encoded RSA public key.
//!
//! # Post-conditions
//! - On success, returns the subject from the 'sub' claim.
//! - Tokens without an 'exp' claim, or past it, are rejected.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims read from a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// Subject the token was issued to.
    pub(crate) sub: String,
    /// Expiry as seconds since the Unix epoch.
    pub(crate) exp: u64,
}

/// Error returned when JWT configuration is invalid.
#[derive(Debug)]
pub enum JwtConfigError {
    /// The HMAC secret is empty.
    EmptySecret,
    /// The RS256 public key is not a valid PEM-encoded RSA public key.
    InvalidRs256PublicKey(String),
}

impl std::fmt::Display for JwtConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HMAC secret must not be empty"),
            Self::InvalidRs256PublicKey(reason) => {
                write!(f, "invalid RS256 public key: {reason}")
            }
        }
    }
}

impl std::error::Error for JwtConfigError {}

/// Key material used to verify bearer tokens.
#[derive(Clone)]
pub enum JwtConfig {
    /// HMAC-SHA256 with a shared secret.
    Hs256 { secret: Vec<u8> },
    /// HMAC-SHA512 with a shared secret.
    Hs512 { secret: Vec<u8> },
    /// RSA-SHA256 with a PEM-encoded public key.
    Rs256 { public_key: String },
}

impl JwtConfig {
    /// # Errors
    /// Returns `JwtConfigError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: Vec<u8>) -> Result<Self, JwtConfigError> {
        if secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }
        Ok(Self::Hs256 { secret })
    }

    /// # Errors
    /// Returns `JwtConfigError::EmptySecret` if the secret is empty.
    pub fn new_hs512(secret: Vec<u8>) -> Result<Self, JwtConfigError> {
        if secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }
        Ok(Self::Hs512 { secret })
    }

    /// # Errors
    /// Returns `JwtConfigError::InvalidRs256PublicKey` if the key does not parse.
    pub fn new_rs256(public_key: String) -> Result<Self, JwtConfigError> {
        DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| JwtConfigError::InvalidRs256PublicKey(e.to_string()))?;

        Ok(Self::Rs256 { public_key })
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hs256 { .. } => Algorithm::HS256,
            Self::Hs512 { .. } => Algorithm::HS512,
            Self::Rs256 { .. } => Algorithm::RS256,
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, JwtError> {
        match self {
            Self::Hs256 { secret } | Self::Hs512 { secret } => {
                if secret.is_empty() {
                    return Err(JwtError::InvalidKey("secret must be non-empty".to_string()));
                }
                Ok(DecodingKey::from_secret(secret))
            }
            Self::Rs256 { public_key } => DecodingKey::from_rsa_pem(public_key.as_bytes())
                .map_err(|e| JwtError::InvalidKey(e.to_string())),
        }
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Error returned when JWT verification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// The JWT signature is invalid.
    InvalidSignature,
    /// The JWT has expired.
    TokenExpired,
    /// The JWT is malformed or cannot be parsed.
    MalformedToken,
    /// The 'sub' claim is missing or empty.
    MissingSubClaim,
    /// The decoding key could not be created from the configuration.
    InvalidKey(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid JWT signature"),
            Self::TokenExpired => write!(f, "JWT has expired"),
            Self::MalformedToken => write!(f, "malformed JWT"),
            Self::MissingSubClaim => write!(f, "missing 'sub' claim in JWT"),
            Self::InvalidKey(reason) => write!(f, "invalid key: {reason}"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Verifies a JWT and returns its subject.
///
/// # Errors
/// Returns `JwtError` if verification fails for any reason.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<String, JwtError> {
    let key = config.decoding_key()?;
    let mut validation = Validation::new(config.algorithm());
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(map_jwt_error)?;

    let subject = token_data.claims.sub;
    if subject.is_empty() {
        return Err(JwtError::MissingSubClaim);
    }
    Ok(subject)
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => JwtError::MissingSubClaim,
        _ => JwtError::MalformedToken,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};

    pub(crate) const TEST_SECRET: &[u8] = b"test-secret-key-that-is-long-enough";

    pub(crate) fn create_token(algorithm: Algorithm, sub: &str, secret: &[u8], exp: u64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
        };
        encode(&Header::new(algorithm), &claims, &EncodingKey::from_secret(secret))
            .expect("failed to create test token")
    }

    pub(crate) fn create_hs512_token(sub: &str, secret: &[u8]) -> String {
        create_token(Algorithm::HS512, sub, secret, get_current_timestamp() + 3600)
    }

    #[test]
    fn test_verify_hs512_valid_token() {
        let token = create_hs512_token("team-123", TEST_SECRET);
        let config = JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret");

        assert_eq!(verify_token(&token, &config), Ok("team-123".to_string()));
    }

    #[test]
    fn test_verify_hs256_valid_token() {
        let token = create_token(
            Algorithm::HS256,
            "team-456",
            TEST_SECRET,
            get_current_timestamp() + 3600,
        );
        let config = JwtConfig::new_hs256(TEST_SECRET.to_vec()).expect("valid secret");

        assert_eq!(verify_token(&token, &config), Ok("team-456".to_string()));
    }

    #[test]
    fn test_verify_invalid_signature() {
        let token = create_hs512_token("team-123", TEST_SECRET);
        let config =
            JwtConfig::new_hs512(b"wrong-secret-key-that-is-different".to_vec()).expect("valid");

        assert_eq!(verify_token(&token, &config), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_verify_algorithm_mismatch_is_rejected() {
        let token = create_token(
            Algorithm::HS256,
            "team-123",
            TEST_SECRET,
            get_current_timestamp() + 3600,
        );
        let config = JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret");

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_verify_expired_token() {
        let token = create_token(
            Algorithm::HS512,
            "team-123",
            TEST_SECRET,
            get_current_timestamp() - 3600,
        );
        let config = JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret");

        assert_eq!(verify_token(&token, &config), Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_verify_malformed_and_empty_token() {
        let config = JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret");

        assert_eq!(verify_token("not-a-valid-jwt", &config), Err(JwtError::MalformedToken));
        assert_eq!(verify_token("", &config), Err(JwtError::MalformedToken));
    }

    #[test]
    fn test_verify_empty_sub_claim() {
        let token = create_hs512_token("", TEST_SECRET);
        let config = JwtConfig::new_hs512(TEST_SECRET.to_vec()).expect("valid secret");

        assert_eq!(verify_token(&token, &config), Err(JwtError::MissingSubClaim));
    }

    #[test]
    fn test_verify_with_empty_secret_variant() {
        let config = JwtConfig::Hs512 { secret: vec![] };
        match verify_token("some.jwt.token", &config) {
            Err(JwtError::InvalidKey(message)) => assert_eq!(message, "secret must be non-empty"),
            other => panic!("expected InvalidKey error, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rs256_invalid_key() {
        let config = JwtConfig::Rs256 {
            public_key: "not-a-valid-pem-key".to_string(),
        };
        assert!(matches!(
            verify_token("some.jwt.token", &config),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_config_constructors_validate() {
        assert!(matches!(
            JwtConfig::new_hs256(Vec::new()),
            Err(JwtConfigError::EmptySecret)
        ));
        assert!(matches!(
            JwtConfig::new_hs512(Vec::new()),
            Err(JwtConfigError::EmptySecret)
        ));
        assert!(matches!(
            JwtConfig::new_rs256("-----BEGIN PUBLIC KEY-----\nMIIBIjAN...\n-----END PUBLIC KEY-----".to_string()),
            Err(JwtConfigError::InvalidRs256PublicKey(_))
        ));
        assert!(matches!(
            JwtConfig::new_rs256(String::new()),
            Err(JwtConfigError::InvalidRs256PublicKey(_))
        ));
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let config = JwtConfig::new_hs512(b"super-secret".to_vec()).expect("valid secret");
        let debug = format!("{config:?}");

        assert!(debug.contains("HS512"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(JwtError::InvalidSignature.to_string(), "invalid JWT signature");
        assert_eq!(JwtError::TokenExpired.to_string(), "JWT has expired");
        assert_eq!(JwtError::MalformedToken.to_string(), "malformed JWT");
        assert_eq!(JwtError::MissingSubClaim.to_string(), "missing 'sub' claim in JWT");
        assert_eq!(
            JwtError::InvalidKey("bad key".to_string()).to_string(),
            "invalid key: bad key"
        );
        assert_eq!(JwtConfigError::EmptySecret.to_string(), "HMAC secret must not be empty");
    }
}

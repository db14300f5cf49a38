//! Gate configuration module.
//!
//! This module loads the gate's configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `GATE_REQUIRE_HTTPS`: Redirect plaintext requests to https (default: `false`)
//! - `GATE_JWT_ALGORITHM`: `HS256`, `HS512` or `RS256` (default: `HS512`)
//! - `GATE_JWT_SECRET`: Token signing secret (required for HMAC algorithms)
//! - `GATE_JWT_PUBLIC_KEY`: PEM public key (required for `RS256`)
//! - `GATE_LISTEN_PORT`: Port to listen on (default: `8080`)
//! - `GATE_BCRYPT_COST`: bcrypt work factor (default: `10`)
//! - `GATE_TRUST_FORWARDED_PROTO`: Honour `X-Forwarded-Proto` (default: `true`)
//! - `GATE_BASIC_USERNAME` / `GATE_BASIC_PASSWORD_HASH`: Optional basic-auth
//!   user; both or neither must be set
//!
//! # Invariants
//!
//! - `jwt` always holds usable key material
//! - `bcrypt_cost` is always within bcrypt's supported range

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use crate::auth::{JwtConfig, PasswordEncoder};

pub const REQUIRE_HTTPS: &str = "GATE_REQUIRE_HTTPS";
pub const JWT_ALGORITHM: &str = "GATE_JWT_ALGORITHM";
pub const JWT_SECRET: &str = "GATE_JWT_SECRET";
pub const JWT_PUBLIC_KEY: &str = "GATE_JWT_PUBLIC_KEY";
pub const LISTEN_PORT: &str = "GATE_LISTEN_PORT";
pub const BCRYPT_COST: &str = "GATE_BCRYPT_COST";
pub const TRUST_FORWARDED_PROTO: &str = "GATE_TRUST_FORWARDED_PROTO";
pub const BASIC_USERNAME: &str = "GATE_BASIC_USERNAME";
pub const BASIC_PASSWORD_HASH: &str = "GATE_BASIC_PASSWORD_HASH";

/// A user allowed to authenticate with basic credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicUser {
    pub username: String,
    /// bcrypt digest of the user's password.
    pub password_hash: String,
}

/// Gate configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` every field has been validated; a
/// misconfigured process never gets a `GateConfig`.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Redirect plaintext requests to https.
    pub require_https: bool,
    /// Key material for verifying bearer tokens.
    pub jwt: JwtConfig,
    /// Port to listen on.
    pub listen_port: u16,
    /// bcrypt work factor for the password encoder.
    pub bcrypt_cost: u32,
    /// Treat `X-Forwarded-Proto: https` as an encrypted request.
    pub trust_forwarded_proto: bool,
    /// Optional basic-auth user.
    pub basic_user: Option<BasicUser>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn invalid(name: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.into(),
    }
}

impl GateConfig {
    /// Default port for the gate.
    pub const DEFAULT_PORT: u16 = 8080;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any variable
    /// holds a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Same as `from_env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            require_https: load_bool(&lookup, REQUIRE_HTTPS, false)?,
            jwt: load_jwt(&lookup)?,
            listen_port: load_listen_port(&lookup)?,
            bcrypt_cost: load_bcrypt_cost(&lookup)?,
            trust_forwarded_proto: load_bool(&lookup, TRUST_FORWARDED_PROTO, true)?,
            basic_user: load_basic_user(&lookup)?,
        })
    }

    /// The password encoder described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost is out of range, which `from_lookup`
    /// already rules out.
    pub fn password_encoder(&self) -> Result<PasswordEncoder, ConfigError> {
        PasswordEncoder::new(self.bcrypt_cost).map_err(|e| invalid(BCRYPT_COST, e.to_string()))
    }
}

fn load_bool<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(name, format!("'{value}' is not a boolean"))),
    }
}

fn load_jwt<F>(lookup: &F) -> Result<JwtConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let algorithm = lookup(JWT_ALGORITHM).unwrap_or_else(|| "HS512".to_string());
    let require = |name: &str| {
        lookup(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
    };

    match algorithm.to_ascii_uppercase().as_str() {
        "HS256" => JwtConfig::new_hs256(require(JWT_SECRET)?.into_bytes())
            .map_err(|e| invalid(JWT_SECRET, e.to_string())),
        "HS512" => JwtConfig::new_hs512(require(JWT_SECRET)?.into_bytes())
            .map_err(|e| invalid(JWT_SECRET, e.to_string())),
        "RS256" => JwtConfig::new_rs256(require(JWT_PUBLIC_KEY)?)
            .map_err(|e| invalid(JWT_PUBLIC_KEY, e.to_string())),
        _ => Err(invalid(
            JWT_ALGORITHM,
            format!("'{algorithm}' is not one of HS256, HS512, RS256"),
        )),
    }
}

fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(LISTEN_PORT) {
        Some(value) => match value.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(invalid(
                LISTEN_PORT,
                format!("'{value}' is not a valid port number (must be 1-65535)"),
            )),
        },
        None => Ok(GateConfig::DEFAULT_PORT),
    }
}

fn load_bcrypt_cost<F>(lookup: &F) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(BCRYPT_COST) {
        Some(value) => match value.parse::<u32>() {
            Ok(cost) if (MIN_COST..=MAX_COST).contains(&cost) => Ok(cost),
            _ => Err(invalid(
                BCRYPT_COST,
                format!("'{value}' is not a cost between {MIN_COST} and {MAX_COST}"),
            )),
        },
        None => Ok(DEFAULT_COST),
    }
}

fn load_basic_user<F>(lookup: &F) -> Result<Option<BasicUser>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match (lookup(BASIC_USERNAME), lookup(BASIC_PASSWORD_HASH)) {
        (None, None) => Ok(None),
        (Some(username), Some(password_hash)) => {
            if username.is_empty() {
                return Err(invalid(BASIC_USERNAME, "must not be empty"));
            }
            if !password_hash.starts_with("$2") {
                return Err(invalid(BASIC_PASSWORD_HASH, "must be a bcrypt digest"));
            }
            Ok(Some(BasicUser {
                username,
                password_hash,
            }))
        }
        (Some(_), None) => Err(ConfigError::MissingEnvVar(BASIC_PASSWORD_HASH.to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar(BASIC_USERNAME.to_string())),
    }
}

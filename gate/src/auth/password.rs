//! Password hashing with bcrypt.
//!
//! # Pre-conditions
//! - The work factor must be within bcrypt's supported range (4..=31).
//!
//! # Post-conditions
//! - Every digest carries its own random salt and cost, so hashing the same
//!   plaintext twice yields different digests.
//! - Plaintexts longer than bcrypt's 72-byte input are refused, never cut.
//!
//! # Invariants
//! - The encoder holds no mutable state and is safe to share across tasks.

/// Default bcrypt work factor.
pub const DEFAULT_COST: u32 = 10;
/// Smallest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Largest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Longest plaintext bcrypt reads.
pub const MAX_PLAINTEXT_BYTES: usize = 72;

/// Error returned when a password cannot be hashed.
#[derive(Debug)]
pub enum PasswordError {
    /// The configured cost is outside `MIN_COST..=MAX_COST`.
    InvalidCost(u32),
    /// The underlying bcrypt primitive failed.
    Hashing(bcrypt::BcryptError),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCost(cost) => {
                write!(f, "bcrypt cost {cost} is outside {MIN_COST}..={MAX_COST}")
            }
            Self::Hashing(e) => write!(f, "password hashing failed: {e}"),
        }
    }
}

impl std::error::Error for PasswordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hashing(e) => Some(e),
            Self::InvalidCost(_) => None,
        }
    }
}

/// One-way adaptive password encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordEncoder {
    cost: u32,
}

impl PasswordEncoder {
    /// Create an encoder with the given bcrypt cost.
    ///
    /// # Errors
    /// Returns `PasswordError::InvalidCost` if `cost` is out of range.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password into a bcrypt digest.
    ///
    /// # Errors
    /// Returns `PasswordError::Hashing` if bcrypt fails, including for
    /// plaintexts longer than `MAX_PLAINTEXT_BYTES`.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::non_truncating_hash(plaintext, self.cost).map_err(PasswordError::Hashing)
    }

    /// Check a plaintext against a digest.
    ///
    /// An empty or malformed digest never matches, and neither does a
    /// plaintext longer than `MAX_PLAINTEXT_BYTES`.
    #[must_use]
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        if digest.is_empty() {
            tracing::warn!("empty password digest");
            return false;
        }
        match bcrypt::non_truncating_verify(plaintext, digest) {
            Ok(matches) => matches,
            Err(bcrypt::BcryptError::Truncation(len)) => {
                tracing::debug!(len, "plaintext exceeds bcrypt input length");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "password digest does not look like bcrypt");
                false
            }
        }
    }

    /// Whether a digest was produced with a lower cost than this encoder's.
    #[must_use]
    pub fn needs_rehash(&self, digest: &str) -> bool {
        digest_cost(digest).is_none_or(|cost| cost < self.cost)
    }
}

impl Default for PasswordEncoder {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

/// Read the cost field of a `$2x$NN$...` digest.
fn digest_cost(digest: &str) -> Option<u32> {
    let mut parts = digest.split('$');
    // Leading empty segment before the first '$'.
    if !parts.next()?.is_empty() {
        return None;
    }
    let version = parts.next()?;
    if !version.starts_with('2') {
        return None;
    }
    parts.next()?.parse().ok()
}

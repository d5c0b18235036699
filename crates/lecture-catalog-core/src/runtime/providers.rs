// crates/lecture-catalog-core/src/runtime/providers.rs
// ============================================================================
// Module: Lecture Catalog Default Providers
// Description: Clock, identifier, and password hash implementations.
// Purpose: Provide production defaults and deterministic test doubles.
// Dependencies: hex, sha2, subtle, uuid
// ============================================================================

//! ## Overview
//! [`SystemClock`], [`UuidGenerator`], and [`Sha256PasswordHasher`] are the
//! production defaults. [`FixedClock`] and [`SequentialIdGenerator`] give
//! tests reproducible timestamps and identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::core::UnixMillis;
use crate::interfaces::Clock;
use crate::interfaces::IdGenerator;
use crate::interfaces::PasswordHasher;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixMillis {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        UnixMillis::new(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    /// Current instant in milliseconds.
    now: AtomicI64,
}

impl FixedClock {
    /// Creates a clock pinned at `now`.
    #[must_use]
    pub const fn new(now: UnixMillis) -> Self {
        Self {
            now: AtomicI64::new(now.as_i64()),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: UnixMillis) {
        self.now.store(now.as_i64(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UnixMillis {
        UnixMillis::new(self.now.load(Ordering::SeqCst))
    }
}

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable `prefix-000001` identifiers for tests.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    /// Prefix applied to every identifier.
    prefix: String,
    /// Next sequence value.
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let value = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{value:06}", self.prefix)
    }
}

// ============================================================================
// SECTION: Password Hashing
// ============================================================================

/// Scheme tag prefixed to stored hashes.
const SHA256_SCHEME: &str = "sha256";

/// Salted SHA-256 password hashes in `sha256$salt$hex` form.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256PasswordHasher;

impl Sha256PasswordHasher {
    /// Computes the hex digest for a salt and password.
    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, password);
        format!("{SHA256_SCHEME}${salt}${digest}")
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let mut parts = stored_hash.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SHA256_SCHEME {
            return false;
        }
        let actual = Self::digest(salt, password);
        actual.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::FixedClock;
    use super::SequentialIdGenerator;
    use super::Sha256PasswordHasher;
    use crate::core::UnixMillis;
    use crate::interfaces::Clock;
    use crate::interfaces::IdGenerator;
    use crate::interfaces::PasswordHasher;

    #[test]
    fn hashes_are_salted_and_verify() {
        let hasher = Sha256PasswordHasher;
        let first = hasher.hash("secret");
        let second = hasher.hash("secret");
        assert_ne!(first, second);
        assert!(hasher.verify("secret", &first));
        assert!(!hasher.verify("Secret", &first));
        assert!(!hasher.verify("secret", "plain-text"));
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(UnixMillis::new(1_000));
        clock.advance(500);
        assert_eq!(clock.now(), UnixMillis::new(1_500));
    }

    #[test]
    fn sequential_ids_are_ordered() {
        let ids = SequentialIdGenerator::new("lec");
        assert_eq!(ids.next_id(), "lec-000001");
        assert_eq!(ids.next_id(), "lec-000002");
    }
}

// src/utils/codes.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::AppError;

/// How long an issued code stays valid.
pub const CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Namespace for an issued code. Signup and password-reset codes live in
/// disjoint namespaces: a leaked signup code can never satisfy a reset check,
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePurpose {
    Signup,
    PasswordReset,
}

#[derive(Debug)]
struct IssuedCode {
    code: String,
    expires_at: Instant,
}

/// Process-wide registry of pending email codes.
///
/// At most one live code exists per (email, purpose); issuing again
/// overwrites the previous one. `consume` checks and removes the entry under
/// a single lock, so two concurrent consumers can never both succeed on the
/// same code. Expiry is lazy: entries past their TTL are dropped when a
/// consume attempt finds them, not by a background sweep.
#[derive(Clone)]
pub struct CodeRegistry {
    inner: Arc<Mutex<HashMap<(String, CodePurpose), IssuedCode>>>,
    ttl: Duration,
}

impl CodeRegistry {
    pub fn new() -> Self {
        Self::with_ttl(CODE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Generates a uniform random 6-digit code for (email, purpose),
    /// replacing any unexpired prior one.
    pub fn issue(&self, email: &str, purpose: CodePurpose) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let mut map = self.inner.lock().expect("code registry mutex poisoned");
        map.insert(
            (email.to_string(), purpose),
            IssuedCode {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Single-use check of a supplied code. Fails `InvalidOrExpired` when no
    /// code is live for the key, the code does not match, or the TTL has
    /// elapsed; "never issued" is indistinguishable from "wrong code".
    /// A mismatch leaves the entry in place so the right code still works.
    pub fn consume(
        &self,
        email: &str,
        purpose: CodePurpose,
        supplied: &str,
    ) -> Result<(), AppError> {
        let key = (email.to_string(), purpose);
        let mut map = self.inner.lock().expect("code registry mutex poisoned");

        let entry = map.get(&key).ok_or(AppError::InvalidOrExpired)?;

        if Instant::now() > entry.expires_at {
            map.remove(&key);
            return Err(AppError::InvalidOrExpired);
        }

        if entry.code != supplied {
            return Err(AppError::InvalidOrExpired);
        }

        map.remove(&key);
        Ok(())
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_is_six_digits() {
        let registry = CodeRegistry::new();
        let code = registry.issue("a@x.com", CodePurpose::Signup);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn consume_succeeds_once_then_fails() {
        let registry = CodeRegistry::new();
        let code = registry.issue("a@x.com", CodePurpose::Signup);
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_ok());
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_err());
    }

    #[test]
    fn wrong_code_fails_and_right_code_still_works() {
        let registry = CodeRegistry::new();
        let code = registry.issue("a@x.com", CodePurpose::Signup);
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(registry.consume("a@x.com", CodePurpose::Signup, wrong).is_err());
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_ok());
    }

    #[test]
    fn reissue_overwrites_previous_code() {
        let registry = CodeRegistry::new();
        let first = registry.issue("a@x.com", CodePurpose::Signup);
        let second = registry.issue("a@x.com", CodePurpose::Signup);
        if first != second {
            assert!(registry.consume("a@x.com", CodePurpose::Signup, &first).is_err());
        }
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &second).is_ok());
    }

    #[test]
    fn purposes_are_disjoint() {
        let registry = CodeRegistry::new();
        let code = registry.issue("a@x.com", CodePurpose::Signup);
        assert!(
            registry
                .consume("a@x.com", CodePurpose::PasswordReset, &code)
                .is_err()
        );
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_ok());
    }

    #[test]
    fn expired_code_always_fails() {
        let registry = CodeRegistry::with_ttl(Duration::from_millis(1));
        let code = registry.issue("a@x.com", CodePurpose::Signup);
        std::thread::sleep(Duration::from_millis(10));
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_err());
        // The expired entry is gone; the correct code cannot be replayed.
        assert!(registry.consume("a@x.com", CodePurpose::Signup, &code).is_err());
    }

    #[test]
    fn concurrent_consumers_exactly_one_succeeds() {
        let registry = CodeRegistry::new();
        let code = registry.issue("race@x.com", CodePurpose::Signup);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let code = code.clone();
                std::thread::spawn(move || {
                    registry
                        .consume("race@x.com", CodePurpose::Signup, &code)
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1);
    }
}

//! Password reset code rules.

use chrono::{DateTime, Duration, Utc};

/// Number of digits in a reset code.
pub const RESET_CODE_DIGITS: usize = 4;

/// How long a reset code stays valid.
#[must_use]
pub fn reset_code_ttl() -> Duration {
    Duration::minutes(10)
}

/// Why a submitted reset code was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRejection {
    #[error("Invalid reset code")]
    InvalidCode,
    #[error("Reset code already used")]
    AlreadyUsed,
    #[error("Reset code expired")]
    Expired,
}

/// A stored reset code, as loaded for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetCodeState {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl ResetCodeState {
    /// Check a submitted code against this record.
    ///
    /// # Errors
    ///
    /// [`ResetRejection::InvalidCode`] on mismatch, then
    /// [`ResetRejection::AlreadyUsed`], then [`ResetRejection::Expired`].
    pub fn check(&self, submitted: &str, now: DateTime<Utc>) -> Result<(), ResetRejection> {
        if !codes_match(&self.code, submitted.trim()) {
            return Err(ResetRejection::InvalidCode);
        }
        if self.used {
            return Err(ResetRejection::AlreadyUsed);
        }
        if now >= self.expires_at {
            return Err(ResetRejection::Expired);
        }
        Ok(())
    }
}

/// Whether a string has the shape of a reset code.
#[must_use]
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == RESET_CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

fn codes_match(expected: &str, submitted: &str) -> bool {
    if expected.len() != submitted.len() {
        return false;
    }
    expected
        .bytes()
        .zip(submitted.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

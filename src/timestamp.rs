//! Timestamp randomization for gift wraps.
//!
//! A gift wrap's `created_at` is drawn uniformly from `[now - max_age, now]`
//! so relay observers cannot correlate it with the real send time.

use std::time::{SystemTime, UNIX_EPOCH};

use getrandom::getrandom;

use crate::error::{Error, Result};

/// Two days.
pub const DEFAULT_MAX_AGE_SECS: u64 = 2 * 24 * 60 * 60;

/// Clock skew tolerated into the future when validating.
pub const DEFAULT_FUTURE_SKEW_SECS: u64 = 60;

pub fn now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| Error::TimestampRandomizationFailed("system clock before unix epoch"))
}

/// `now - uniform(0, max_age)`.
pub fn randomized(max_age_secs: u64) -> Result<u64> {
    randomized_at(now()?, max_age_secs)
}

pub fn randomized_at(now: u64, max_age_secs: u64) -> Result<u64> {
    let mut bytes = [0u8; 4];
    getrandom(&mut bytes).map_err(|_| Error::Randomness)?;
    let unit = u32::from_be_bytes(bytes) as f64 / (u32::MAX as f64 + 1.0);
    let offset = ((unit * max_age_secs as f64) as u64).min(max_age_secs);
    Ok(now.saturating_sub(offset))
}

/// `now - max_age <= ts <= now + 60`.
pub fn validate(ts: u64, max_age_secs: u64) -> bool {
    match now() {
        Ok(now) => validate_at(ts, now, max_age_secs, DEFAULT_FUTURE_SKEW_SECS),
        Err(_) => false,
    }
}

pub fn validate_at(ts: u64, now: u64, max_age_secs: u64, future_skew_secs: u64) -> bool {
    ts >= now.saturating_sub(max_age_secs) && ts <= now.saturating_add(future_skew_secs)
}

/// Bits of timing entropy the jitter window provides (informational).
pub fn entropy_bits(max_age_secs: u64) -> f64 {
    if max_age_secs == 0 {
        return 0.0;
    }
    (max_age_secs as f64).log2()
}

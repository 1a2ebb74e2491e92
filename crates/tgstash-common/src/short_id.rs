//! Short public file identifiers.
//!
//! Ids are 16 characters drawn from `[A-Za-z0-9]` (about 95 bits of entropy),
//! short enough for hand-shared links and safe in any URL position.

use rand::TryRngCore;
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of every generated id.
pub const SHORT_ID_LEN: usize = 16;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Largest multiple of 62 that fits in a byte; bytes at or above it are rejected to avoid bias.
const UNBIASED_LIMIT: u8 = 248;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new random id from the OS CSPRNG.
///
/// Falls back to a timestamp-derived id if the OS random source is unavailable.
pub fn generate() -> String {
    match from_os_rng() {
        Some(id) => id,
        None => {
            tracing::warn!("OS random source unavailable, using timestamp id");
            from_timestamp()
        }
    }
}

fn from_os_rng() -> Option<String> {
    let mut id = String::with_capacity(SHORT_ID_LEN);
    let mut buf = [0u8; 32];
    while id.len() < SHORT_ID_LEN {
        OsRng.try_fill_bytes(&mut buf).ok()?;
        id.extend(
            buf.iter()
                .filter(|&&b| b < UNBIASED_LIMIT)
                .map(|&b| ALPHABET[usize::from(b % 62)] as char)
                .take(SHORT_ID_LEN - id.len()),
        );
    }
    Some(id)
}

fn from_timestamp() -> String {
    let millis = chrono::Utc::now().timestamp_millis().unsigned_abs();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let salt = count ^ (u64::from(std::process::id()) << 32);
    let mut id = base62(millis);
    id.push_str(&base62(salt));
    id.truncate(SHORT_ID_LEN);
    id
}

fn base62(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

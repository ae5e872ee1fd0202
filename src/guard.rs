//! Checks gating every mutation of a payload.
//!
//! Both are pure predicates and are re-evaluated on every call: the host may
//! flush a response between two logging statements, and the payload only grows.

use crate::error::LogError;

/// Ceiling for the base64 header value (240 KiB)
pub const MAX_HEADER_BYTES: usize = 240 * 1024;

/// Reject the call if the bound response already transmitted its headers
pub fn ensure_not_sent(headers_sent: bool) -> Result<(), LogError> {
    if headers_sent {
        return Err(LogError::HeadersAlreadySent);
    }
    Ok(())
}

/// Reject an encoded candidate longer than [`MAX_HEADER_BYTES`]
pub fn ensure_within_limit(encoded: &str) -> Result<(), LogError> {
    if encoded.len() > MAX_HEADER_BYTES {
        return Err(LogError::PayloadTooLarge {
            size: encoded.len(),
            limit: MAX_HEADER_BYTES,
        });
    }
    Ok(())
}

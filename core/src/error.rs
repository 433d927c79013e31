//! Error types for the MemoryKV client.
//!
//! # Design
//! A single request can fail in exactly four ways, one `RequestError` variant
//! each. Configuration failures carry every option code reported while the
//! transport was being set up; the codes are kept as an ordered list and can
//! be packed into the legacy composite integer (base [`ERR_OFFSET`], most
//! recent code in the low-order digits) for callers that still expect it.

use std::fmt;

use thiserror::Error;

/// Positional base used to pack option codes. Every code is below it.
pub const ERR_OFFSET: u64 = 100;

/// Fixed message for a transfer whose body could not be stored.
pub const ACCUMULATION_FAILED: &str = "Failed to get results from server.";

/// Fixed message for a transport handle that could not be created.
pub const TRANSPORT_INIT_FAILED: &str = "Failed to start transport.";

/// Fold `new_code` into the composite value `current`.
///
/// A zero `new_code` leaves `current` untouched. Returns `None` when the
/// result no longer fits in a `u64`.
pub fn accumulate(current: u64, new_code: u64) -> Option<u64> {
    debug_assert!(new_code < ERR_OFFSET, "option code {new_code} out of range");
    if new_code == 0 {
        return Some(current);
    }
    if current == 0 {
        return Some(new_code);
    }
    current.checked_mul(ERR_OFFSET)?.checked_add(new_code)
}

/// Decode a composite value into its codes, most recently added first,
/// joined with commas. Zero decodes to an empty string.
pub fn codes_to_string(combined: u64) -> String {
    let mut out = String::new();
    let mut rest = combined;
    while rest != 0 {
        if !out.is_empty() {
            out.push(',');
        }
        out.push_str(&(rest % ERR_OFFSET).to_string());
        rest /= ERR_OFFSET;
    }
    out
}

/// Ordered list of option codes collected while configuring a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCodes {
    codes: Vec<u8>,
}

impl ErrorCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `code`. Zero means "no error" and is ignored.
    pub fn push(&mut self, code: u8) {
        debug_assert!(u64::from(code) < ERR_OFFSET);
        if code != 0 {
            self.codes.push(code);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Codes in the order they were recorded.
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// The composite integer, or `None` if too many codes to fit in a `u64`.
    pub fn packed(&self) -> Option<u64> {
        self.codes
            .iter()
            .try_fold(0u64, |acc, &code| accumulate(acc, u64::from(code)))
    }

    /// Rebuild the list from a composite integer.
    pub fn from_packed(combined: u64) -> Self {
        let mut codes = Vec::new();
        let mut rest = combined;
        while rest != 0 {
            // always < ERR_OFFSET, so it fits in a u8
            codes.push((rest % ERR_OFFSET) as u8);
            rest /= ERR_OFFSET;
        }
        codes.reverse();
        Self { codes }
    }
}

impl fmt::Display for ErrorCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.codes.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

/// Why a single request failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// No transport handle could be created.
    #[error("Failed to start transport.")]
    TransportInit,

    /// One or more transport options were rejected; the request was not sent.
    #[error("{0}")]
    Configuration(ErrorCodes),

    /// The transfer itself failed; carries the transport's own message.
    #[error("{0}")]
    Transfer(String),

    /// The body arrived but could not be stored.
    #[error("Failed to get results from server.")]
    Accumulation,
}

/// Errors from facade helpers that look inside a response body.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("malformed key list: {0}")]
    Decode(#[from] serde_json::Error),
}

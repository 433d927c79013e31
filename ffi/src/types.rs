//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! `MemkvResult` replaces the C SDK's bool-plus-union: `result` and `error`
//! are separate pointers and exactly one of them is non-null, so reading the
//! wrong side yields null instead of garbage. `kind` says which failure
//! occurred and `error_code` carries the packed option codes for
//! configuration failures.

use std::ffi::CString;
use std::os::raw::c_char;

use memkv_core::{MemKvClient, RequestError};

/// Opaque handle to a `MemKvClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct MemkvClient {
    pub(crate) inner: MemKvClient,
}

/// What went wrong, or `Ok`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemkvErrorKind {
    Ok = 0,
    TransportInit = 1,
    Configuration = 2,
    Transfer = 3,
    Accumulation = 4,
    NullArg = 5,
    InvalidString = 6,
    Panic = 7,
}

/// Result of one key operation.
///
/// On success `success` is true, `result` holds the response body and
/// `error` is null. On failure `success` is false, `result` is null and
/// `error` is a human-readable message.
/// Release with `memkv_result_free`.
#[repr(C)]
pub struct MemkvResult {
    pub success: bool,
    pub kind: MemkvErrorKind,
    /// Packed option codes for `Configuration` failures, otherwise 0.
    pub error_code: u64,
    pub result: *mut c_char,
    pub error: *mut c_char,
}

impl MemkvResult {
    /// A result that has not succeeded yet.
    fn pending() -> Self {
        MemkvResult {
            success: false,
            kind: MemkvErrorKind::Ok,
            error_code: 0,
            result: std::ptr::null_mut(),
            error: std::ptr::null_mut(),
        }
    }

    /// Convert a core outcome into a heap-allocated `MemkvResult`.
    pub(crate) fn from_core(outcome: Result<String, RequestError>) -> *mut Self {
        let mut r = Self::pending();
        match outcome {
            Ok(body) => match CString::new(body) {
                Ok(body) => {
                    r.result = body.into_raw();
                    r.success = true;
                }
                Err(_) => {
                    return Self::failure(
                        MemkvErrorKind::InvalidString,
                        "response body contains a NUL byte",
                    )
                }
            },
            Err(err) => {
                r.kind = match &err {
                    RequestError::TransportInit => MemkvErrorKind::TransportInit,
                    RequestError::Configuration(codes) => {
                        r.error_code = codes.packed().unwrap_or(u64::MAX);
                        MemkvErrorKind::Configuration
                    }
                    RequestError::Transfer(_) => MemkvErrorKind::Transfer,
                    RequestError::Accumulation => MemkvErrorKind::Accumulation,
                };
                r.error = c_message(&err.to_string());
            }
        }
        Box::into_raw(Box::new(r))
    }

    pub(crate) fn failure(kind: MemkvErrorKind, msg: &str) -> *mut Self {
        let mut r = Self::pending();
        r.kind = kind;
        r.error = c_message(msg);
        Box::into_raw(Box::new(r))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(MemkvErrorKind::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(MemkvErrorKind::Panic, msg)
    }
}

/// NUL bytes are stripped so the conversion cannot fail.
fn c_message(msg: &str) -> *mut c_char {
    CString::new(msg.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

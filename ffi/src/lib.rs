//! C-ABI wrapper around `memkv-core`.
//!
//! # Overview
//! Exposes the MemoryKV key operations through `extern "C"` functions with
//! the same shape as the MemoryKV C SDK: create a client for a host, call
//! `memkv_get_key` and friends, inspect the returned `MemkvResult`, release
//! it with `memkv_result_free`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Each key operation is one blocking HTTP exchange; nothing is retried.
//! - Null or non-UTF-8 arguments produce a failure result, never a crash.
//! - The C caller owns all returned pointers and must call the matching
//!   `memkv_*_free` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use memkv_core::{ClientConfig, MemKvClient, RequestError};
use tracing::warn;

use types::*;

// ---------------------------------------------------------------------------
// Process setup and client lifecycle
// ---------------------------------------------------------------------------

/// Initialize process-wide transport state.
///
/// Idempotent and thread-safe. `memkv_client_new` calls it, so calling it
/// explicitly is only needed to control when the setup cost is paid.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_global_init() {
    let _ = catch_unwind(|| {
        memkv_core::global_init();
    });
}

/// Create a client bound to `host` (e.g. `"http://localhost:8080"`).
///
/// Returns null if `host` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with `memkv_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_client_new(host: *const c_char) -> *mut MemkvClient {
    new_client(host, None)
}

/// Like `memkv_client_new`, with a deadline for every request.
/// A `timeout_ms` of 0 means no deadline.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_client_new_with_timeout(
    host: *const c_char,
    timeout_ms: u64,
) -> *mut MemkvClient {
    let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
    new_client(host, timeout)
}

fn new_client(host: *const c_char, timeout: Option<Duration>) -> *mut MemkvClient {
    catch_unwind(|| {
        if host.is_null() {
            return std::ptr::null_mut();
        }
        let host = match unsafe { CStr::from_ptr(host) }.to_str() {
            Ok(h) => h,
            Err(_) => return std::ptr::null_mut(),
        };
        let mut config = ClientConfig::new(host);
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }
        let client = MemKvClient::with_config(config);
        Box::into_raw(Box::new(MemkvClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `memkv_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_client_free(client: *mut MemkvClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Key operations
// ---------------------------------------------------------------------------

/// Fetch the value stored under `key`. A missing key yields an empty string.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_get_key(
    client: *const MemkvClient,
    key: *const c_char,
) -> *mut MemkvResult {
    call(client, |c| {
        let key = arg(key, "key")?;
        Ok(c.get_key(key))
    })
}

/// Store `body` under `key`. The result holds the previous value, if any.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_put_key(
    client: *const MemkvClient,
    key: *const c_char,
    body: *const c_char,
) -> *mut MemkvResult {
    call(client, |c| {
        let key = arg(key, "key")?;
        let body = arg_bytes(body, "body")?;
        Ok(c.put_key(key, body))
    })
}

/// Delete `key`. The result holds the removed value.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_delete_key(
    client: *const MemkvClient,
    key: *const c_char,
) -> *mut MemkvResult {
    call(client, |c| {
        let key = arg(key, "key")?;
        Ok(c.delete_key(key))
    })
}

/// List every key as a JSON array.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_list_keys(client: *const MemkvClient) -> *mut MemkvResult {
    call(client, |c| Ok(c.list_keys()))
}

/// List the keys starting with `key_prefix` as a JSON array.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_list_keys_with_prefix(
    client: *const MemkvClient,
    key_prefix: *const c_char,
) -> *mut MemkvResult {
    call(client, |c| {
        let prefix = arg(key_prefix, "key_prefix")?;
        Ok(c.list_keys_with_prefix(prefix))
    })
}

/// Delete the keys starting with `key_prefix`. The result is a JSON array of
/// the deleted keys.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_delete_keys_with_prefix(
    client: *const MemkvClient,
    key_prefix: *const c_char,
) -> *mut MemkvResult {
    call(client, |c| {
        let prefix = arg(key_prefix, "key_prefix")?;
        Ok(c.delete_keys_with_prefix(prefix))
    })
}

/// Delete every key.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_delete_all_keys(client: *const MemkvClient) -> *mut MemkvResult {
    call(client, |c| Ok(c.delete_all_keys()))
}

/// Check that the server is up; a healthy server answers `"pong"`.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_ping(client: *const MemkvClient) -> *mut MemkvResult {
    call(client, |c| Ok(c.ping()))
}

/// Run `op` against the client behind `client`, converting every outcome,
/// including null arguments and panics, into a `MemkvResult`.
fn call<F>(client: *const MemkvClient, op: F) -> *mut MemkvResult
where
    F: FnOnce(&MemKvClient) -> Result<Result<String, RequestError>, *mut MemkvResult>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return MemkvResult::null_arg("client");
        }
        let client = unsafe { &*client };
        match op(&client.inner) {
            Ok(outcome) => MemkvResult::from_core(outcome),
            Err(early) => early,
        }
    }))
    .unwrap_or_else(|_| {
        warn!("panic caught at the FFI boundary");
        MemkvResult::panic("internal panic")
    })
}

fn arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut MemkvResult> {
    if ptr.is_null() {
        return Err(MemkvResult::null_arg(name));
    }
    let message = || format!("{name} is not valid UTF-8");
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| MemkvResult::failure(MemkvErrorKind::InvalidString, &message()))
}

fn arg_bytes<'a>(ptr: *const c_char, name: &str) -> Result<&'a [u8], *mut MemkvResult> {
    if ptr.is_null() {
        return Err(MemkvResult::null_arg(name));
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a `MemkvResult` and the strings it owns. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memkv_result_free(result: *mut MemkvResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let r = unsafe { Box::from_raw(result) };
        if !r.result.is_null() {
            drop(unsafe { CString::from_raw(r.result) });
        }
        if !r.error.is_null() {
            drop(unsafe { CString::from_raw(r.error) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Blocking client for the MemoryKV key-value server.
//!
//! # Overview
//! `MemKvClient` exposes the key operations (get, put, delete, list, prefix
//! list, prefix delete, delete all). Each one is a single synchronous HTTP
//! exchange run by the [`Executor`], which returns the raw response body or
//! a [`RequestError`] describing why the call failed.
//!
//! # Design
//! - URLs are built by plain joining (`url`); segments are not encoded.
//! - The executor talks to a [`Transport`] handle option by option, collects
//!   every rejected option before deciding, and never sends a request whose
//!   configuration failed.
//! - Response bodies stream into a [`ResponseAccumulator`] that degrades to
//!   an error instead of aborting when memory runs out.
//! - No retries, no connection reuse, no shared mutable state.
//! - [`global_init`] is the explicit, idempotent process-wide setup.

pub mod accumulator;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;
pub mod url;

pub use accumulator::ResponseAccumulator;
pub use client::{parse_key_list, MemKvClient};
pub use config::ClientConfig;
pub use error::{accumulate, codes_to_string, ClientError, ErrorCodes, RequestError};
pub use executor::{Executor, TransferOptions};
pub use http::{HttpMethod, HttpRequest, UreqTransport};
pub use transport::{global_init, OptionCode, TransferError, Transport, TransportHandle};
pub use url::build_url;

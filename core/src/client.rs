//! Key operations against a MemoryKV server.
//!
//! # Design
//! `MemKvClient` holds only its configuration and an executor. Each
//! operation builds its URL, describes the request and hands it to the
//! executor; response bodies come back untouched. The client carries no
//! mutable state, so a shared reference can be used from many threads.

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, RequestError};
use crate::executor::{Executor, TransferOptions};
use crate::http::{HttpMethod, HttpRequest, UreqTransport};
use crate::transport::Transport;
use crate::url::build_url;

/// Collection resource for listing and bulk deletion.
const KEYS: &str = "keys";

/// Blocking client for the MemoryKV HTTP API.
#[derive(Debug, Clone)]
pub struct MemKvClient<T = UreqTransport> {
    config: ClientConfig,
    executor: Executor<T>,
}

impl MemKvClient<UreqTransport> {
    /// Client for `host` with default settings.
    pub fn new(host: &str) -> Self {
        Self::with_config(ClientConfig::new(host))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> MemKvClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let options = TransferOptions {
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            user_agent: Some(config.user_agent.clone()),
        };
        debug!(host = %config.host, "memkv client created");
        Self {
            executor: Executor::with_transport(transport).with_options(options),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Value stored under `key`. A missing key yields an empty body.
    pub fn get_key(&self, key: &str) -> Result<String, RequestError> {
        self.executor
            .execute(&HttpRequest::new(build_url(self.host(), key)))
    }

    /// Store `value` under `key`, returning the previous value if any.
    pub fn put_key(&self, key: &str, value: impl AsRef<[u8]>) -> Result<String, RequestError> {
        let request = HttpRequest::new(build_url(self.host(), key))
            .with_method(HttpMethod::Put.as_str())
            .with_header("Content-Type", "application/octet-stream")
            .with_body(value.as_ref());
        self.executor.execute(&request)
    }

    /// Remove `key`, returning the removed value.
    pub fn delete_key(&self, key: &str) -> Result<String, RequestError> {
        self.delete(build_url(self.host(), key))
    }

    /// JSON array of every key.
    pub fn list_keys(&self) -> Result<String, RequestError> {
        self.executor
            .execute(&HttpRequest::new(build_url(self.host(), KEYS)))
    }

    /// JSON array of the keys starting with `prefix`.
    pub fn list_keys_with_prefix(&self, prefix: &str) -> Result<String, RequestError> {
        self.executor
            .execute(&HttpRequest::new(self.prefix_url(prefix)))
    }

    /// Remove every key starting with `prefix`; returns the removed keys.
    pub fn delete_keys_with_prefix(&self, prefix: &str) -> Result<String, RequestError> {
        self.delete(self.prefix_url(prefix))
    }

    pub fn delete_all_keys(&self) -> Result<String, RequestError> {
        self.delete(build_url(self.host(), KEYS))
    }

    /// Liveness probe; a healthy server answers `pong`.
    pub fn ping(&self) -> Result<String, RequestError> {
        self.executor
            .execute(&HttpRequest::new(build_url(self.host(), "ping")))
    }

    /// [`list_keys`](Self::list_keys) decoded into key names.
    pub fn keys(&self) -> Result<Vec<String>, ClientError> {
        parse_key_list(&self.list_keys()?)
    }

    /// [`list_keys_with_prefix`](Self::list_keys_with_prefix) decoded into key names.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ClientError> {
        parse_key_list(&self.list_keys_with_prefix(prefix)?)
    }

    fn prefix_url(&self, prefix: &str) -> String {
        build_url(&build_url(self.host(), KEYS), prefix)
    }

    fn delete(&self, url: String) -> Result<String, RequestError> {
        self.executor
            .execute(&HttpRequest::new(url).with_method(HttpMethod::Delete.as_str()))
    }
}

/// Decode the JSON array of key names returned by list endpoints.
pub fn parse_key_list(body: &str) -> Result<Vec<String>, ClientError> {
    Ok(serde_json::from_str(body)?)
}

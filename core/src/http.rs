//! HTTP request description and the ureq-backed transport.
//!
//! # Design
//! `HttpRequest` is plain owned data describing one call: the executor reads
//! it and replays it onto a transport handle option by option.
//!
//! `UreqTransport` validates each option with the `http` types ureq
//! re-exports, so a bad URL, method or header is reported while configuring
//! rather than half-way through a send. Every `perform` builds a fresh
//! `ureq::Agent`; nothing is pooled between requests. HTTP error statuses
//! are not transport failures: a 404 body comes back like any other body.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use tracing::{debug, trace};
use ureq::http::{HeaderName, HeaderValue, Method, Request, Uri};
use ureq::Agent;

use crate::transport::{
    global_init, global_state, GlobalTransport, OptionCode, TransferError, Transport,
    TransportHandle, TransportInitError,
};

/// Size of the reads used to stream a response body into the sink.
const CHUNK_SIZE: usize = 16 * 1024;

/// HTTP verbs the MemoryKV API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One request described as plain data.
///
/// `method` overrides the transport's default `GET` when present and may be
/// any verb, not only the ones in [`HttpMethod`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Request for `url` with no method override, so the transport's `GET`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Transport backed by blocking `ureq`.
///
/// Only constructible through [`UreqTransport::new`], which runs
/// [`global_init`] first.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    _private: (),
}

impl UreqTransport {
    /// Runs [`global_init`] if nothing has yet.
    pub fn new() -> Self {
        global_init();
        Self { _private: () }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    type Handle = UreqHandle;

    fn open(&self) -> Result<UreqHandle, TransportInitError> {
        let global = global_state().ok_or_else(|| TransportInitError {
            reason: "global_init has not run".to_string(),
        })?;
        Ok(UreqHandle::new(global))
    }
}

/// Options for one ureq exchange.
#[derive(Debug)]
pub struct UreqHandle {
    global: &'static GlobalTransport,
    uri: Option<Uri>,
    method: Method,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<Vec<u8>>,
    follow_redirects: bool,
    max_redirects: u32,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl UreqHandle {
    fn new(global: &'static GlobalTransport) -> Self {
        Self {
            global,
            uri: None,
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            follow_redirects: false,
            max_redirects: 10,
            timeout: None,
            user_agent: None,
        }
    }

    fn agent(&self) -> Agent {
        let redirects = if self.follow_redirects {
            self.max_redirects
        } else {
            0
        };
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .max_redirects(redirects)
            .timeout_global(self.timeout)
            .tls_config(self.global.tls.clone());
        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent.as_str());
        }
        config.build().new_agent()
    }

    fn request(&self) -> Result<ureq::http::request::Builder, TransferError> {
        let uri = self
            .uri
            .clone()
            .ok_or_else(|| TransferError::new("No URL set"))?;
        let mut builder = Request::builder().method(self.method.clone()).uri(uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        Ok(builder)
    }
}

impl TransportHandle for UreqHandle {
    fn set_url(&mut self, url: &str) -> Result<(), OptionCode> {
        let uri = Uri::try_from(url).map_err(|_| OptionCode::MalformedUrl)?;
        if uri.authority().is_none() {
            return Err(OptionCode::MalformedUrl);
        }
        match uri.scheme_str() {
            Some("http") | Some("https") => {}
            Some(_) => return Err(OptionCode::UnsupportedProtocol),
            None => return Err(OptionCode::MalformedUrl),
        }
        self.uri = Some(uri);
        Ok(())
    }

    fn set_method(&mut self, method: &str) -> Result<(), OptionCode> {
        self.method = Method::from_bytes(method.as_bytes()).map_err(|_| OptionCode::BadArgument)?;
        Ok(())
    }

    fn append_header(&mut self, name: &str, value: &str) -> Result<(), OptionCode> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| OptionCode::BadArgument)?;
        let value = HeaderValue::from_str(value).map_err(|_| OptionCode::BadArgument)?;
        self.headers
            .try_reserve(1)
            .map_err(|_| OptionCode::OutOfMemory)?;
        self.headers.push((name, value));
        Ok(())
    }

    fn set_body(&mut self, body: &[u8]) -> Result<(), OptionCode> {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(body.len())
            .map_err(|_| OptionCode::OutOfMemory)?;
        owned.extend_from_slice(body);
        self.body = Some(owned);
        Ok(())
    }

    fn set_follow_redirects(&mut self, follow: bool) -> Result<(), OptionCode> {
        self.follow_redirects = follow;
        Ok(())
    }

    fn set_max_redirects(&mut self, max: u32) -> Result<(), OptionCode> {
        self.max_redirects = max;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), OptionCode> {
        if timeout == Some(Duration::ZERO) {
            return Err(OptionCode::BadArgument);
        }
        self.timeout = timeout;
        Ok(())
    }

    fn set_user_agent(&mut self, user_agent: &str) -> Result<(), OptionCode> {
        HeaderValue::from_str(user_agent).map_err(|_| OptionCode::BadArgument)?;
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), TransferError> {
        let builder = self.request()?;
        let agent = self.agent();
        let sent = match &self.body {
            Some(body) => builder
                .body(body.as_slice())
                .map_err(|e| TransferError::new(e.to_string()))
                .and_then(|req| agent.run(req).map_err(|e| TransferError::new(e.to_string()))),
            None => builder
                .body(())
                .map_err(|e| TransferError::new(e.to_string()))
                .and_then(|req| agent.run(req).map_err(|e| TransferError::new(e.to_string()))),
        };
        let response = sent?;
        debug!(status = response.status().as_u16(), "response headers received");

        let mut reader = response.into_body().into_reader();
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransferError::new(e.to_string())),
            };
            trace!(bytes = n, "body chunk");
            if sink(&chunk[..n]) != n {
                return Err(TransferError::new("Failed writing received data to disk/application"));
            }
        }
        Ok(())
    }
}

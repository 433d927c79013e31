//! Runs one request from description to result.
//!
//! # Design
//! `execute` walks a fixed sequence: open a handle, apply every option,
//! send, interpret. Option failures are all collected before deciding;
//! if any were reported the request is abandoned without touching the
//! network. The handle lives on the stack of `run`, so whichever branch
//! returns, dropping it releases the transport's resources.
//!
//! Calls share nothing mutable. Each one opens its own handle and fills its
//! own [`ResponseAccumulator`], so one executor can serve many threads.

use std::time::Duration;

use tracing::{debug, warn};

use crate::accumulator::ResponseAccumulator;
use crate::error::{ErrorCodes, RequestError};
use crate::http::{HttpRequest, UreqTransport};
use crate::transport::{OptionCode, Transport, TransportHandle};

/// Per-executor transfer settings applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub timeout: Option<Duration>,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

/// Executes [`HttpRequest`]s over a [`Transport`].
#[derive(Debug, Clone)]
pub struct Executor<T = UreqTransport> {
    transport: T,
    options: TransferOptions,
}

impl Executor<UreqTransport> {
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }
}

impl Default for Executor<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Executor<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            options: TransferOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` and return the response body.
    ///
    /// Blocks for the whole round trip. An empty body is a success.
    pub fn execute(&self, request: &HttpRequest) -> Result<String, RequestError> {
        self.run(request, ResponseAccumulator::new())
    }

    fn run(
        &self,
        request: &HttpRequest,
        mut body: ResponseAccumulator,
    ) -> Result<String, RequestError> {
        let mut handle = self.transport.open().map_err(|e| {
            warn!(error = %e, "could not open transport handle");
            RequestError::TransportInit
        })?;

        let method = request.method.as_deref().unwrap_or("GET");
        debug!(url = %request.url, method, "configuring transfer");
        let errors = self.configure(&mut handle, request);
        if !errors.is_empty() {
            warn!(url = %request.url, codes = %errors, "options rejected, request not sent");
            return Err(RequestError::Configuration(errors));
        }

        debug!(url = %request.url, "awaiting response");
        handle
            .perform(&mut |chunk: &[u8]| body.append(chunk))
            .map_err(|e| {
                debug!(url = %request.url, error = %e, "transfer failed");
                RequestError::Transfer(e.message)
            })?;

        if body.has_failed() {
            return Err(RequestError::Accumulation);
        }
        debug!(url = %request.url, bytes = body.len(), "transfer complete");
        Ok(body.into_string())
    }

    fn configure(&self, handle: &mut T::Handle, request: &HttpRequest) -> ErrorCodes {
        let mut errors = ErrorCodes::new();
        let mut record = |outcome: Result<(), OptionCode>| {
            if let Err(code) = outcome {
                errors.push(code.code());
            }
        };

        record(handle.set_url(&request.url));
        if let Some(method) = &request.method {
            record(handle.set_method(method));
        }
        for (name, value) in &request.headers {
            record(handle.append_header(name, value));
        }
        if let Some(body) = &request.body {
            record(handle.set_body(body));
        }
        record(handle.set_follow_redirects(true));
        record(handle.set_max_redirects(self.options.max_redirects));
        if self.options.timeout.is_some() {
            record(handle.set_timeout(self.options.timeout));
        }
        if let Some(user_agent) = &self.options.user_agent {
            record(handle.set_user_agent(user_agent));
        }
        errors
    }
}

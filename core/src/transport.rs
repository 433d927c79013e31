//! The transport seam underneath the executor.
//!
//! # Design
//! A transport hands out one [`TransportHandle`] per request. The handle is
//! configured option by option; every setter reports its own [`OptionCode`]
//! so the executor can collect all of them before deciding whether to send.
//! `perform` runs the whole exchange synchronously and pushes the body into
//! a caller-provided sink. Dropping the handle releases everything it holds,
//! which is how the executor frees transport resources on every exit path.
//!
//! Process-wide setup is explicit: [`global_init`] runs once, no matter how
//! often it is called, and transports that depend on it refuse to open
//! handles until it has run.

use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use ureq::tls::TlsConfig;

/// Why a transport option was rejected. Values are stable and below 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptionCode {
    /// URL scheme other than `http` or `https`.
    UnsupportedProtocol = 1,
    /// URL could not be parsed.
    MalformedUrl = 3,
    /// Copying an option value failed to allocate.
    OutOfMemory = 27,
    /// Method, header or timeout value is not acceptable.
    BadArgument = 43,
}

impl OptionCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Failure of the transfer itself, with the transport's own message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransferError {
    pub message: String,
}

impl TransferError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A transport could not produce a handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport not available: {reason}")]
pub struct TransportInitError {
    pub reason: String,
}

/// Creates one handle per request.
pub trait Transport {
    type Handle: TransportHandle;

    fn open(&self) -> Result<Self::Handle, TransportInitError>;
}

/// A single configured exchange.
pub trait TransportHandle {
    fn set_url(&mut self, url: &str) -> Result<(), OptionCode>;

    /// Replace the default `GET` verb.
    fn set_method(&mut self, method: &str) -> Result<(), OptionCode>;

    fn append_header(&mut self, name: &str, value: &str) -> Result<(), OptionCode>;

    fn set_body(&mut self, body: &[u8]) -> Result<(), OptionCode>;

    fn set_follow_redirects(&mut self, follow: bool) -> Result<(), OptionCode>;

    fn set_max_redirects(&mut self, max: u32) -> Result<(), OptionCode>;

    /// Deadline for the whole exchange. `None` waits indefinitely.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), OptionCode>;

    fn set_user_agent(&mut self, user_agent: &str) -> Result<(), OptionCode>;

    /// Run the exchange, feeding body chunks to `sink` in arrival order.
    ///
    /// `sink` returns how many bytes it consumed; anything short of the full
    /// chunk aborts the transfer.
    fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), TransferError>;
}

/// Process-wide transport state, built once by [`global_init`].
#[derive(Debug)]
pub struct GlobalTransport {
    pub(crate) tls: TlsConfig,
}

static GLOBAL: OnceLock<GlobalTransport> = OnceLock::new();

/// Initialize process-wide transport state.
///
/// Safe to call any number of times from any thread; only the first call
/// does work. Client constructors call it, so most callers never need to.
pub fn global_init() -> &'static GlobalTransport {
    GLOBAL.get_or_init(|| {
        debug!("initializing transport");
        GlobalTransport {
            tls: TlsConfig::builder().build(),
        }
    })
}

/// The process-wide state, if [`global_init`] has run.
pub fn global_state() -> Option<&'static GlobalTransport> {
    GLOBAL.get()
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory transport that replays a script and records what it saw.

    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// What a scripted handle observed, shared with the test.
    #[derive(Debug, Default)]
    pub struct Record {
        pub opened: usize,
        pub dropped: usize,
        pub performed: usize,
        pub url: Option<String>,
        pub method: Option<String>,
        pub headers: Vec<(String, String)>,
        pub body: Option<Vec<u8>>,
        pub follow_redirects: Option<bool>,
        pub max_redirects: Option<u32>,
        pub timeout: Option<Duration>,
        pub user_agent: Option<String>,
    }

    /// Behaviour for the next handles.
    #[derive(Debug, Clone, Default)]
    pub struct Script {
        pub refuse_open: bool,
        pub reject_url: Option<OptionCode>,
        pub reject_method: Option<OptionCode>,
        pub reject_headers: Option<OptionCode>,
        pub reject_body: Option<OptionCode>,
        pub chunks: Vec<Vec<u8>>,
        pub fail_transfer: Option<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct ScriptedTransport {
        pub script: Script,
        pub record: Rc<RefCell<Record>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Script) -> Self {
            Self {
                script,
                record: Rc::default(),
            }
        }

        pub fn responding(chunks: &[&[u8]]) -> Self {
            Self::new(Script {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                ..Script::default()
            })
        }
    }

    pub struct ScriptedHandle {
        script: Script,
        record: Rc<RefCell<Record>>,
    }

    impl Transport for ScriptedTransport {
        type Handle = ScriptedHandle;

        fn open(&self) -> Result<ScriptedHandle, TransportInitError> {
            if self.script.refuse_open {
                return Err(TransportInitError {
                    reason: "scripted refusal".into(),
                });
            }
            self.record.borrow_mut().opened += 1;
            Ok(ScriptedHandle {
                script: self.script.clone(),
                record: Rc::clone(&self.record),
            })
        }
    }

    fn outcome(code: Option<OptionCode>) -> Result<(), OptionCode> {
        match code {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    impl TransportHandle for ScriptedHandle {
        fn set_url(&mut self, url: &str) -> Result<(), OptionCode> {
            self.record.borrow_mut().url = Some(url.to_string());
            outcome(self.script.reject_url)
        }

        fn set_method(&mut self, method: &str) -> Result<(), OptionCode> {
            self.record.borrow_mut().method = Some(method.to_string());
            outcome(self.script.reject_method)
        }

        fn append_header(&mut self, name: &str, value: &str) -> Result<(), OptionCode> {
            self.record
                .borrow_mut()
                .headers
                .push((name.to_string(), value.to_string()));
            outcome(self.script.reject_headers)
        }

        fn set_body(&mut self, body: &[u8]) -> Result<(), OptionCode> {
            self.record.borrow_mut().body = Some(body.to_vec());
            outcome(self.script.reject_body)
        }

        fn set_follow_redirects(&mut self, follow: bool) -> Result<(), OptionCode> {
            self.record.borrow_mut().follow_redirects = Some(follow);
            Ok(())
        }

        fn set_max_redirects(&mut self, max: u32) -> Result<(), OptionCode> {
            self.record.borrow_mut().max_redirects = Some(max);
            Ok(())
        }

        fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), OptionCode> {
            self.record.borrow_mut().timeout = timeout;
            Ok(())
        }

        fn set_user_agent(&mut self, user_agent: &str) -> Result<(), OptionCode> {
            self.record.borrow_mut().user_agent = Some(user_agent.to_string());
            Ok(())
        }

        fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), TransferError> {
            self.record.borrow_mut().performed += 1;
            for chunk in &self.script.chunks {
                if sink(chunk) != chunk.len() {
                    return Err(TransferError::new("failed writing received data"));
                }
            }
            match &self.script.fail_transfer {
                Some(message) => Err(TransferError::new(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl Drop for ScriptedHandle {
        fn drop(&mut self) {
            self.record.borrow_mut().dropped += 1;
        }
    }
}

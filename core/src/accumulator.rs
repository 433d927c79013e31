//! Growable sink for a streamed response body.
//!
//! # Design
//! The transport pushes chunks into [`ResponseAccumulator::append`] in arrival
//! order. Storage is grown with `Vec::try_reserve` before each copy so an
//! allocation failure turns into a flag instead of an abort. Once the flag is
//! set the buffer is frozen at its last valid prefix; `append` keeps reporting
//! every chunk as consumed so the transport is never cut off mid-stream.

use tracing::warn;

/// Byte buffer filled by the transport's write callback.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    buf: Vec<u8>,
    failed: bool,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk`, returning the number of bytes consumed.
    ///
    /// Always returns `chunk.len()`, even after a growth failure.
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        self.append_reserving(chunk, chunk.len())
    }

    fn append_reserving(&mut self, chunk: &[u8], additional: usize) -> usize {
        if !self.failed {
            if let Err(e) = self.buf.try_reserve(additional) {
                warn!(
                    len = self.buf.len(),
                    chunk = chunk.len(),
                    error = %e,
                    "response buffer could not grow, dropping the rest of the body"
                );
                self.failed = true;
            } else {
                self.buf.extend_from_slice(chunk);
            }
        }
        chunk.len()
    }

    /// Number of bytes appended successfully.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True once a chunk could not be stored.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Consume the buffer as text. Invalid UTF-8 sequences are replaced.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.buf) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Drive the growth-failure path with a reservation that cannot succeed.
    #[cfg(test)]
    pub(crate) fn force_failure(&mut self) {
        self.append_reserving(&[], usize::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let acc = ResponseAccumulator::new();
        assert_eq!(acc.len(), 0);
        assert!(acc.is_empty());
        assert!(!acc.has_failed());
    }

    #[test]
    fn concatenates_chunks_in_order() {
        let chunks: [&[u8]; 4] = [b"ab", b"", b"cde", b"f"];
        let mut acc = ResponseAccumulator::new();
        let mut total = 0;
        for chunk in chunks {
            assert_eq!(acc.append(chunk), chunk.len());
            total += chunk.len();
        }
        assert_eq!(acc.len(), total);
        assert_eq!(acc.as_bytes(), b"abcdef");
    }

    #[test]
    fn keeps_duplicate_chunks() {
        let mut acc = ResponseAccumulator::new();
        acc.append(b"xy");
        acc.append(b"xy");
        assert_eq!(acc.into_string(), "xyxy");
    }

    #[test]
    fn handles_many_large_chunks() {
        let chunk = vec![7u8; 16 * 1024];
        let mut acc = ResponseAccumulator::new();
        for _ in 0..64 {
            acc.append(&chunk);
        }
        assert_eq!(acc.len(), 64 * 16 * 1024);
        assert!(acc.as_bytes().iter().all(|b| *b == 7));
    }

    #[test]
    fn frozen_after_failure_but_still_consumes() {
        let mut acc = ResponseAccumulator::new();
        acc.append(b"kept");
        acc.force_failure();
        assert_eq!(acc.append(b"dropped"), 7);
        assert!(acc.has_failed());
        assert_eq!(acc.as_bytes(), b"kept");
        assert_eq!(acc.len(), 4);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut acc = ResponseAccumulator::new();
        acc.append(&[b'o', b'k', 0xff]);
        assert_eq!(acc.into_string(), "ok\u{fffd}");
    }
}

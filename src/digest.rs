//! Digest tracking for input streams.
//!
//! ## Why track a digest at all?
//!
//! When parsing fails, the server cannot tell "the client uploaded something
//! that was never a PDF" apart from "the bytes were mangled in transit". The
//! client may send `sha1Hex`, its own digest of the original file; comparing
//! it against a digest of what the server *actually consumed* disambiguates
//! the two. [`DigestReader`] wraps any reader and accumulates SHA-1 as bytes
//! flow through, without buffering the stream and without changing its read
//! semantics.
//!
//! Finalization is checked: a digest of a half-read stream would silently
//! compare unequal to the client's whole-file digest, so
//! [`DigestReader::finalize`] refuses to produce a value until end-of-input
//! has been observed. Callers that fail mid-stream should
//! [`DigestReader::drain`] first.

use crate::error::ValidateError;
use sha1::{Digest, Sha1};
use std::io::{self, Read};

/// Digest algorithm name, matching the `sha1Hex` form-field contract.
pub const DIGEST_ALGORITHM: &str = "SHA-1";

/// A finalized content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    /// Always [`DIGEST_ALGORITHM`].
    pub algorithm: &'static str,
    /// Lowercase hex encoding of the digest value.
    pub hex: String,
}

impl ContentDigest {
    /// Case-insensitive comparison against a client-supplied hex digest.
    pub fn matches_hex(&self, other: &str) -> bool {
        self.hex.eq_ignore_ascii_case(other.trim())
    }
}

/// A reader that feeds every byte it yields into a running SHA-1.
///
/// Reading `n` bytes from the tracker reads exactly `n` bytes from the
/// underlying reader. No look-ahead, no whole-stream buffering.
pub struct DigestReader<R> {
    inner: R,
    hasher: Sha1,
    bytes_read: u64,
    saw_eof: bool,
}

impl<R: Read> DigestReader<R> {
    /// Wrap `inner`, starting a fresh digest accumulator.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
            bytes_read: 0,
            saw_eof: false,
        }
    }

    /// Total bytes consumed from the underlying reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the underlying reader has reported end-of-input.
    pub fn at_eof(&self) -> bool {
        self.saw_eof
    }

    /// Consume the rest of the underlying stream, discarding the bytes but
    /// folding them into the digest. After a successful drain the digest
    /// covers the full content and [`finalize`](Self::finalize) will succeed.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }

    /// Produce the final digest.
    ///
    /// Fails with [`ValidateError::DigestIncomplete`] unless end-of-input has
    /// been observed — a partial-prefix digest is never returned silently.
    pub fn finalize(self) -> Result<ContentDigest, ValidateError> {
        if !self.saw_eof {
            return Err(ValidateError::DigestIncomplete {
                bytes_read: self.bytes_read,
            });
        }
        Ok(ContentDigest {
            algorithm: DIGEST_ALGORITHM,
            hex: hex::encode(self.hasher.finalize()),
        })
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            if !buf.is_empty() {
                self.saw_eof = true;
            }
        } else {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

/// Digest a byte slice directly. Used by tests and by clients that want to
/// precompute `sha1Hex`.
pub fn digest_bytes(bytes: &[u8]) -> ContentDigest {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    ContentDigest {
        algorithm: DIGEST_ALGORITHM,
        hex: hex::encode(hasher.finalize()),
    }
}

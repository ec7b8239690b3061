//! Error types for the pdfconform library.
//!
//! A single fatal error enum covers the whole request lifecycle, but the
//! variants fall into three groups that matter to callers:
//!
//! * **Input resolution** — [`ValidateError::AmbiguousInput`],
//!   [`ValidateError::MissingInput`], [`ValidateError::RemoteFetch`]. The
//!   request never reached the validation engine; the client should fix how
//!   it supplies the document.
//!
//! * **Disambiguated parse failure** — [`ValidateError::NotAPdf`] means the
//!   bytes the server consumed genuinely are not a parseable PDF (the
//!   client-supplied digest, when present, matched what was read). A plain
//!   [`ValidateError::Parse`] means the digest did *not* match: the document
//!   was likely corrupted or tampered with in transit, and the underlying
//!   parse error is surfaced instead. The two imply different remediation
//!   and must never be conflated.
//!
//! * **Report path** — [`ValidateError::StagingIo`],
//!   [`ValidateError::PipelineIo`], [`ValidateError::RenderTransform`].

use thiserror::Error;

/// All fatal errors returned by the pdfconform library.
#[derive(Debug, Error)]
pub enum ValidateError {
    // ── Input resolution ─────────────────────────────────────────────────
    /// Both a `url` field and an uploaded `file` part were supplied.
    #[error("ambiguous input: supply either 'url' or 'file', not both")]
    AmbiguousInput,

    /// Neither a `url` field nor an uploaded `file` part was supplied.
    #[error("missing input: supply a 'url' or an uploaded 'file'")]
    MissingInput,

    /// The URL was present but the document could not be fetched.
    #[error("could not fetch document from '{url}': {reason}")]
    RemoteFetch { url: String, reason: String },

    /// Fetching the URL exceeded the configured timeout.
    #[error("fetch of '{url}' timed out after {secs}s")]
    RemoteFetchTimeout { url: String, secs: u64 },

    /// The profile id in the request path is not in the profile directory.
    #[error("unknown validation profile '{id}' (expected one of 1a, 1b, 2a, 2b, 2u, 3a, 3b, 3u, 4, 4e, 4f)")]
    UnknownProfile { id: String },

    // ── Validation ───────────────────────────────────────────────────────
    /// The input is not a parseable PDF. Only raised when no client digest
    /// was supplied or the client digest matches what the server read.
    #[error("file does not appear to be a PDF")]
    NotAPdf,

    /// Parse failure where the client digest did NOT match the bytes read,
    /// pointing at transport corruption rather than a non-PDF upload.
    #[error("document cannot be parsed: {detail}")]
    Parse { detail: String },

    /// The underlying stream failed mid-validation. Distinct from a rule
    /// failure: no verdict was produced at all.
    #[error("validation could not complete: {detail}")]
    ValidationIncomplete { detail: String },

    /// Unexpected validation-engine failure.
    #[error("validation engine error: {detail}")]
    Engine { detail: String },

    /// A digest was finalized before the tracked stream reported
    /// end-of-input; the value would only cover a prefix.
    #[error("digest finalized before end of stream ({bytes_read} bytes read)")]
    DigestIncomplete { bytes_read: u64 },

    // ── Report path ──────────────────────────────────────────────────────
    /// Creating or writing the staged temp file failed.
    #[error("failed to stage input to a temporary file")]
    StagingIo {
        #[source]
        source: std::io::Error,
    },

    /// The machine-readable report sink could not be written.
    #[error("failed to write the machine-readable report")]
    PipelineIo {
        #[source]
        source: std::io::Error,
    },

    /// The intermediate structured report could not be transformed to HTML.
    #[error("report transformation failed: {detail}")]
    RenderTransform { detail: String },

    // ── Config / catch-all ───────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_display() {
        assert_eq!(
            ValidateError::NotAPdf.to_string(),
            "file does not appear to be a PDF"
        );
    }

    #[test]
    fn remote_fetch_display_includes_url_and_reason() {
        let e = ValidateError::RemoteFetch {
            url: "http://example.com/doc.pdf".into(),
            reason: "connection refused".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("http://example.com/doc.pdf"), "got: {msg}");
        assert!(msg.contains("connection refused"), "got: {msg}");
    }

    #[test]
    fn unknown_profile_lists_known_ids() {
        let e = ValidateError::UnknownProfile { id: "9z".into() };
        assert!(e.to_string().contains("1b"));
    }

    #[test]
    fn staging_io_preserves_source() {
        use std::error::Error;
        let e = ValidateError::StagingIo {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
    }
}

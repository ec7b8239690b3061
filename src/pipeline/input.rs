//! Input resolution: normalise a request to a single byte stream.
//!
//! A request may carry the document as an uploaded `file` part or as a `url`
//! to fetch. Exactly one of the two must be present: both is ambiguous (we
//! refuse to guess which the client meant), neither leaves nothing to
//! validate. Ambiguity is rejected *before* any network work happens.
//!
//! URL inputs get a single fetch attempt with no retry — a failed fetch
//! surfaces immediately with its cause. The response body is pulled into the
//! resolved stream so downstream stages see uploads and fetches identically.

use crate::error::ValidateError;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::{debug, info};

/// The resolved input stream plus a description of where it came from.
///
/// Ownership of the stream transfers to whichever stage consumes it next;
/// the stream is not rewindable — stage it if it must be read twice.
pub struct ResolvedInput {
    pub reader: Box<dyn Read + Send>,
    /// For diagnostics only, e.g. `"upload (312 bytes)"` or the source URL.
    pub origin: String,
}

/// Resolve exactly one of {upload, URL} to a byte stream.
///
/// # Errors
/// * [`ValidateError::AmbiguousInput`] — both present (checked first, no
///   network work occurs).
/// * [`ValidateError::MissingInput`] — neither present.
/// * [`ValidateError::RemoteFetch`] / [`ValidateError::RemoteFetchTimeout`]
///   — the URL could not be fetched or returned a non-success status.
pub async fn resolve(
    url: Option<String>,
    upload: Option<Vec<u8>>,
    timeout_secs: u64,
) -> Result<ResolvedInput, ValidateError> {
    match (url, upload) {
        (Some(_), Some(_)) => Err(ValidateError::AmbiguousInput),
        (None, None) => Err(ValidateError::MissingInput),
        (None, Some(bytes)) => {
            debug!(size = bytes.len(), "resolved uploaded input");
            let origin = format!("upload ({} bytes)", bytes.len());
            Ok(ResolvedInput {
                reader: Box::new(Cursor::new(bytes)),
                origin,
            })
        }
        (Some(url), None) => fetch_url(&url, timeout_secs).await,
    }
}

/// Fetch a URL body as the input stream. One attempt, no retry.
async fn fetch_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ValidateError> {
    info!("fetching document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ValidateError::RemoteFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ValidateError::RemoteFetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ValidateError::RemoteFetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ValidateError::RemoteFetch {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ValidateError::RemoteFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    debug!(size = bytes.len(), "fetched remote input");
    Ok(ResolvedInput {
        reader: Box::new(Cursor::new(bytes.to_vec())),
        origin: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn both_url_and_upload_is_ambiguous() {
        // An unroutable URL proves no fetch is attempted: the ambiguity
        // check fires before any network work.
        let result = resolve(
            Some("http://192.0.2.1/doc.pdf".into()),
            Some(vec![1, 2, 3]),
            1,
        )
        .await;
        assert!(matches!(result, Err(ValidateError::AmbiguousInput)));
    }

    #[tokio::test]
    async fn neither_input_is_missing() {
        let result = resolve(None, None, 1).await;
        assert!(matches!(result, Err(ValidateError::MissingInput)));
    }

    #[tokio::test]
    async fn upload_passes_through_unchanged() {
        let data = b"%PDF-1.4 pretend".to_vec();
        let mut resolved = resolve(None, Some(data.clone()), 1).await.unwrap();
        let mut out = Vec::new();
        resolved.reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert!(resolved.origin.contains("upload"));
    }

    #[tokio::test]
    async fn empty_upload_is_still_an_input() {
        // Zero bytes is a present (if useless) upload, not a missing one.
        let mut resolved = resolve(None, Some(Vec::new()), 1).await.unwrap();
        let mut out = Vec::new();
        resolved.reader.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unreachable_url_is_a_fetch_error() {
        // Port 1 on loopback is essentially never listening.
        let result = resolve(Some("http://127.0.0.1:1/doc.pdf".into()), None, 2).await;
        match result {
            Err(ValidateError::RemoteFetch { url, .. }) => {
                assert!(url.contains("127.0.0.1"))
            }
            Err(ValidateError::RemoteFetchTimeout { .. }) => {}
            other => panic!("expected fetch failure, got {:?}", other.map(|_| "ok")),
        }
    }
}

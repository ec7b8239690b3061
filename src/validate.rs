//! Request orchestration entry points.
//!
//! Two operations share one request shape ([`ValidationRequest`]) and one
//! input-resolution step, then diverge:
//!
//! * [`validate`] — the direct path: the resolved stream flows through a
//!   digest tracker straight into the engine, and the structured result
//!   comes back. On parse failure the tracked digest disambiguates "not a
//!   PDF" from "corrupted in transit" (see [`crate::digest`]).
//!
//! * [`validate_report`] — the report path: the stream is staged to a temp
//!   file, the batch pipeline runs over it, and the machine-readable output
//!   is rendered to HTML. The staged artifact is dropped (and deleted) on
//!   every exit path.
//!
//! The engine is synchronous and potentially slow, so both paths run their
//! blocking half under `spawn_blocking` and keep the async side to input
//! resolution only.

use crate::config::ServiceConfig;
use crate::digest::DigestReader;
use crate::engine::{
    BaselineEngine, EngineError, Profile, ProfileDirectory, ValidationEngine, ValidationResult,
};
use crate::error::ValidateError;
use crate::pipeline::{batch, input, stage};
use crate::report::{HtmlRenderer, ReportRenderer};
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable per-process context: engine, renderer, profile directory and
/// configuration, constructed once at startup and shared across requests.
pub struct ServiceContext {
    engine: Arc<dyn ValidationEngine>,
    renderer: Arc<dyn ReportRenderer>,
    profiles: ProfileDirectory,
    config: ServiceConfig,
}

impl ServiceContext {
    /// Context wired with the built-in baseline engine and HTML renderer.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            engine: Arc::new(BaselineEngine),
            renderer: Arc::new(HtmlRenderer),
            profiles: ProfileDirectory::default(),
            config,
        }
    }

    /// Swap in an external validation engine.
    pub fn with_engine(mut self, engine: Arc<dyn ValidationEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Swap in an external report renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileDirectory {
        &self.profiles
    }
}

/// One inbound validation request, as carried by the multipart form.
#[derive(Debug, Default)]
pub struct ValidationRequest {
    /// Profile id from the request path, e.g. `"1b"`.
    pub profile_id: String,
    /// Client-computed SHA-1 of the original file, hex-encoded.
    pub sha1_hex: Option<String>,
    /// Remote document location; mutually exclusive with `upload`.
    pub url: Option<String>,
    /// Uploaded document bytes; mutually exclusive with `url`.
    pub upload: Option<Vec<u8>>,
}

/// Direct path: validate the input under the requested profile and return
/// the structured result.
pub async fn validate(
    ctx: &ServiceContext,
    request: ValidationRequest,
) -> Result<ValidationResult, ValidateError> {
    let profile = ctx.profiles.require(&request.profile_id)?.clone();
    let resolved = input::resolve(
        request.url,
        request.upload,
        ctx.config.download_timeout_secs,
    )
    .await?;
    info!(profile = %profile.name(), origin = %resolved.origin, "validating document");

    let engine = Arc::clone(&ctx.engine);
    let validator_config = ctx.config.validator_config();
    let sha1_hex = request.sha1_hex;
    run_blocking(move || {
        let mut tracked = DigestReader::new(resolved.reader);
        match engine.validate(&mut tracked, &profile, &validator_config) {
            Ok(result) => Ok(result),
            Err(EngineError::Parse { detail }) => {
                disambiguate_parse_failure(tracked, sha1_hex.as_deref(), detail)
            }
            Err(EngineError::Io(e)) => {
                warn!(error = %e, "stream failed during validation; no verdict produced");
                Err(ValidateError::ValidationIncomplete {
                    detail: e.to_string(),
                })
            }
            Err(EngineError::Engine(detail)) => Err(ValidateError::Engine { detail }),
        }
    })
    .await
}

/// On parse failure, decide between `NotAPdf` and the underlying parse error.
///
/// The client's digest covers the *original* file; ours covers what the
/// server actually consumed. Equal digests (or no client digest at all)
/// mean the bytes arrived intact and genuinely are not a PDF. A mismatch
/// points at transport corruption, so the parse error itself is surfaced.
///
/// The stream is drained first: the parser may have stopped early, and a
/// digest over a prefix would compare unequal for the wrong reason.
fn disambiguate_parse_failure<R: std::io::Read>(
    mut tracked: DigestReader<R>,
    sha1_hex: Option<&str>,
    parse_detail: String,
) -> Result<ValidationResult, ValidateError> {
    tracked
        .drain()
        .map_err(|e| ValidateError::ValidationIncomplete {
            detail: format!("failed draining stream after parse error: {e}"),
        })?;
    let digest = tracked.finalize()?;
    match sha1_hex {
        None => Err(ValidateError::NotAPdf),
        Some(expected) if digest.matches_hex(expected) => Err(ValidateError::NotAPdf),
        Some(_) => {
            info!("client digest mismatch; surfacing parse error instead of NotAPdf");
            Err(ValidateError::Parse {
                detail: parse_detail,
            })
        }
    }
}

/// Report path: stage the input, run the batch pipeline, render to HTML.
pub async fn validate_report(
    ctx: &ServiceContext,
    request: ValidationRequest,
) -> Result<Vec<u8>, ValidateError> {
    let profile = ctx.profiles.require(&request.profile_id)?.clone();
    let resolved = input::resolve(
        request.url,
        request.upload,
        ctx.config.download_timeout_secs,
    )
    .await?;
    info!(profile = %profile.name(), origin = %resolved.origin, "producing validation report");

    let engine = Arc::clone(&ctx.engine);
    let renderer = Arc::clone(&ctx.renderer);
    let validator_config = ctx.config.validator_config();
    let wiki_base = ctx.config.wiki_base_url.clone();
    let verbose = ctx.config.verbose_reports;
    run_blocking(move || {
        let mut reader = resolved.reader;
        // The artifact lives for this scope only; drop deletes the temp
        // file no matter which stage below fails.
        let artifact = stage::stage(&mut reader)?;
        let processor_config = batch::ProcessorConfig::validate_only(validator_config);
        let (mrr, summary) = batch::run(engine.as_ref(), &artifact, &profile, &processor_config)?;
        renderer.render(&mrr, summary.as_ref(), &wiki_base, verbose)
    })
    .await
}

async fn run_blocking<T, F>(f: F) -> Result<T, ValidateError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ValidateError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ValidateError::Internal(format!("validation task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::digest_bytes;

    fn ctx() -> ServiceContext {
        ServiceContext::new(ServiceConfig::default())
    }

    fn upload_request(profile_id: &str, bytes: &[u8], sha1_hex: Option<String>) -> ValidationRequest {
        ValidationRequest {
            profile_id: profile_id.into(),
            sha1_hex,
            url: None,
            upload: Some(bytes.to_vec()),
        }
    }

    const MINIMAL_PDF: &[u8] =
        b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\nstartxref\n9\n%%EOF\n";

    #[tokio::test]
    async fn valid_upload_returns_compliant_result() {
        let result = validate(&ctx(), upload_request("1b", MINIMAL_PDF, None))
            .await
            .unwrap();
        assert!(result.compliant);
        assert_eq!(result.profile, "PDF/A-1B");
    }

    #[tokio::test]
    async fn non_pdf_without_digest_is_not_a_pdf() {
        let err = validate(&ctx(), upload_request("1b", &[0x00, 0x01, 0x02], None)).await;
        assert!(matches!(err, Err(ValidateError::NotAPdf)));
    }

    #[tokio::test]
    async fn non_pdf_with_matching_digest_is_not_a_pdf() {
        let payload = [0x00, 0x01, 0x02];
        let sha1 = digest_bytes(&payload).hex;
        let err = validate(&ctx(), upload_request("1b", &payload, Some(sha1))).await;
        assert!(matches!(err, Err(ValidateError::NotAPdf)));
    }

    #[tokio::test]
    async fn non_pdf_with_mismatched_digest_surfaces_parse_error() {
        let payload = [0x00, 0x01, 0x02];
        let err = validate(
            &ctx(),
            upload_request("1b", &payload, Some("deadbeef".repeat(5))),
        )
        .await;
        assert!(matches!(err, Err(ValidateError::Parse { .. })));
    }

    #[tokio::test]
    async fn unknown_profile_is_rejected_before_resolution() {
        let err = validate(&ctx(), upload_request("9z", MINIMAL_PDF, None)).await;
        assert!(matches!(err, Err(ValidateError::UnknownProfile { .. })));
    }

    #[tokio::test]
    async fn report_path_produces_html_with_wiki_links() {
        let html = validate_report(&ctx(), upload_request("1b", MINIMAL_PDF, None))
            .await
            .unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(!html.is_empty());
        assert!(html.contains(&ctx().config().wiki_base_url));
        assert!(html.contains("compliant"));
    }

    #[tokio::test]
    async fn report_path_handles_non_pdf_input() {
        // The report path has no digest policy; a non-PDF item shows up as
        // a failed-to-parse job in the rendered report.
        let html = validate_report(&ctx(), upload_request("1b", &[0x00, 0x01], None))
            .await
            .unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("Processing failed"));
    }

    #[tokio::test]
    async fn ambiguous_input_fails_before_any_work() {
        let request = ValidationRequest {
            profile_id: "1b".into(),
            sha1_hex: None,
            url: Some("http://192.0.2.1/doc.pdf".into()),
            upload: Some(MINIMAL_PDF.to_vec()),
        };
        let err = validate(&ctx(), request).await;
        assert!(matches!(err, Err(ValidateError::AmbiguousInput)));
    }
}

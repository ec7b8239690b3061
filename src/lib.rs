//! # pdfconform
//!
//! Validate PDF/A conformance over HTTP: upload a document (or point at a
//! URL), pick a validation profile, and get back either a structured
//! machine-readable result or a rendered HTML report.
//!
//! ## Why a digest in the request?
//!
//! When parsing fails, the server cannot tell a genuinely-not-a-PDF upload
//! apart from bytes corrupted in transit. The optional `sha1Hex` form field
//! carries the client's own digest of the file; the server digests what it
//! actually consumed and compares. A match (or no client digest) means the
//! input truly is not a PDF and the response says so with a 415; a mismatch
//! surfaces the parse error instead, pointing at transport trouble.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /{profile_id}  (multipart: sha1Hex?, url?, file?)
//!  │
//!  ├─ 1. Resolve   exactly one of {upload, URL} → byte stream
//!  │
//!  ├─ direct path (Accept: json/xml)
//!  │    2. Digest   stream flows through a SHA-1 tracker
//!  │    3. Validate engine verdict, digest-based failure disambiguation
//!  │
//!  └─ report path (Accept: text/html)
//!       2. Stage    copy stream to a self-deleting temp file
//!       3. Batch    validate-only processor → MRR XML + run summary
//!       4. Render   MRR + summary → HTML with rule-documentation links
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfconform::{ServiceConfig, ServiceContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let ctx = Arc::new(ServiceContext::new(config));
//!     pdfconform::serve("127.0.0.1:8080".parse()?, ctx).await?;
//!     Ok(())
//! }
//! ```
//!
//! The built-in [`BaselineEngine`] performs deterministic structural checks;
//! a full conformance engine plugs in through
//! [`ServiceContext::with_engine`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfconformd` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder, DEFAULT_WIKI_BASE_URL};
pub use digest::{digest_bytes, ContentDigest, DigestReader};
pub use engine::{
    BaselineEngine, EngineError, Profile, ProfileDirectory, ValidationEngine, ValidationResult,
    ValidatorConfig,
};
pub use error::ValidateError;
pub use pipeline::batch::BatchSummary;
pub use report::{HtmlRenderer, ReportRenderer};
pub use server::{router, serve};
pub use validate::{validate, validate_report, ServiceContext, ValidationRequest};

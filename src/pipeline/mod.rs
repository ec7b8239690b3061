//! Pipeline stages for request handling.
//!
//! Each submodule implements exactly one stage. Keeping stages separate makes
//! each independently testable and lets us swap implementations (e.g. a
//! different staging backend) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! direct result:  input ──▶ digest-tracked stream ──▶ engine ──▶ ValidationResult
//!                 (URL/upload)
//!
//! rendered report: input ──▶ stage ──▶ batch ──▶ render
//!                  (URL/upload) (temp file) (MRR XML + summary) (HTML)
//! ```
//!
//! 1. [`input`] — resolve exactly one of {upload, URL} to a byte stream
//! 2. [`stage`] — persist the stream to a uniquely named temp file so later
//!    stages can re-read it; the artifact deletes itself on drop
//! 3. [`batch`] — run the validate-only processor over the staged artifact,
//!    writing the machine-readable report to an in-memory sink

pub mod batch;
pub mod input;
pub mod stage;

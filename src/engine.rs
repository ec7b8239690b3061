//! Validation-engine interface and the built-in baseline engine.
//!
//! The orchestration layer treats the engine as a collaborator behind
//! [`ValidationEngine`]: give it a byte stream and a [`Profile`], get back a
//! structured [`ValidationResult`] or a typed failure. The three failure
//! modes matter to the caller in different ways:
//!
//! * [`EngineError::Parse`] — the bytes are not interpretable as a PDF at
//!   all. The invoker runs its digest-disambiguation policy on this.
//! * [`EngineError::Io`] — the underlying stream failed mid-read; no verdict
//!   exists.
//! * [`EngineError::Engine`] — unexpected internal failure, propagated.
//!
//! [`BaselineEngine`] is the default wiring: a deterministic structural
//! checker (header, trailer, cross-reference anchor, encryption marker) that
//! streams its input in fixed-size chunks. It deliberately implements only a
//! small slice of any conformance profile; full rule evaluation belongs to an
//! external engine plugged in through the trait.

use crate::error::ValidateError;
use serde::Serialize;
use std::io::Read;
use thiserror::Error;
use tracing::debug;

/// Failures reported by a [`ValidationEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document cannot be interpreted as a PDF.
    #[error("parse failure: {detail}")]
    Parse { detail: String },

    /// The input stream failed while being read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected engine failure.
    #[error("engine failure: {0}")]
    Engine(String),
}

// ── Profiles ─────────────────────────────────────────────────────────────

/// A named conformance profile (PDF/A flavour).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Wire id as it appears in the request path, e.g. `"1b"`.
    pub id: &'static str,
    /// ISO 19005 part number.
    pub part: u8,
    /// Conformance level, `None` for plain PDF/A-4.
    pub level: Option<char>,
}

impl Profile {
    /// Human-readable flavour name, e.g. `PDF/A-2U`.
    pub fn name(&self) -> String {
        match self.level {
            Some(l) => format!("PDF/A-{}{}", self.part, l.to_ascii_uppercase()),
            None => format!("PDF/A-{}", self.part),
        }
    }

    /// The ISO specification the profile's rules come from.
    pub fn specification(&self) -> &'static str {
        match self.part {
            1 => "ISO 19005-1:2005",
            2 => "ISO 19005-2:2011",
            3 => "ISO 19005-3:2012",
            _ => "ISO 19005-4:2020",
        }
    }
}

/// Registry of the profiles this service accepts.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct ProfileDirectory {
    profiles: Vec<Profile>,
}

impl Default for ProfileDirectory {
    fn default() -> Self {
        let mk = |id, part, level| Profile { id, part, level };
        Self {
            profiles: vec![
                mk("1a", 1, Some('a')),
                mk("1b", 1, Some('b')),
                mk("2a", 2, Some('a')),
                mk("2b", 2, Some('b')),
                mk("2u", 2, Some('u')),
                mk("3a", 3, Some('a')),
                mk("3b", 3, Some('b')),
                mk("3u", 3, Some('u')),
                mk("4", 4, None),
                mk("4e", 4, Some('e')),
                mk("4f", 4, Some('f')),
            ],
        }
    }
}

impl ProfileDirectory {
    /// Look up a profile by its wire id (case-insensitive).
    pub fn by_flavour_id(&self, id: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Resolve a profile id or fail with [`ValidateError::UnknownProfile`].
    pub fn require(&self, id: &str) -> Result<&Profile, ValidateError> {
        self.by_flavour_id(id)
            .ok_or_else(|| ValidateError::UnknownProfile { id: id.to_string() })
    }

    /// All registered profiles.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }
}

// ── Validator configuration ──────────────────────────────────────────────

/// Knobs passed to the engine for a single validation run.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Stop recording failed checks past this count. Default: 100.
    pub max_failed_checks: u32,
    /// Record passed checks in the result as well as failed ones.
    /// Default: false — passed checks are counted but not listed.
    pub record_passed_checks: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_failed_checks: 100,
            record_passed_checks: false,
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────────

/// Identifies a single rule within a conformance specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleId {
    pub specification: String,
    pub clause: String,
    pub test_number: u32,
}

/// Outcome of one rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Passed,
    Failed,
}

/// One recorded rule check.
#[derive(Debug, Clone, Serialize)]
pub struct TestAssertion {
    pub rule: RuleId,
    pub status: AssertionStatus,
    pub message: String,
}

/// Structured outcome of validating one document against one profile.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Flavour name, e.g. `"PDF/A-1B"`.
    pub profile: String,
    pub compliant: bool,
    pub statement: String,
    pub total_checks: u32,
    pub passed_checks: u32,
    pub failed_checks: u32,
    /// Recorded assertions, capped by [`ValidatorConfig::max_failed_checks`].
    pub assertions: Vec<TestAssertion>,
}

impl ValidationResult {
    fn from_checks(profile: &Profile, checks: Vec<(RuleId, bool, String)>, config: &ValidatorConfig) -> Self {
        let total = checks.len() as u32;
        let failed = checks.iter().filter(|(_, passed, _)| !passed).count() as u32;
        let mut assertions = Vec::new();
        let mut recorded_failures = 0u32;
        for (rule, passed, message) in checks {
            if passed {
                if config.record_passed_checks {
                    assertions.push(TestAssertion {
                        rule,
                        status: AssertionStatus::Passed,
                        message,
                    });
                }
            } else if recorded_failures < config.max_failed_checks {
                recorded_failures += 1;
                assertions.push(TestAssertion {
                    rule,
                    status: AssertionStatus::Failed,
                    message,
                });
            }
        }
        let compliant = failed == 0;
        Self {
            profile: profile.name(),
            compliant,
            statement: if compliant {
                "PDF file is compliant with Validation Profile requirements.".to_string()
            } else {
                "PDF file is not compliant with Validation Profile requirements.".to_string()
            },
            total_checks: total,
            passed_checks: total - failed,
            failed_checks: failed,
            assertions,
        }
    }
}

// ── Engine trait ─────────────────────────────────────────────────────────

/// A pluggable document-validation engine.
///
/// Implementations must read `input` sequentially and must not assume it is
/// seekable; the orchestration layer stages to a file when re-reads are
/// needed.
pub trait ValidationEngine: Send + Sync {
    fn validate(
        &self,
        input: &mut dyn Read,
        profile: &Profile,
        config: &ValidatorConfig,
    ) -> Result<ValidationResult, EngineError>;
}

// ── Baseline engine ──────────────────────────────────────────────────────

/// Deterministic structural checker used as the default engine.
pub struct BaselineEngine;

const HEADER_PREFIX: &[u8] = b"%PDF-";
const CHUNK_SIZE: usize = 8192;
/// Longest marker we scan for; carried across chunk boundaries.
const MARKER_OVERLAP: usize = 16;

impl ValidationEngine for BaselineEngine {
    fn validate(
        &self,
        input: &mut dyn Read,
        profile: &Profile,
        config: &ValidatorConfig,
    ) -> Result<ValidationResult, EngineError> {
        // Header first. A parse failure here must not consume the rest of
        // the stream: the invoker drains it itself so the digest still
        // covers the full content.
        let mut header = [0u8; 16];
        let mut filled = 0;
        while filled < header.len() {
            let n = input.read(&mut header[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled < HEADER_PREFIX.len() || &header[..HEADER_PREFIX.len()] != HEADER_PREFIX {
            return Err(EngineError::Parse {
                detail: format!(
                    "expected %PDF- header, got {:?}",
                    &header[..filled.min(8)]
                ),
            });
        }

        // Stream the body looking for structural markers. A rolling overlap
        // keeps markers split across chunk boundaries detectable.
        let mut found_eof_marker = false;
        let mut found_startxref = false;
        let mut found_encrypt = false;
        let mut window = header[..filled].to_vec();
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = input.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            window.extend_from_slice(&chunk[..n]);
            found_eof_marker |= contains(&window, b"%%EOF");
            found_startxref |= contains(&window, b"startxref");
            found_encrypt |= contains(&window, b"/Encrypt");
            let keep = window.len().saturating_sub(MARKER_OVERLAP);
            window.drain(..keep);
        }
        // Short documents never grow past the overlap; scan what is left.
        found_eof_marker |= contains(&window, b"%%EOF");
        found_startxref |= contains(&window, b"startxref");
        found_encrypt |= contains(&window, b"/Encrypt");

        debug!(
            profile = %profile.name(),
            eof = found_eof_marker,
            startxref = found_startxref,
            encrypt = found_encrypt,
            "baseline structural scan complete"
        );

        let spec = profile.specification().to_string();
        let rule = |clause: &str, test_number| RuleId {
            specification: spec.clone(),
            clause: clause.to_string(),
            test_number,
        };
        let checks = vec![
            (
                rule("6.1.2", 1),
                true, // reaching this point means the header was well-formed
                "File header begins with %PDF followed by a version".to_string(),
            ),
            (
                rule("6.1.3", 1),
                found_eof_marker,
                "File trailer terminates with the %%EOF marker".to_string(),
            ),
            (
                rule("6.1.4", 1),
                found_startxref,
                "Cross-reference table is anchored by a startxref keyword".to_string(),
            ),
            (
                rule("6.1.3", 2),
                !found_encrypt,
                "Trailer dictionary does not contain the Encrypt key".to_string(),
            ),
        ];
        Ok(ValidationResult::from_checks(profile, checks, config))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn minimal_pdf() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\nstartxref\n9\n%%EOF\n"
            .to_vec()
    }

    fn run(bytes: &[u8], profile_id: &str) -> Result<ValidationResult, EngineError> {
        let dir = ProfileDirectory::default();
        let profile = dir.by_flavour_id(profile_id).unwrap();
        BaselineEngine.validate(
            &mut Cursor::new(bytes.to_vec()),
            profile,
            &ValidatorConfig::default(),
        )
    }

    #[test]
    fn directory_resolves_all_known_flavours() {
        let dir = ProfileDirectory::default();
        for id in ["1a", "1b", "2a", "2b", "2u", "3a", "3b", "3u", "4", "4e", "4f"] {
            assert!(dir.by_flavour_id(id).is_some(), "missing flavour {id}");
        }
        assert!(dir.by_flavour_id("1B").is_some(), "lookup must be case-insensitive");
        assert!(dir.by_flavour_id("9z").is_none());
        assert!(matches!(
            dir.require("9z"),
            Err(ValidateError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn profile_names_and_specifications() {
        let dir = ProfileDirectory::default();
        assert_eq!(dir.by_flavour_id("1b").unwrap().name(), "PDF/A-1B");
        assert_eq!(dir.by_flavour_id("4").unwrap().name(), "PDF/A-4");
        assert_eq!(
            dir.by_flavour_id("2u").unwrap().specification(),
            "ISO 19005-2:2011"
        );
    }

    #[test]
    fn minimal_pdf_is_compliant() {
        let result = run(&minimal_pdf(), "1b").unwrap();
        assert!(result.compliant, "assertions: {:?}", result.assertions);
        assert_eq!(result.failed_checks, 0);
        assert!(result.assertions.is_empty(), "passed checks are not recorded by default");
    }

    #[test]
    fn validation_is_deterministic() {
        let a = run(&minimal_pdf(), "2b").unwrap();
        let b = run(&minimal_pdf(), "2b").unwrap();
        assert_eq!(a.compliant, b.compliant);
        assert_eq!(a.failed_checks, b.failed_checks);
    }

    #[test]
    fn non_pdf_bytes_are_a_parse_error() {
        match run(&[0x00, 0x01, 0x02], "1b") {
            Err(EngineError::Parse { .. }) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_pdf_fails_trailer_rules() {
        let result = run(b"%PDF-1.4\nno trailer here", "1b").unwrap();
        assert!(!result.compliant);
        assert_eq!(result.failed_checks, 2); // %%EOF and startxref missing
        assert!(result
            .assertions
            .iter()
            .all(|a| a.status == AssertionStatus::Failed));
    }

    #[test]
    fn encrypted_pdf_fails_encryption_rule() {
        let mut bytes = minimal_pdf();
        let tail = b"trailer\n<< /Encrypt 5 0 R >>\nstartxref\n9\n%%EOF\n";
        bytes.extend_from_slice(tail);
        let result = run(&bytes, "1b").unwrap();
        assert!(!result.compliant);
        assert!(result
            .assertions
            .iter()
            .any(|a| a.rule.clause == "6.1.3" && a.rule.test_number == 2));
    }

    #[test]
    fn marker_split_across_chunk_boundary_is_found() {
        // Pad so "%%EOF" straddles the 8 KiB chunk boundary.
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(16 + CHUNK_SIZE - 2, b' '); // header read consumes 16
        bytes.extend_from_slice(b"startxref\n42\n%%EOF\n");
        let result = run(&bytes, "3b").unwrap();
        assert!(result.compliant, "assertions: {:?}", result.assertions);
    }

    #[test]
    fn max_failed_checks_caps_recorded_assertions() {
        let config = ValidatorConfig {
            max_failed_checks: 1,
            record_passed_checks: false,
        };
        let dir = ProfileDirectory::default();
        let profile = dir.by_flavour_id("1b").unwrap();
        let result = BaselineEngine
            .validate(&mut Cursor::new(b"%PDF-1.4\nshort".to_vec()), profile, &config)
            .unwrap();
        assert_eq!(result.failed_checks, 2);
        assert_eq!(result.assertions.len(), 1);
    }

    #[test]
    fn record_passed_checks_lists_everything() {
        let config = ValidatorConfig {
            max_failed_checks: 100,
            record_passed_checks: true,
        };
        let dir = ProfileDirectory::default();
        let profile = dir.by_flavour_id("1b").unwrap();
        let result = BaselineEngine
            .validate(&mut Cursor::new(minimal_pdf()), profile, &config)
            .unwrap();
        assert_eq!(result.assertions.len(), result.total_checks as usize);
    }
}

//! Batch pipeline: run the processor task set over a staged artifact.
//!
//! The report path never validates a live stream; it runs a configured
//! processor over the staged file and collects two things at once — the
//! machine-readable report written to an in-memory sink, and a
//! [`BatchSummary`] of the run. Feature extraction and metadata fixing exist
//! in the task model but run with their default, effectively inert,
//! configurations here: only the validate task does work on this path.
//!
//! Per-item I/O failure is deliberately lossy: the run completes with an
//! absent summary rather than an error, and callers must treat an absent
//! summary as "no report produced". Sink write failure is not lossy — a
//! report we cannot write is a hard [`ValidateError::PipelineIo`].

use crate::engine::{EngineError, Profile, ValidationEngine, ValidatorConfig};
use crate::error::ValidateError;
use crate::pipeline::stage::StagedArtifact;
use crate::report::MrrWriter;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// Tasks the processor can run over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Validate,
    ExtractFeatures,
    FixMetadata,
}

/// Feature-extraction configuration. The default extracts nothing.
#[derive(Debug, Clone, Default)]
pub struct FeatureConfig {
    pub enabled_features: Vec<String>,
}

/// Metadata-fixer configuration. The default fixes nothing.
#[derive(Debug, Clone, Default)]
pub struct FixerConfig {
    pub enabled: bool,
}

/// Full processor configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub validator: ValidatorConfig,
    pub features: FeatureConfig,
    pub fixer: FixerConfig,
    pub tasks: Vec<TaskType>,
}

impl ProcessorConfig {
    /// The report-path configuration: validate only, inert feature and
    /// fixer configs.
    pub fn validate_only(validator: ValidatorConfig) -> Self {
        Self {
            validator,
            features: FeatureConfig::default(),
            fixer: FixerConfig::default(),
            tasks: vec![TaskType::Validate],
        }
    }
}

/// Aggregate statistics for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_jobs: u32,
    /// Items whose parse failed before rules could run.
    pub failed_jobs: u32,
    pub valid: u32,
    pub invalid: u32,
    pub duration_ms: u64,
}

/// Run the configured task set over a single-item batch.
///
/// Returns the machine-readable report bytes and, when the run completed,
/// the batch summary. An absent summary means an I/O failure interrupted
/// processing; the partial report bytes are still returned for diagnostics.
pub fn run(
    engine: &dyn ValidationEngine,
    artifact: &StagedArtifact,
    profile: &Profile,
    config: &ProcessorConfig,
) -> Result<(Vec<u8>, Option<BatchSummary>), ValidateError> {
    let start = Instant::now();
    let mut writer =
        MrrWriter::new(Vec::new()).map_err(|source| ValidateError::PipelineIo { source })?;

    if !config.tasks.contains(&TaskType::Validate) {
        // Nothing to do on this path; features/fixes are inert by default.
        debug!("task set contains no validate task; producing an empty report");
        let summary = BatchSummary {
            total_jobs: 0,
            failed_jobs: 0,
            valid: 0,
            invalid: 0,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        let bytes = writer
            .finish(Some(&summary))
            .map_err(|source| ValidateError::PipelineIo { source })?;
        return Ok((bytes, Some(summary)));
    }

    let item_name = artifact.path().display().to_string();
    let mut file = match artifact.open() {
        Ok(f) => f,
        Err(e) => {
            warn!(item = %item_name, error = %e, "could not open staged artifact; no report produced");
            let bytes = writer
                .finish(None)
                .map_err(|source| ValidateError::PipelineIo { source })?;
            return Ok((bytes, None));
        }
    };

    let (valid, invalid, failed_jobs) = match engine.validate(&mut file, profile, &config.validator)
    {
        Ok(result) => {
            let valid = u32::from(result.compliant);
            writer
                .job(&item_name, artifact.size_bytes(), &result)
                .map_err(|source| ValidateError::PipelineIo { source })?;
            (valid, 1 - valid, 0)
        }
        Err(EngineError::Parse { detail }) => {
            writer
                .failed_job(&item_name, &detail)
                .map_err(|source| ValidateError::PipelineIo { source })?;
            (0, 0, 1)
        }
        Err(EngineError::Io(e)) => {
            warn!(item = %item_name, error = %e, "I/O failure during processing; no report produced");
            let bytes = writer
                .finish(None)
                .map_err(|source| ValidateError::PipelineIo { source })?;
            return Ok((bytes, None));
        }
        Err(EngineError::Engine(detail)) => {
            return Err(ValidateError::Engine { detail });
        }
    };

    let summary = BatchSummary {
        total_jobs: 1,
        failed_jobs,
        valid,
        invalid,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(?summary, "pipeline run complete");
    let bytes = writer
        .finish(Some(&summary))
        .map_err(|source| ValidateError::PipelineIo { source })?;
    Ok((bytes, Some(summary)))
}

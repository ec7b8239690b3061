//! Service configuration.
//!
//! All request-handling behaviour is controlled through [`ServiceConfig`],
//! built via its [`ServiceConfigBuilder`]. The config is constructed once at
//! process startup, frozen inside the service context, and shared read-only
//! across requests — there is deliberately no way to mutate it afterwards.

use crate::engine::ValidatorConfig;
use crate::error::ValidateError;

/// Base URL prepended to rule clauses when the HTML report links a failed
/// rule to its documentation page.
pub const DEFAULT_WIKI_BASE_URL: &str =
    "https://github.com/veraPDF/veraPDF-validation-profiles/wiki/";

/// Configuration for the validation service.
///
/// # Example
/// ```rust
/// use pdfconform::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .download_timeout_secs(30)
///     .max_failed_checks(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL for rule-reference links in rendered reports.
    /// Default: [`DEFAULT_WIKI_BASE_URL`].
    pub wiki_base_url: String,

    /// Timeout for fetching URL inputs, in seconds. Default: 120.
    ///
    /// A single fetch attempt is made per request; there is no retry. The
    /// timeout bounds how long a request handler can stall on a slow remote.
    pub download_timeout_secs: u64,

    /// Stop recording failed rule checks past this count. Default: 100.
    pub max_failed_checks: u32,

    /// Record passed checks in structured results. Default: false.
    pub record_passed_checks: bool,

    /// Produce verbose HTML reports (include passed rules). Default: false.
    pub verbose_reports: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            wiki_base_url: DEFAULT_WIKI_BASE_URL.to_string(),
            download_timeout_secs: 120,
            max_failed_checks: 100,
            record_passed_checks: false,
            verbose_reports: false,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// The validator knobs derived from this config.
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            max_failed_checks: self.max_failed_checks,
            record_passed_checks: self.record_passed_checks,
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn wiki_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.wiki_base_url = url.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn max_failed_checks(mut self, n: u32) -> Self {
        self.config.max_failed_checks = n;
        self
    }

    pub fn record_passed_checks(mut self, v: bool) -> Self {
        self.config.record_passed_checks = v;
        self
    }

    pub fn verbose_reports(mut self, v: bool) -> Self {
        self.config.verbose_reports = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ValidateError> {
        let c = &self.config;
        if c.wiki_base_url.is_empty() {
            return Err(ValidateError::InvalidConfig(
                "wiki_base_url must not be empty".into(),
            ));
        }
        if !c.wiki_base_url.starts_with("http://") && !c.wiki_base_url.starts_with("https://") {
            return Err(ValidateError::InvalidConfig(format!(
                "wiki_base_url must be an HTTP(S) URL, got '{}'",
                c.wiki_base_url
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let c = ServiceConfig::builder().build().unwrap();
        assert_eq!(c.wiki_base_url, DEFAULT_WIKI_BASE_URL);
        assert_eq!(c.download_timeout_secs, 120);
        assert_eq!(c.max_failed_checks, 100);
    }

    #[test]
    fn timeout_is_clamped_to_at_least_one_second() {
        let c = ServiceConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.download_timeout_secs, 1);
    }

    #[test]
    fn rejects_non_http_wiki_base() {
        let err = ServiceConfig::builder()
            .wiki_base_url("ftp://example.com/")
            .build();
        assert!(matches!(err, Err(ValidateError::InvalidConfig(_))));
    }

    #[test]
    fn validator_config_mirrors_service_knobs() {
        let c = ServiceConfig::builder()
            .max_failed_checks(7)
            .record_passed_checks(true)
            .build()
            .unwrap();
        let v = c.validator_config();
        assert_eq!(v.max_failed_checks, 7);
        assert!(v.record_passed_checks);
    }
}

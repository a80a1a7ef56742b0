//! Configuration types for a pdf2sheets run.
//!
//! Everything a run needs beyond its collaborators (document source,
//! extraction client, sheet store) lives in [`RunConfig`], built via
//! [`RunConfigBuilder`].

use crate::error::Pdf2SheetsError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default number of pages sent to the extraction service per request.
pub const DEFAULT_MAX_PAGES_PER_BATCH: usize = 10;

/// Configuration for one processing run.
///
/// # Example
/// ```rust
/// use pdf2sheets::{EmptyPagePolicy, RunConfig};
///
/// let config = RunConfig::builder("https://extract.example.com/")
///     .max_pages_per_batch(5)
///     .empty_page_policy(EmptyPagePolicy::Release)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages_per_batch, 5);
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// URL of the extraction service. Each batch is POSTed here.
    pub endpoint: String,

    /// Maximum pages per batch. Default: 10. Never 0.
    pub max_pages_per_batch: usize,

    /// Per-request timeout in seconds.
    ///
    /// `None` leaves the HTTP client's own default in force.
    pub request_timeout_secs: Option<u64>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Clean service output before parsing (outer fences, CRLF, invisible
    /// characters). Default: true.
    pub clean_markdown: bool,

    /// Whether a page whose marker was seen but whose content is empty keeps
    /// its old sheet alive. Default: [`EmptyPagePolicy::Retain`].
    pub empty_page_policy: EmptyPagePolicy,

    /// Explicit path to libpdfium. If None, `./` and then the system library
    /// are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional per-batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("endpoint", &self.endpoint)
            .field("max_pages_per_batch", &self.max_pages_per_batch)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("clean_markdown", &self.clean_markdown)
            .field("empty_page_policy", &self.empty_page_policy)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder targeting `endpoint`.
    pub fn builder(endpoint: impl Into<String>) -> RunConfigBuilder {
        RunConfigBuilder {
            config: RunConfig {
                endpoint: endpoint.into(),
                max_pages_per_batch: DEFAULT_MAX_PAGES_PER_BATCH,
                request_timeout_secs: None,
                password: None,
                clean_markdown: true,
                empty_page_policy: EmptyPagePolicy::default(),
                pdfium_lib_path: None,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`RunConfig`].
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn max_pages_per_batch(mut self, n: usize) -> Self {
        self.config.max_pages_per_batch = n.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn clean_markdown(mut self, v: bool) -> Self {
        self.config.clean_markdown = v;
        self
    }

    pub fn empty_page_policy(mut self, policy: EmptyPagePolicy) -> Self {
        self.config.empty_page_policy = policy;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Pdf2SheetsError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
            Pdf2SheetsError::InvalidConfig(format!("endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Pdf2SheetsError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(Pdf2SheetsError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a page marker with empty content means for cleanup.
///
/// A marker such as `## Page 4` followed by nothing writes no sheet. The
/// question is whether an existing `d04` from an earlier run survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyPagePolicy {
    /// The page counts as produced; an existing sheet is kept with its old
    /// content. (default)
    #[default]
    Retain,
    /// The page counts as absent; an existing sheet is deleted at cleanup.
    Release,
}

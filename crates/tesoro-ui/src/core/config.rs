//! Client configuration with serde defaults.
//!
//! # Design
//! - Every field has a default so a partial JSON document is enough.
//! - Validation runs once at load time; controllers trust the result.

use serde::Deserialize;
use thiserror::Error;

use crate::features::lists::mutation::MutationPolicy;
use crate::features::lists::retry::RetryPolicy;

/// Default API base URL, relative to the dashboard origin.
pub const DEFAULT_API_BASE_URL: &str = "/api";
/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 15;
/// Default debounce delay for free-text filters.
pub const DEFAULT_DEBOUNCE_MS: u64 = 350;
/// Default age after which cached pages refetch on access.
pub const DEFAULT_STALE_TIME_MS: u64 = 30_000;
/// Default HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading [`UiConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document was not valid JSON for this schema.
    #[error("failed to parse ui configuration")]
    Parse {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A field held an unusable value.
    #[error("invalid ui configuration field `{field}`: {reason}")]
    InvalidField {
        /// Offending field.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
    },
}

/// Runtime configuration for the admin client.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Base URL every endpoint path is appended to.
    pub api_base_url: String,
    /// Page size used when the URL carries none.
    pub default_page_size: u32,
    /// Choices offered by the page-size selector.
    pub page_size_options: Vec<u32>,
    /// Debounce delay for free-text filters.
    pub debounce_ms: u64,
    /// Age after which a cached page is refetched on access.
    pub stale_time_ms: u64,
    /// Retry policy for list fetches.
    pub retry: RetryPolicy,
    /// How overlapping mutations on one record are handled.
    pub mutation_policy: MutationPolicy,
    /// HTTP timeout applied by the transport.
    pub request_timeout_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 15, 25, 50],
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            stale_time_ms: DEFAULT_STALE_TIME_MS,
            retry: RetryPolicy::default(),
            mutation_policy: MutationPolicy::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl UiConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields and
    /// [`ConfigError::InvalidField`] when a value fails validation.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        config.validated()
    }

    /// Normalize and validate an in-memory configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidField`] when a value fails validation.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(&self.api_base_url);
        if self.api_base_url.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "api_base_url",
                reason: "must not be empty",
            });
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidField {
                field: "default_page_size",
                reason: "must be positive",
            });
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidField {
                field: "page_size_options",
                reason: "must contain only positive sizes",
            });
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::InvalidField {
                field: "retry.max_delay_ms",
                reason: "must not be below retry.base_delay_ms",
            });
        }
        Ok(self)
    }

    /// Join an endpoint path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

/// Trim whitespace and a trailing slash from a base URL.
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

//! Cache-Control injection.
//!
//! Adds the configured `Cache-Control` value to responses that are safe to
//! cache. A value set by the handler (or any inner stage) always wins.
//!
//! # Exclusion rule
//!
//! Each exclusion pattern is a regular expression anchored at the **start**
//! of the request path only. `/healthz` therefore excludes `/healthz` and
//! `/healthzz` but not `/v1/healthz`. Append `$` to a pattern for an exact
//! match.

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use http::header::{HeaderValue, CACHE_CONTROL};
use http::Method;
use regex::Regex;

use super::headers::insert_if_absent;
use super::Stage;
use crate::error::PipelineError;

/// Default status threshold: responses with status `>=` this are never cached.
pub const DEFAULT_CACHE_CONTROL_MAX_STATUS: u16 = 500;

// =============================================================================
// ExclusionSet
// =============================================================================

/// Path patterns that never receive an injected `Cache-Control`.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from regular expressions.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for pattern in patterns {
            set.push_pattern(pattern.as_ref())?;
        }
        Ok(set)
    }

    /// Add a regular expression, anchored at the start of the path.
    pub fn push_pattern(&mut self, pattern: &str) -> Result<(), PipelineError> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            PipelineError::InvalidExcludePattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.patterns.push(regex);
        Ok(())
    }

    /// Add a literal path prefix (regex metacharacters are escaped).
    pub fn push_prefix(&mut self, prefix: &str) {
        // An escaped literal is always a valid expression
        if let Ok(regex) = Regex::new(&format!("^{}", regex::escape(prefix))) {
            self.patterns.push(regex);
        }
    }

    /// Whether `path` matches any pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for [`CacheControlStage`].
#[derive(Debug, Clone)]
pub struct CacheControlConfig {
    /// Value to inject; `None` disables injection entirely
    pub value: Option<HeaderValue>,

    /// Responses with a status code `>=` this are left alone
    pub max_status: u16,

    /// Paths that never receive the header
    pub exclude: ExclusionSet,
}

impl CacheControlConfig {
    /// Create a configuration injecting `value`.
    pub fn new(value: &str) -> Result<Self, PipelineError> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| PipelineError::InvalidCacheControl(value.to_string()))?;
        Ok(Self {
            value: Some(value),
            max_status: DEFAULT_CACHE_CONTROL_MAX_STATUS,
            exclude: ExclusionSet::new(),
        })
    }

    /// A configuration that never injects anything.
    pub fn disabled() -> Self {
        Self {
            value: None,
            max_status: DEFAULT_CACHE_CONTROL_MAX_STATUS,
            exclude: ExclusionSet::new(),
        }
    }

    /// Set the status threshold.
    pub fn with_max_status(mut self, max_status: u16) -> Self {
        self.max_status = max_status;
        self
    }

    /// Set the exclusion set.
    pub fn with_exclude(mut self, exclude: ExclusionSet) -> Self {
        self.exclude = exclude;
        self
    }
}

impl Default for CacheControlConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Injects `Cache-Control` on cacheable GET/HEAD responses.
#[derive(Debug, Clone)]
pub struct CacheControlStage {
    config: CacheControlConfig,
}

impl CacheControlStage {
    /// Create the stage.
    pub fn new(config: CacheControlConfig) -> Self {
        Self { config }
    }

    fn is_eligible(&self, method: &Method, path: &str) -> bool {
        (method == Method::GET || method == Method::HEAD) && !self.config.exclude.is_excluded(path)
    }
}

#[async_trait]
impl Stage for CacheControlStage {
    fn name(&self) -> &'static str {
        "cache-control"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        let value = match &self.config.value {
            Some(value) => value.clone(),
            None => return next.run(request).await,
        };

        let eligible = self.is_eligible(request.method(), request.uri().path());
        let mut response = next.run(request).await;

        if eligible && response.status().as_u16() < self.config.max_status {
            insert_if_absent(response.headers_mut(), CACHE_CONTROL, value);
        }

        response
    }
}

// =============================================================================
// Tests
// =============================================================================

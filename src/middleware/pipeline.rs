//! Pipeline assembly from configuration.

use std::sync::Arc;

use super::{
    BoxedStage, CacheControlConfig, CacheControlStage, FormatGuardConfig, FormatGuardStage,
    QueryNormalizationStage, RequestLoggingConfig, RequestLoggingStage, TimingStage,
};
use crate::probe::RasterOpener;

/// The stages the gateway knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    FormatGuard,
    QueryNormalization,
    Timing,
    RequestLogging,
    CacheControl,
}

impl StageKind {
    /// Position in the default order, outermost first.
    fn rank(self) -> u8 {
        match self {
            StageKind::FormatGuard => 0,
            StageKind::QueryNormalization => 1,
            StageKind::Timing => 2,
            StageKind::RequestLogging => 3,
            StageKind::CacheControl => 4,
        }
    }

    /// Short name, as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            StageKind::FormatGuard => "format-guard",
            StageKind::QueryNormalization => "lowercase-query",
            StageKind::Timing => "timing",
            StageKind::RequestLogging => "request-logging",
            StageKind::CacheControl => "cache-control",
        }
    }
}

/// Which stages run, in what order, with what settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Enabled stages, outermost first
    pub order: Vec<StageKind>,

    pub cache_control: CacheControlConfig,
    pub request_logging: RequestLoggingConfig,
    pub format_guard: FormatGuardConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            order: vec![StageKind::FormatGuard, StageKind::CacheControl],
            cache_control: CacheControlConfig::default(),
            request_logging: RequestLoggingConfig::default(),
            format_guard: FormatGuardConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Default pipeline: format guard and cache control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache-control configuration.
    pub fn with_cache_control(mut self, config: CacheControlConfig) -> Self {
        self.cache_control = config;
        self
    }

    /// Set the request-logging configuration.
    pub fn with_request_logging(mut self, config: RequestLoggingConfig) -> Self {
        self.request_logging = config;
        self
    }

    /// Set the format-guard configuration.
    pub fn with_format_guard(mut self, config: FormatGuardConfig) -> Self {
        self.format_guard = config;
        self
    }

    /// Debug mode: request logging (with query and headers) plus timing.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        if enabled {
            self.request_logging.query_params = true;
            self.request_logging.headers = true;
        }
        self.set_enabled(StageKind::RequestLogging, enabled);
        self.set_enabled(StageKind::Timing, enabled);
        self
    }

    /// Toggle query key lower-casing.
    pub fn with_lower_case_query(mut self, enabled: bool) -> Self {
        self.set_enabled(StageKind::QueryNormalization, enabled);
        self
    }

    /// Replace the order outright. Duplicates are kept.
    pub fn with_order(mut self, order: Vec<StageKind>) -> Self {
        self.order = order;
        self
    }

    /// Whether `kind` is part of the pipeline.
    pub fn is_enabled(&self, kind: StageKind) -> bool {
        self.order.contains(&kind)
    }

    /// Add `kind` at its default position, or remove every occurrence.
    pub fn set_enabled(&mut self, kind: StageKind, enabled: bool) {
        if !enabled {
            self.order.retain(|k| *k != kind);
            return;
        }
        if self.is_enabled(kind) {
            return;
        }
        let at = self
            .order
            .iter()
            .position(|k| k.rank() > kind.rank())
            .unwrap_or(self.order.len());
        self.order.insert(at, kind);
    }

    /// Instantiate the configured stages, outermost first.
    pub fn build_stages(&self, opener: Arc<dyn RasterOpener>) -> Vec<BoxedStage> {
        self.order
            .iter()
            .map(|kind| -> BoxedStage {
                match kind {
                    StageKind::FormatGuard => Arc::new(FormatGuardStage::new(
                        Arc::clone(&opener),
                        self.format_guard.clone(),
                    )),
                    StageKind::QueryNormalization => Arc::new(QueryNormalizationStage::new()),
                    StageKind::Timing => Arc::new(TimingStage::new()),
                    StageKind::RequestLogging => {
                        Arc::new(RequestLoggingStage::new(self.request_logging.clone()))
                    }
                    StageKind::CacheControl => {
                        Arc::new(CacheControlStage::new(self.cache_control.clone()))
                    }
                }
            })
            .collect()
    }
}

use std::collections::HashSet;

use serde::Deserialize;
use serde_yaml::Mapping;

use logcount_core::error::{LogCountError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub version: u32,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(LogCountError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.filters.is_empty() {
            return Err(LogCountError::InvalidConfig("filters must not be empty".into()));
        }

        self.pipeline.validate()?;

        let mut seen = HashSet::new();
        for f in &self.filters {
            f.validate()?;
            if !seen.insert(f.name.as_str()) {
                return Err(LogCountError::InvalidConfig(format!(
                    "duplicate filter name: {}",
                    f.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Output packs shared by all filters.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Per-filter inbound queue length.
    #[serde(default = "default_plugin_chan_size")]
    pub plugin_chan_size: usize,

    /// Queue between injecting filters and the output sink.
    #[serde(default = "default_output_chan_size")]
    pub output_chan_size: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            plugin_chan_size: default_plugin_chan_size(),
            output_chan_size: default_output_chan_size(),
        }
    }
}

impl PipelineSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.pool_size) {
            return Err(LogCountError::InvalidConfig(
                "pipeline.pool_size must be between 1 and 10000".into(),
            ));
        }
        if !(1..=100_000).contains(&self.plugin_chan_size) {
            return Err(LogCountError::InvalidConfig(
                "pipeline.plugin_chan_size must be between 1 and 100000".into(),
            ));
        }
        if !(1..=100_000).contains(&self.output_chan_size) {
            return Err(LogCountError::InvalidConfig(
                "pipeline.output_chan_size must be between 1 and 100000".into(),
            ));
        }
        Ok(())
    }
}

fn default_pool_size() -> usize {
    100
}
fn default_plugin_chan_size() -> usize {
    30
}
fn default_output_chan_size() -> usize {
    256
}

/// One filter instance. Keys other than `name`, `type` and `message_matcher`
/// are plugin settings and are handed to the plugin unparsed.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub message_matcher: Option<String>,

    #[serde(flatten)]
    pub settings: Mapping,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LogCountError::InvalidConfig("filter name must not be empty".into()));
        }
        if self.kind.trim().is_empty() {
            return Err(LogCountError::InvalidConfig(format!(
                "filter {} has an empty type",
                self.name
            )));
        }
        Ok(())
    }
}

//! Configuration for an extraction-flow session.
//!
//! All session behaviour is controlled through [`FlowConfig`], built via its
//! [`FlowConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config across components and to diff two sessions when their
//! audit logs differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest; `build()` validates the result.

use crate::client::ApiTransport;
use crate::error::FlowError;
use crate::prompts::{DEFAULT_PROMPT_TEMPLATE, INPUT_PLACEHOLDER};
use std::fmt;
use std::sync::Arc;

/// Default root of the remote processing service.
pub const DEFAULT_BASE_URL: &str = "https://builder.impromptu-labs.com/api_tools";

/// Configuration for a [`crate::flow::FlowController`] session.
///
/// Built via [`FlowConfig::builder()`] or [`FlowConfig::default()`].
///
/// # Example
/// ```rust
/// use extractflow::FlowConfig;
///
/// let config = FlowConfig::builder()
///     .base_url("https://staging.example.com/api_tools")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FlowConfig {
    /// Root URL of the remote processing service. Default: [`DEFAULT_BASE_URL`].
    ///
    /// Paths (`/input_data`, `/apply_prompt`, `/objects/{name}`) are appended
    /// to this root; a trailing slash is tolerated.
    pub base_url: String,

    /// Per-remote-call timeout in seconds. Default: 60.
    ///
    /// Each call is attempted exactly once (there is no retry layer), so
    /// this bounds how long a single flow step can stall on the network.
    pub api_timeout_secs: u64,

    /// Type tag sent in every createObject request. Default: `"strings"`.
    pub data_type: String,

    /// Processing mode for the extraction job's input binding.
    /// Default: `"combine_events"`; the service combines the whole uploaded
    /// batch into one extraction input.
    pub processing_mode: String,

    /// Prompt template for extraction jobs. Default:
    /// [`DEFAULT_PROMPT_TEMPLATE`]. Must contain the `{input_data}`
    /// placeholder (validated in `build()`).
    pub prompt_template: String,

    /// Pre-constructed transport. Takes precedence over the reqwest-based
    /// default; the main use is injecting a scripted transport in tests.
    pub transport: Option<Arc<dyn ApiTransport>>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: 60,
            data_type: "strings".to_string(),
            processing_mode: "combine_events".to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            transport: None,
        }
    }
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("base_url", &self.base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("data_type", &self.data_type)
            .field("processing_mode", &self.processing_mode)
            .field("prompt_template", &self.prompt_template)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn ApiTransport>"))
            .finish()
    }
}

impl FlowConfig {
    /// Create a new builder for `FlowConfig`.
    pub fn builder() -> FlowConfigBuilder {
        FlowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`FlowConfig`].
#[derive(Debug)]
pub struct FlowConfigBuilder {
    config: FlowConfig,
}

impl FlowConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn data_type(mut self, tag: impl Into<String>) -> Self {
        self.config.data_type = tag.into();
        self
    }

    pub fn processing_mode(mut self, mode: impl Into<String>) -> Self {
        self.config.processing_mode = mode.into();
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ApiTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FlowConfig, FlowError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(FlowError::InvalidConfig("base_url must not be empty".into()));
        }
        if !c.prompt_template.contains(INPUT_PLACEHOLDER) {
            return Err(FlowError::InvalidConfig(format!(
                "prompt_template must contain the {INPUT_PLACEHOLDER} placeholder"
            )));
        }
        if c.data_type.is_empty() {
            return Err(FlowError::InvalidConfig("data_type must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FlowConfig::builder().build().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.data_type, "strings");
        assert_eq!(config.processing_mode, "combine_events");
        assert_eq!(config.api_timeout_secs, 60);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = FlowConfig::builder()
            .base_url("https://example.com/api/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "https://example.com/api");
    }

    #[test]
    fn prompt_without_placeholder_is_rejected() {
        let err = FlowConfig::builder()
            .prompt_template("extract everything")
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidConfig(_)));
    }

    #[test]
    fn timeout_floor_is_one_second() {
        let config = FlowConfig::builder().api_timeout_secs(0).build().unwrap();
        assert_eq!(config.api_timeout_secs, 1);
    }
}

//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads and to diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Doc2MdError;
use crate::pipeline::client::ChatBackend;
use crate::progress::ConversionProgress;
use std::fmt;
use std::sync::Arc;

/// Default chat-completions endpoint. Any OpenAI-compatible server works
/// (Ollama, vLLM, LiteLLM, OpenRouter) via [`ConversionConfigBuilder::base_url`].
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a document-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .respect_pages(true)
///     .model("gpt-4o")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Instruct the model to preserve per-page boundaries in the output.
    /// Default: false (continuous content is merged across pages and
    /// repeated headers/footers are stripped).
    pub respect_pages: bool,

    /// Render scale for PDF page screenshots. Range: 0.5–4.0. Default: 1.5.
    ///
    /// 1.5 keeps text sharp enough for the model to read layout reliably
    /// while base64 payloads stay well below typical API upload limits.
    pub render_scale: f32,

    /// Model identifier sent to the endpoint.
    pub model: String,

    /// Base URL of the chat-completions endpoint.
    pub base_url: String,

    /// API credential. When `None`, [`crate::credentials::resolve_api_key`]
    /// is consulted at conversion time.
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the extracted content —
    /// exactly what you want for transcription. Higher values introduce
    /// creativity that worsens accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the whole document. Default: 8192.
    pub max_tokens: usize,

    /// Pre-constructed wire backend. Takes precedence over `base_url`.
    ///
    /// Injection point for tests and custom transports (caching proxies,
    /// recorded responses).
    pub backend: Option<Arc<dyn ChatBackend>>,

    /// Progress callback invoked at pipeline stage boundaries.
    pub progress: Option<Arc<dyn ConversionProgress>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            respect_pages: false,
            render_scale: 1.5,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 8192,
            backend: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("respect_pages", &self.respect_pages)
            .field("render_scale", &self.render_scale)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ChatBackend>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn respect_pages(mut self, v: bool) -> Self {
        self.config.respect_pages = v;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 4.0);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ConversionProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2MdError> {
        let c = &self.config;
        if !(0.5..=4.0).contains(&c.render_scale) {
            return Err(Doc2MdError::InvalidConfig(format!(
                "render_scale must be 0.5–4.0, got {}",
                c.render_scale
            )));
        }
        if c.model.is_empty() {
            return Err(Doc2MdError::InvalidConfig("model must not be empty".into()));
        }
        if c.base_url.is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Doc2MdError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_merge_pages() {
        let config = ConversionConfig::default();
        assert!(!config.respect_pages);
        assert_eq!(config.render_scale, 1.5);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps_render_scale() {
        let config = ConversionConfig::builder()
            .render_scale(10.0)
            .build()
            .unwrap();
        assert_eq!(config.render_scale, 4.0);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let result = ConversionConfig::builder().model("").build();
        assert!(matches!(result, Err(Doc2MdError::InvalidConfig(_))));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ConversionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("redacted"));
    }
}

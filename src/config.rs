//! Client configuration.
//!
//! Everything that decides *which* backend is talked to and *how* lives in
//! [`ClientConfig`], built via [`ClientConfigBuilder`]. The builder validates
//! the backend URL once so the HTTP layer can join endpoint paths without
//! re-checking.

use crate::error::FileConvError;
use crate::format::FormatInference;
use reqwest::Url;

/// Backend address used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Configuration for talking to the conversion backend.
///
/// # Example
/// ```rust
/// use fileconv::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .backend_url("http://localhost:8000")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.backend_url, "http://localhost:8000/");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, validated by the builder. Always ends with `/`.
    pub backend_url: String,

    /// Per-request timeout in seconds. Default: `None` (transport default).
    ///
    /// Steps are never retried, so a timeout only turns a hung request into a
    /// terminal "try again" message sooner.
    pub request_timeout_secs: Option<u64>,

    /// How the source format is derived from a selected file.
    pub format_inference: FormatInference,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: format!("{DEFAULT_BACKEND_URL}/"),
            request_timeout_secs: None,
            format_inference: FormatInference::default(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
            raw_url: None,
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    raw_url: Option<String>,
}

impl ClientConfigBuilder {
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.raw_url = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn format_inference(mut self, inference: FormatInference) -> Self {
        self.config.format_inference = inference;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, FileConvError> {
        if let Some(raw) = self.raw_url.take() {
            self.config.backend_url = parse_backend_url(&raw)?.into();
        }
        if self.config.request_timeout_secs == Some(0) {
            return Err(FileConvError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Parse and normalise a backend base URL so that `Url::join` keeps any path
/// prefix (`http://host/api` → `http://host/api/`).
pub(crate) fn parse_backend_url(raw: &str) -> Result<Url, FileConvError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw)
        .map_err(|e| FileConvError::InvalidConfig(format!("Backend URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FileConvError::InvalidConfig(format!(
            "Backend URL must be http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(FileConvError::InvalidConfig(format!(
            "Backend URL '{raw}' must not carry a query or fragment"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

//! reqwest implementation of [`ConversionBackend`].

use super::wire::{self, ConvertResponse, UploadResponse};
use super::{ConversionBackend, DownloadedFile, UploadReceipt};
use crate::config::{parse_backend_url, ClientConfig};
use crate::error::{ApiError, FileConvError};
use crate::format::FormatToken;
use crate::session::SessionId;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;

/// HTTP client for one backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, FileConvError> {
        let base = parse_backend_url(&config.backend_url)?;
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| FileConvError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| ApiError::Transport(format!("bad endpoint '{path}': {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path, query)?;
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    /// Send and turn any non-2xx into an [`ApiError`].
    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = wire::error_from_status(status.as_u16(), &body);
        debug!("backend error: {}", err);
        Err(err)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::GET, path, query)?).await?;
        let body = response.bytes().await?;
        wire::decode(endpoint, &body)
    }
}

impl ConversionBackend for HttpBackend {
    async fn supported_formats(&self) -> Result<Vec<FormatToken>, ApiError> {
        self.get_json("supported-formats", "supported-formats/", &[])
            .await
    }

    async fn correct_format(&self, raw: &FormatToken) -> Result<FormatToken, ApiError> {
        let corrected: String = self
            .get_json("correct-format", "correct-format/", &[("format", raw.as_str())])
            .await?;
        FormatToken::new(&corrected)
            .ok_or_else(|| ApiError::Malformed("correct-format: empty format".into()))
    }

    async fn supported_conversions(
        &self,
        format: &FormatToken,
    ) -> Result<Vec<FormatToken>, ApiError> {
        self.get_json(
            "supported-conversions",
            "supported-conversions/",
            &[("format", format.as_str())],
        )
        .await
    }

    async fn is_valid_conversion(
        &self,
        from: &FormatToken,
        to: &FormatToken,
    ) -> Result<bool, ApiError> {
        self.get_json(
            "is-valid-conversion",
            "is-valid-conversion/",
            &[("from_format", from.as_str()), ("to_format", to.as_str())],
        )
        .await
    }

    async fn upload(
        &self,
        file_name: &str,
        contents: &[u8],
        session: &SessionId,
    ) -> Result<UploadReceipt, ApiError> {
        let part = Part::bytes(contents.to_vec()).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let request = self
            .request(Method::POST, "upload/", &[("session_id", session.as_str())])?
            .multipart(form);
        let body = Self::send(request).await?.bytes().await?;
        let parsed: UploadResponse = wire::decode("upload", &body)?;
        if parsed.session_id.is_new() {
            return Err(ApiError::Malformed(
                "upload: backend did not issue a session id".into(),
            ));
        }
        Ok(UploadReceipt {
            session_id: parsed.session_id,
            file_name: parsed.file_name,
        })
    }

    async fn convert(&self, session: &SessionId, to: &FormatToken) -> Result<String, ApiError> {
        let request = self.request(
            Method::PATCH,
            "convert/",
            &[("session_id", session.as_str()), ("to_format", to.as_str())],
        )?;
        let body = Self::send(request).await?.bytes().await?;
        let parsed: ConvertResponse = wire::decode("convert", &body)?;
        if parsed.new_file_name.trim().is_empty() {
            return Err(ApiError::Malformed("convert: empty new_file_name".into()));
        }
        Ok(parsed.new_file_name)
    }

    async fn download(&self, session: &SessionId) -> Result<DownloadedFile, ApiError> {
        let request = self.request(
            Method::GET,
            "download/",
            &[("session_id", session.as_str())],
        )?;
        let response = Self::send(request).await?;
        let file_name = wire::file_name_from_headers(response.headers());
        let contents = response.bytes().await?.to_vec();
        Ok(DownloadedFile {
            file_name,
            contents,
        })
    }
}

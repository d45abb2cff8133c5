use super::error::{ApiErrorBody, ClientError};
use crate::config::ClientConfig;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response};
use tracing::debug;
use url::Url;

/// Shared plumbing for requests against the host API.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiTransport {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base, token })
    }

    /// Build a transport with its own HTTP client from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("headerauth/{}", env!("CARGO_PKG_VERSION")));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;
        Self::new(http, &config.base_url, config.token.clone())
    }

    /// Resolve an absolute API path against the base URL.
    pub fn qualify_url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub fn put(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.put(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Turn a non-2xx response into [`ClientError::Status`], keeping the
/// structured error body when the backend sent one.
pub async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ApiErrorBody>(&text).ok();
    debug!(status = %status, body = %text, "API request failed");
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

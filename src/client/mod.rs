pub mod response;

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "/api/ocs/list-subscribers";
pub const DEFAULT_ACCOUNT_ID: u64 = 3771;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body: {source}")]
    Body {
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        document: Value,
    },
}

impl FetchError {
    /// Decoded body that came with the failure, if the server sent one.
    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Http { document, .. } => Some(document),
            _ => None,
        }
    }
}

/// A successful (2xx) response with its decoded body.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched {
    pub status: u16,
    pub document: Value,
}

/// Anything that can answer "list subscribers for this account".
pub trait SubscriberSource {
    fn list_subscribers(
        &self,
        account_id: u64,
    ) -> impl Future<Output = Result<Fetched, FetchError>> + Send;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            proxy: None,
            headers: Vec::new(),
        }
    }
}

/// Resolve the endpoint against the base URL. Absolute endpoint paths
/// replace the base path, relative ones are appended to it.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> Result<reqwest::Url, String> {
    let base = reqwest::Url::parse(base_url.trim()).map_err(|e| e.to_string())?;
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Ok(base);
    }
    base.join(endpoint).map_err(|e| e.to_string())
}

#[derive(Clone, Debug)]
pub struct OcsClient {
    http: reqwest::Client,
    url: reqwest::Url,
}

impl OcsClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let url = endpoint_url(&options.base_url, &options.endpoint).map_err(|message| {
            ClientError::InvalidUrl {
                url: format!("{}{}", options.base_url, options.endpoint),
                message,
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(concat!("ocsdash/", env!("CARGO_PKG_VERSION"))),
        );
        for (key, value) in options.headers.iter() {
            let invalid = |message: String| ClientError::InvalidHeader {
                header: format!("{key}: {value}"),
                message,
            };
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds));

        match options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(proxy) => {
                let proxy_cfg =
                    reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                        proxy: proxy.to_string(),
                        source: e,
                    })?;
                builder = builder.proxy(proxy_cfg);
            }
            None => builder = builder.no_proxy(),
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    pub async fn fetch(&self, account_id: u64) -> Result<Fetched, FetchError> {
        debug!(url = %self.url, account_id, "requesting subscriber list");
        let response = self
            .http
            .post(self.url.clone())
            .json(&json!({ "accountId": account_id }))
            .send()
            .await
            .map_err(|source| FetchError::Transport { source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| FetchError::Body { source })?;
        let document = response::decode_body(&text);
        info!(status = status.as_u16(), bytes = text.len(), "subscriber list response");

        if !status.is_success() {
            let message = response::http_error_message(status, &document, &text);
            warn!(status = status.as_u16(), %message, "subscriber list request failed");
            return Err(FetchError::Http {
                status: status.as_u16(),
                message,
                document,
            });
        }

        Ok(Fetched {
            status: status.as_u16(),
            document,
        })
    }
}

impl SubscriberSource for OcsClient {
    fn list_subscribers(
        &self,
        account_id: u64,
    ) -> impl Future<Output = Result<Fetched, FetchError>> + Send {
        self.fetch(account_id)
    }
}

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use sessionward_domain::constants::DEFAULT_DISPATCH_TIMEOUT_SECS;
use sessionward_domain::{HttpSettings, SessionwardError};
use tracing::debug;

use crate::errors::DispatchError;

/// HTTP client for outbound dispatch.
///
/// The identity provider client keeps its own connection pool, bounded by
/// the refresh timeout rather than the dispatch timeout.
///
/// Sends each request exactly once; the only retry in the system is the
/// dispatcher's single retry after a forced token refresh.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` if the TLS backend cannot be set up.
    pub fn new() -> Result<Self, SessionwardError> {
        Self::builder().build()
    }

    /// Client with the dispatch timeout from `settings`.
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` if the TLS backend cannot be set up.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, SessionwardError> {
        Self::builder().timeout(Duration::from_secs(settings.dispatch_timeout_secs)).build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute a single request.
    ///
    /// # Errors
    /// Returns `DispatchError::Timeout` when the client timeout elapses and
    /// `DispatchError::Transport` for any other failure to get a response.
    pub async fn execute(&self, request: Request) -> Result<Response, DispatchError> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, %url, %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(err.into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_DISPATCH_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// Returns `SessionwardError::Config` if reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient, SessionwardError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| SessionwardError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client })
    }
}

use std::{
    future::Future,
    pin::Pin,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::TransportConfig;
use crate::serialization::SerializationOptions;

pub type RestBytes = Bytes;
pub type RestFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type RestResult<T> = Result<T, RestError>;

/// Request state for a mock that mirrors transport behavior (optional for callers).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestTransportState {
    Idle,
    Busy,
    Error,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Rejected,
    Parse,
    Cancelled,
    InvalidArgument,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("rest error {kind:?} status={status:?} retryable={retryable} {message}")]
pub struct RestError {
    pub kind: RestErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub retryable: bool,
}

impl RestError {
    pub fn new(
        kind: RestErrorKind,
        status: Option<u16>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            retryable,
        }
    }

    pub fn connect(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(RestErrorKind::Connect, status, message, retryable)
    }

    pub fn send(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(RestErrorKind::Send, status, message, retryable)
    }

    pub fn receive(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(RestErrorKind::Receive, status, message, retryable)
    }

    pub fn timeout(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(RestErrorKind::Timeout, status, message, retryable)
    }

    pub fn rejected(status: u16, message: impl Into<String>, retryable: bool) -> Self {
        Self::new(RestErrorKind::Rejected, Some(status), message, retryable)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(RestErrorKind::Cancelled, None, message, false)
    }

    /// A required argument was missing or unusable; `name` identifies it.
    pub fn invalid_argument(name: &str, message: impl Into<String>) -> Self {
        Self::new(
            RestErrorKind::InvalidArgument,
            None,
            format!("{name}: {}", message.into()),
            false,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RestErrorKind::Internal, None, message, false)
    }

    pub fn kind(&self) -> RestErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    fn from_reqwest(kind: RestErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            RestErrorKind::Timeout
        } else if err.is_connect() {
            RestErrorKind::Connect
        } else {
            kind
        };
        let status = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        Self {
            kind,
            status,
            message,
            retryable,
        }
    }
}

impl From<sonic_rs::Error> for RestError {
    fn from(err: sonic_rs::Error) -> Self {
        Self::new(RestErrorKind::Parse, None, err.to_string(), false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, RestBytes)>,
    pub body: Option<RestBytes>,
    pub timeout: Option<Duration>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<RestBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<RestBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Debug)]
pub struct RestResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
    pub elapsed: Duration,
}

impl RestResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_ref())
    }

    pub fn json<T: DeserializeOwned>(&self) -> RestResult<T> {
        self.json_with(&SerializationOptions::default())
    }

    /// Decodes the body with the field naming in `options`.
    pub fn json_with<T: DeserializeOwned>(&self, options: &SerializationOptions) -> RestResult<T> {
        Ok(options.from_slice(&self.body)?)
    }
}

/// A configured sender: something that can put a request on the wire and hand
/// back the response.
///
/// Implementations must observe `cancel` and fail with
/// [`RestErrorKind::Cancelled`] once it fires.
pub trait RestTransport: Send + Sync {
    fn send(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestFuture<RestResult<RestResponse>>;

    /// Releases whatever the transport holds. Only the owner should call this.
    fn close(&self) {}
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &TransportConfig) -> RestResult<Self> {
        let mut builder = ReqwestClient::builder().pool_idle_timeout(config.pool_idle_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|err| RestError::internal(format!("invalid transport config: {err}")))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RestTransport for ReqwestTransport {
    fn send(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestFuture<RestResult<RestResponse>> {
        let client = self.client.clone();
        let url = request.url.clone();
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(%url, "request cancelled");
                    Err(RestError::cancelled("request cancelled before completion"))
                }
                result = execute(client, request) => result,
            }
        })
    }
}

async fn execute(client: ReqwestClient, request: RestRequest) -> RestResult<RestResponse> {
    let start = Instant::now();
    debug!(method = %request.method, url = %request.url, "sending request");
    let mut req = client.request(request.method.clone(), &request.url);

    for (key, value) in request.headers {
        let value = HeaderValue::from_bytes(value.as_ref())
            .map_err(|err| RestError::internal(err.to_string()))?;
        req = req.header(key, value);
    }

    if let Some(body) = request.body {
        req = req.body(body);
    }

    if let Some(timeout) = request.timeout {
        req = req.timeout(timeout);
    }

    let resp = req
        .send()
        .await
        .map_err(|err| RestError::from_reqwest(RestErrorKind::Send, err))?;

    let status = resp.status().as_u16();
    let headers = resp
        .headers()
        .iter()
        .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
        .collect();
    let body = resp
        .bytes()
        .await
        .map_err(|err| RestError::from_reqwest(RestErrorKind::Receive, err))?;
    let elapsed = start.elapsed();
    debug!(url = %request.url, status, ?elapsed, "request completed");

    Ok(RestResponse {
        status,
        headers,
        body,
        elapsed,
    })
}

//! Streaming HTTP ingest transport built on libcurl.
//!
//! POSTs the file body to `<endpoint>/v1/rest/ingest/<database>/<table>` with
//! the stream format, optional mapping name and flush flag as query
//! parameters. One curl handle per delivery, so concurrent deliveries share
//! nothing but the immutable request template.

use serde::Deserialize;
use std::io::Read;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use super::{Connector, DeliveryOutcome, IngestionState, IngestionStatus, Ingestor, InitError, StreamSource};
use crate::destination::IngestionDestination;
use crate::retry::{classify_http_status, DeliveryError, ErrorClass, RemoteError, Retryability};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const USER_AGENT: &str = concat!("rollship/", env!("CARGO_PKG_VERSION"));

/// How requests authenticate. Token acquisition itself happens elsewhere.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Bearer token sent on every request.
    AccessToken(String),
    /// No `Authorization` header (local emulators, pre-authenticated proxies).
    #[default]
    Anonymous,
}

impl Credentials {
    pub fn auth_type(&self) -> &'static str {
        match self {
            Credentials::AccessToken(_) => "AccessToken",
            Credentials::Anonymous => "None",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.auth_type())
    }
}

impl Retryability for curl::Error {}

/// Builds [`HttpIngestor`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    credentials: Credentials,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpConnector {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

impl Connector for HttpConnector {
    fn connect(&self, destination: &IngestionDestination) -> Result<Box<dyn Ingestor>, InitError> {
        let ingest_url = ingest_url(destination)?;
        tracing::info!(
            auth_type = self.credentials.auth_type(),
            proxy = destination.proxy().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            url = %ingest_url,
            "ingestion connector ready"
        );
        Ok(Box::new(HttpIngestor {
            ingest_url,
            credentials: self.credentials.clone(),
            proxy: destination.proxy().map(|p| format!("http://{}", p)),
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            closed: Mutex::new(false),
        }))
    }
}

/// Full ingest URL for `destination`.
pub fn ingest_url(destination: &IngestionDestination) -> Result<Url, InitError> {
    let mut url = destination.endpoint().clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| InitError::InvalidEndpoint {
            endpoint: destination.endpoint().to_string(),
            reason: "endpoint cannot be a base URL".to_string(),
        })?;
        segments
            .pop_if_empty()
            .extend(["v1", "rest", "ingest", destination.database(), destination.table()]);
    }
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("streamFormat", destination.format().stream_format());
        if let Some(mapping) = destination.mapping() {
            query.append_pair("mappingName", &mapping.name);
        }
        if destination.flush_immediately() {
            query.append_pair("flushImmediately", "true");
        }
    }
    Ok(url)
}

pub struct HttpIngestor {
    ingest_url: Url,
    credentials: Credentials,
    proxy: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
    closed: Mutex<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    #[serde(rename = "@message")]
    detail: Option<String>,
    #[serde(rename = "@permanent")]
    permanent: Option<bool>,
}

/// Turn a non-2xx response into a [`RemoteError`].
///
/// The service's `@permanent` flag wins; without it the status decides.
pub fn remote_error(status: u32, body: &[u8]) -> RemoteError {
    let parsed = serde_json::from_slice::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let flag = parsed.as_ref().and_then(|e| e.permanent);
    let permanent = flag.unwrap_or_else(|| classify_http_status(status) == ErrorClass::Permanent);
    let (code, message) = match parsed {
        Some(e) => (e.code, e.detail.or(e.message)),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            "request failed".to_string()
        } else {
            text.chars().take(512).collect()
        }
    });
    RemoteError {
        status: Some(status),
        code,
        message,
        permanent,
    }
}

impl HttpIngestor {
    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Ingestor for HttpIngestor {
    fn ingest(
        &self,
        source: StreamSource<'_>,
        destination: &IngestionDestination,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::from_flagged(super::ClientClosed));
        }
        let reader = source.reader;
        let mut response: Vec<u8> = Vec::new();
        let mut read_error: Option<std::io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(self.ingest_url.as_str())?;
        easy.post(true)?;
        easy.useragent(USER_AGENT)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;
        if let Some(proxy) = &self.proxy {
            easy.proxy(proxy)?;
        }

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/octet-stream")?;
        list.append("Expect:")?;
        match source.len {
            Some(len) => easy.post_field_size(len)?,
            None => list.append("Transfer-Encoding: chunked")?,
        }
        if let Credentials::AccessToken(token) = &self.credentials {
            list.append(&format!("Authorization: Bearer {}", token.trim()))?;
        }
        easy.http_headers(list)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| match reader.read(buf) {
                Ok(n) => Ok(n),
                Err(e) => {
                    read_error = Some(e);
                    Err(curl::easy::ReadError::Abort)
                }
            })?;
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Some(e) = read_error {
            return Err(e.into());
        }
        performed?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            let err = remote_error(code, &response);
            tracing::debug!(
                status = code,
                code = err.code.as_deref().unwrap_or("-"),
                permanent = err.permanent,
                "ingest request rejected"
            );
            return Err(DeliveryError::from_flagged(err));
        }

        let state = if destination.flush_immediately() {
            IngestionState::Succeeded
        } else {
            IngestionState::Queued
        };
        Ok(DeliveryOutcome::single(IngestionStatus::new(state)))
    }

    fn close(&self) -> Result<(), crate::retry::BoxError> {
        *self.closed.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
        Ok(())
    }
}

impl From<curl::Error> for DeliveryError {
    fn from(err: curl::Error) -> Self {
        DeliveryError::from_flagged(err)
    }
}

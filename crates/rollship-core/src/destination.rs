//! Where delivered rows land: endpoint, database, table and optional mapping.
//!
//! Built once from configuration and never mutated afterwards.

use std::fmt;
use url::Url;

use crate::client::InitError;

/// Default port assumed for a proxy given without one.
pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// Format of the ingestion mapping (and of the shipped file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingKind {
    #[default]
    Csv,
    Json,
}

impl MappingKind {
    /// Case-insensitive; anything other than `json` means CSV.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            MappingKind::Json
        } else {
            MappingKind::Csv
        }
    }

    /// Value of the `streamFormat` parameter.
    pub fn stream_format(&self) -> &'static str {
        match self {
            MappingKind::Csv => "Csv",
            MappingKind::Json => "Json",
        }
    }
}

/// Reference to a pre-created ingestion mapping on the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRef {
    pub name: String,
    pub kind: MappingKind,
}

/// HTTP proxy address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl ProxyAddress {
    /// Accepts `host:port`, `host`, `http://host:port` or `https://host:port`.
    pub fn parse(raw: &str) -> Result<Self, InitError> {
        let raw = raw.trim();
        let invalid = |reason: &str| InitError::InvalidProxy {
            proxy: raw.to_string(),
            reason: reason.to_string(),
        };
        let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };
        let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(invalid("host is missing")),
        };
        // Url reports no port when it equals the scheme default.
        let port = match url.port() {
            Some(p) => p,
            None if has_explicit_port(raw) => url.port_or_known_default().unwrap_or(DEFAULT_PROXY_PORT),
            None => DEFAULT_PROXY_PORT,
        };
        Ok(ProxyAddress { host, port })
    }
}

fn has_explicit_port(raw: &str) -> bool {
    let authority = raw.split("://").nth(1).unwrap_or(raw);
    let authority = authority.split('/').next().unwrap_or(authority);
    authority
        .rsplit_once(':')
        .map(|(_, p)| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Immutable delivery target owned by the ingestion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionDestination {
    endpoint: Url,
    database: String,
    table: String,
    mapping: Option<MappingRef>,
    flush_immediately: bool,
    proxy: Option<ProxyAddress>,
}

impl IngestionDestination {
    pub fn new(endpoint: &str, database: &str, table: &str) -> Result<Self, InitError> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| InitError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(InitError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }
        if database.trim().is_empty() || table.trim().is_empty() {
            return Err(InitError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "database and table must be set".to_string(),
            });
        }
        Ok(Self {
            endpoint,
            database: database.trim().to_string(),
            table: table.trim().to_string(),
            mapping: None,
            flush_immediately: false,
            proxy: None,
        })
    }

    /// Applied only when both name and kind are non-empty.
    pub fn with_mapping(mut self, name: Option<&str>, kind: Option<&str>) -> Self {
        self.mapping = match (name.map(str::trim), kind.map(str::trim)) {
            (Some(name), Some(kind)) if !name.is_empty() && !kind.is_empty() => Some(MappingRef {
                name: name.to_string(),
                kind: MappingKind::parse_lenient(kind),
            }),
            _ => None,
        };
        self
    }

    pub fn with_flush_immediately(mut self, flush: bool) -> Self {
        self.flush_immediately = flush;
        self
    }

    /// Blank proxy strings are ignored.
    pub fn with_proxy(mut self, proxy: Option<&str>) -> Result<Self, InitError> {
        self.proxy = match proxy.map(str::trim) {
            Some(p) if !p.is_empty() => Some(ProxyAddress::parse(p)?),
            _ => None,
        };
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mapping(&self) -> Option<&MappingRef> {
        self.mapping.as_ref()
    }

    /// Format of shipped files: the mapping kind, CSV without a mapping.
    pub fn format(&self) -> MappingKind {
        self.mapping.as_ref().map(|m| m.kind).unwrap_or_default()
    }

    pub fn flush_immediately(&self) -> bool {
        self.flush_immediately
    }

    pub fn proxy(&self) -> Option<&ProxyAddress> {
        self.proxy.as_ref()
    }
}

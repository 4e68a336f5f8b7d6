//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. A
//! `MapiRequest` renders itself into an `HttpRequest`, a `Transport` executes
//! it, and the resulting `HttpResponse` is parsed back into a typed
//! `MapiResponse`. Keeping the wire exchange as data keeps the envelope
//! testable without a network.
//!
//! Bodies are raw bytes: static map images and font glyphs are binary.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL, access token included.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Convenience constructor for a JSON response.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into().into_bytes(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// One entry of a `Link` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    /// Link attributes other than the URL, e.g. `rel`.
    pub params: BTreeMap<String, String>,
}

impl Link {
    /// The pagination cursor carried by this link, passed back verbatim.
    pub fn cursor(&self) -> Option<String> {
        self.query_value("start")
    }

    pub fn limit(&self) -> Option<String> {
        self.query_value("limit")
    }

    fn query_value(&self, key: &str) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        url.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

/// Links keyed by their `rel` value.
pub type Links = BTreeMap<String, Link>;

/// Parse an RFC 8288 `Link` header: `<url>; rel="next", <url>; rel="last"`.
///
/// URLs are delimited by angle brackets, so commas inside an opaque cursor do
/// not split entries. Entries without a `rel` are dropped.
pub fn parse_link_header(header: &str) -> Links {
    let mut links = Links::new();
    let mut rest = header;

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('>') else {
            break;
        };
        let url = after_open[..close].trim().to_string();
        let tail = &after_open[close + 1..];
        let end = tail.find('<').unwrap_or(tail.len());
        let attributes = &tail[..end];
        rest = &tail[end..];

        let params: BTreeMap<String, String> = attributes
            .split(';')
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                let key = key.trim().trim_start_matches(',').trim().to_ascii_lowercase();
                let value = value.trim().trim_end_matches(',').trim().trim_matches('"');
                (!key.is_empty()).then(|| (key, value.to_string()))
            })
            .collect();

        if let Some(rels) = params.get("rel").cloned() {
            for rel in rels.split_whitespace() {
                links.insert(
                    rel.to_string(),
                    Link {
                        url: url.clone(),
                        params: params.clone(),
                    },
                );
            }
        }
    }

    links
}

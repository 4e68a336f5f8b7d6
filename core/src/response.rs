//! The response half of the envelope.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{MapiError, Result};
use crate::http::{find_header, parse_link_header, HttpResponse, Links};
use crate::request::{MapiRequest, RequestInfo};

/// A successful (2xx) response whose body decoded to `T`.
pub struct MapiResponse<T> {
    /// The request this response answers.
    pub request: RequestInfo,
    pub status_code: u16,
    /// Header names are lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: T,
    pub raw_body: Vec<u8>,
    /// Parsed `Link` header, keyed by `rel`.
    pub links: Links,
    origin: MapiRequest<T>,
}

impl<T> MapiResponse<T> {
    pub(crate) fn from_http(request: &MapiRequest<T>, info: RequestInfo, http: HttpResponse) -> Result<Self> {
        if !http.is_success() {
            warn!(request_id = %info.id, status = http.status, path = %info.path, "request failed");
            return Err(MapiError::http(info, http.status, &http.body).into());
        }
        debug!(request_id = %info.id, status = http.status, bytes = http.body.len(), "response received");

        let body = match request.decode_body(&http.body) {
            Ok(body) => body,
            Err(err) => return Err(MapiError::undecodable(info, http.status, err.to_string()).into()),
        };
        let links = find_header(&http.headers, "link")
            .map(parse_link_header)
            .unwrap_or_default();

        Ok(Self {
            request: info,
            status_code: http.status,
            headers: http.headers,
            body,
            raw_body: http.body,
            links,
            origin: request.clone(),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The raw body as text, lossily decoded.
    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }

    pub fn has_next_page(&self) -> bool {
        self.links.contains_key("next")
    }

    /// A fresh request for the next page, if the `Link` header names one.
    ///
    /// The link URL, cursor included, is used verbatim.
    pub fn next_page(&self) -> Option<MapiRequest<T>> {
        self.links.get("next").map(|link| self.origin.follow(&link.url))
    }
}

impl<T: fmt::Debug> fmt::Debug for MapiResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapiResponse")
            .field("request", &self.request)
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

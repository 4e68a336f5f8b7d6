//! The request half of the envelope.
//!
//! # Design
//! `RequestParams` is the plain description a service builds: method, a path
//! template such as `/datasets/v1/:ownerId/:datasetId`, route params, query,
//! headers and an optional body or file. `MapiRequest<T>` binds that
//! description to a client and a decoder for the response body, and carries
//! the per-instance transport state (sent, settled, aborted).
//!
//! A request is single-use. Cloning it yields a fresh, unsent request with
//! the same description; the original's state is not shared.

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::client::MapiClient;
use crate::config::redact;
use crate::error::{Error, MapiError, Result, TransportError};
use crate::http::{find_header, HttpMethod, HttpRequest};
use crate::response::MapiResponse;
use crate::token::parse_token;

const USER_AGENT: &str = concat!("mapbox-core/", env!("CARGO_PKG_VERSION"));
const OWNER_ID: &str = "ownerId";

pub(crate) type Decoder<T> = fn(&[u8]) -> std::result::Result<T, serde_json::Error>;

/// An empty body decodes as JSON `null`, which is how `()` covers 204s.
pub(crate) fn decode_json<T: DeserializeOwned>(raw: &[u8]) -> std::result::Result<T, serde_json::Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(raw)
    }
}

pub(crate) fn decode_bytes(raw: &[u8]) -> std::result::Result<Vec<u8>, serde_json::Error> {
    Ok(raw.to_vec())
}

pub(crate) fn decode_text(raw: &[u8]) -> std::result::Result<String, serde_json::Error> {
    Ok(String::from_utf8_lossy(raw).into_owned())
}

/// Request body other than a file upload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
    Text(String),
}

/// Where file bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Read from disk when the request is sent.
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// How file bytes are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFileAs {
    /// Raw request body.
    Data,
    /// `multipart/form-data` with a single `file` part.
    Form,
}

/// A file to upload with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub source: FileSource,
    pub send_as: SendFileAs,
    pub content_type: Option<String>,
}

impl FilePayload {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FileSource::Path(path.into()),
            send_as: SendFileAs::Data,
            content_type: None,
        }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: FileSource::Bytes(bytes.into()),
            send_as: SendFileAs::Data,
            content_type: None,
        }
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub(crate) fn send_as(mut self, send_as: SendFileAs) -> Self {
        self.send_as = send_as;
        self
    }

    fn read(&self) -> std::result::Result<Vec<u8>, TransportError> {
        match &self.source {
            FileSource::Path(path) => Ok(std::fs::read(path)?),
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// File name for the multipart `filename` parameter: control characters
    /// dropped, quotes and backslashes escaped.
    fn file_name(&self) -> String {
        let name = match &self.source {
            FileSource::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            FileSource::Bytes(_) => String::new(),
        };
        let mut escaped = String::with_capacity(name.len());
        for c in name.chars().filter(|c| !c.is_control()) {
            if c == '"' || c == '\\' {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        if escaped.trim().is_empty() {
            return "file".to_string();
        }
        escaped
    }
}

/// Everything needed to describe one HTTP operation before it is bound to a
/// client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub method: HttpMethod,
    /// Path template relative to the origin, or an absolute URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub file: Option<FilePayload>,
}

impl RequestParams {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            file: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Set a route parameter, replacing any earlier value.
    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.retain(|(key, _)| key != name);
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn param_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Join values with `separator`; nothing is added for an empty list.
    pub fn query_list<I, V>(self, key: &str, values: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let joined: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        if joined.is_empty() {
            self
        } else {
            self.query(key, joined.join(separator))
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    pub fn file(mut self, file: FilePayload) -> Self {
        self.file = Some(file);
        self
    }

    fn route_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }
}

/// Identifying snapshot of a request, attached to responses and errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub id: Uuid,
    pub method: HttpMethod,
    /// Path template the request was built from.
    pub path: String,
    /// Full URL with the access token redacted.
    pub url: String,
}

#[derive(Debug, Default)]
pub(crate) struct RequestState {
    sent: AtomicBool,
    settled: AtomicBool,
    aborted: AtomicBool,
    cancel: CancellationToken,
}

impl RequestState {
    fn abort(&self) {
        if self.settled.load(Ordering::SeqCst) || self.aborted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
    }
}

/// Cancels a request from another task.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    id: Uuid,
    state: Arc<RequestState>,
}

impl AbortHandle {
    pub fn abort(&self) {
        debug!(request_id = %self.id, "aborting request");
        self.state.abort();
    }
}

/// One not-yet-sent HTTP operation whose successful response decodes to `T`.
pub struct MapiRequest<T> {
    id: Uuid,
    client: MapiClient,
    params: Arc<RequestParams>,
    decode: Decoder<T>,
    state: Arc<RequestState>,
    _body: PhantomData<fn() -> T>,
}

impl<T> MapiRequest<T> {
    pub(crate) fn new(client: MapiClient, mut params: RequestParams, decode: Decoder<T>) -> Result<Self> {
        if !params.is_absolute()
            && params.path.contains(":ownerId")
            && params.route_param(OWNER_ID).is_none()
        {
            let owner = parse_token(client.access_token())
                .map_err(|_| Error::invalid(OWNER_ID, "not given and not derivable from the access token"))?
                .user;
            params = params.param(OWNER_ID, owner);
        }
        Ok(Self::from_parts(client, Arc::new(params), decode))
    }

    fn from_parts(client: MapiClient, params: Arc<RequestParams>, decode: Decoder<T>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            params,
            decode,
            state: Arc::new(RequestState::default()),
            _body: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.params.method
    }

    pub fn path(&self) -> &str {
        &self.params.path
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.params.query
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.params.body.as_ref()
    }

    pub fn file(&self) -> Option<&FilePayload> {
        self.params.file.as_ref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.params.headers, name)
    }

    pub fn is_sent(&self) -> bool {
        self.state.sent.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Full URL including the access token.
    pub fn url(&self) -> Result<Url> {
        self.build_url(self.client.access_token())
    }

    pub fn info(&self) -> RequestInfo {
        let url = self
            .build_url(&redact(self.client.access_token()))
            .map(String::from)
            .unwrap_or_else(|_| self.params.path.clone());
        RequestInfo {
            id: self.id,
            method: self.params.method,
            path: self.params.path.clone(),
            url,
        }
    }

    /// Cancel the request. No-op once it has settled or was already aborted.
    pub fn abort(&self) {
        self.abort_handle().abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            id: self.id,
            state: Arc::clone(&self.state),
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.state.cancel
    }

    /// Flip the sent flag; fails if it was already set.
    pub(crate) fn claim(&self) -> Result<()> {
        if self.state.sent.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadySent);
        }
        Ok(())
    }

    pub(crate) fn settle(&self) {
        self.state.settled.store(true, Ordering::SeqCst);
    }

    /// A request for `url` with this request's headers and decoder; used to
    /// follow pagination links.
    pub(crate) fn follow(&self, url: &str) -> Self {
        let params = RequestParams {
            method: self.params.method,
            path: url.to_string(),
            query: Vec::new(),
            params: Vec::new(),
            headers: self.params.headers.clone(),
            body: None,
            file: None,
        };
        Self::from_parts(self.client.clone(), Arc::new(params), self.decode)
    }

    /// Send the request. Resolves once to a response or an error.
    pub async fn send(&self) -> Result<MapiResponse<T>> {
        self.claim()?;
        let result = self.dispatch(self.cancel_token()).await;
        self.settle();
        result
    }

    /// Run one exchange, racing the transport against `cancel`.
    pub(crate) async fn dispatch(&self, cancel: &CancellationToken) -> Result<MapiResponse<T>> {
        let info = self.info();
        if cancel.is_cancelled() {
            return Err(MapiError::aborted(info).into());
        }

        let prepared = self.prepare()?;
        let transport = self.client.transport();
        debug!(request_id = %self.id, method = %info.method, path = %info.path, "dispatching request");

        let task = tokio::task::spawn_blocking(move || {
            let request = prepared.into_http()?;
            transport.execute(&request)
        });

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(request_id = %self.id, "request aborted in flight");
                return Err(MapiError::aborted(info).into());
            }
            joined = task => joined,
        };

        match joined {
            Ok(Ok(response)) => MapiResponse::from_http(self, info, response),
            Ok(Err(err)) => Err(MapiError::transport(info, err.message).into()),
            Err(err) => Err(MapiError::transport(info, err.to_string()).into()),
        }
    }

    pub(crate) fn decode_body(&self, raw: &[u8]) -> std::result::Result<T, serde_json::Error> {
        (self.decode)(raw)
    }

    fn build_url(&self, token: &str) -> Result<Url> {
        let origin = Url::parse(self.client.origin())?;
        let mut url = if self.params.is_absolute() {
            Url::parse(&self.params.path)?
        } else {
            let mut url = origin.clone();
            {
                let mut segments = url
                    .path_segments_mut()
                    .map_err(|_| Error::invalid("origin", "cannot be used as a base URL"))?;
                segments.pop_if_empty();
                for segment in self.params.path.split('/').filter(|s| !s.is_empty()) {
                    segments.push(&interpolate(segment, &self.params)?);
                }
            }
            url
        };

        let existing: Vec<String> = url.query_pairs().map(|(key, _)| key.into_owned()).collect();
        let mut pairs: Vec<(&str, &str)> = self
            .params
            .query
            .iter()
            .filter(|(key, _)| !existing.contains(key))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        // Links to another host never receive the token.
        if url.origin() == origin.origin() && !existing.iter().any(|key| key == "access_token") {
            pairs.push(("access_token", token));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn prepare(&self) -> Result<PreparedRequest> {
        let mut headers = vec![("user-agent".to_string(), USER_AGENT.to_string())];
        let body = match &self.params.body {
            Some(RequestBody::Json(value)) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_vec(value)?)
            }
            Some(RequestBody::Form(pairs)) => {
                headers.push((
                    "content-type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ));
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                Some(encoded.into_bytes())
            }
            Some(RequestBody::Text(text)) => {
                headers.push(("content-type".to_string(), "text/plain".to_string()));
                Some(text.clone().into_bytes())
            }
            None => None,
        };
        for (name, value) in &self.params.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(PreparedRequest {
            http: HttpRequest {
                method: self.params.method,
                url: self.url()?.into(),
                headers,
                body,
            },
            file: self.params.file.clone(),
            boundary: format!("mapbox-core-{}", self.id.simple()),
        })
    }
}

impl<T> Clone for MapiRequest<T> {
    /// A fresh, unsent request with the same configuration.
    fn clone(&self) -> Self {
        Self::from_parts(self.client.clone(), Arc::clone(&self.params), self.decode)
    }
}

impl<T> fmt::Debug for MapiRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapiRequest")
            .field("id", &self.id)
            .field("method", &self.params.method)
            .field("path", &self.params.path)
            .field("sent", &self.is_sent())
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}

/// Replace a `:name` segment (optionally followed by a literal suffix such as
/// `.json`) with its route parameter.
fn interpolate(segment: &str, params: &RequestParams) -> Result<String> {
    let Some(rest) = segment.strip_prefix(':') else {
        return Ok(segment.to_string());
    };
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (name, suffix) = rest.split_at(end);
    match params.route_param(name) {
        Some(value) => Ok(format!("{value}{suffix}")),
        None => Err(Error::invalid("path", format!("missing route parameter :{name}"))),
    }
}

/// Request rendered to plain data, minus file bytes, which are read on the
/// blocking pool.
struct PreparedRequest {
    http: HttpRequest,
    file: Option<FilePayload>,
    boundary: String,
}

impl PreparedRequest {
    fn into_http(self) -> std::result::Result<HttpRequest, TransportError> {
        let Some(file) = self.file else {
            return Ok(self.http);
        };
        let mut http = self.http;
        let data = file.read()?;
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        match file.send_as {
            SendFileAs::Data => {
                http.headers.retain(|(name, _)| name != "content-type");
                http.headers.push(("content-type".to_string(), content_type));
                http.body = Some(data);
            }
            SendFileAs::Form => {
                let boundary = self.boundary;
                let mut body = format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
                    file.file_name()
                )
                .into_bytes();
                body.extend_from_slice(&data);
                body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
                http.headers.retain(|(name, _)| name != "content-type");
                http.headers.push((
                    "content-type".to_string(),
                    format!("multipart/form-data; boundary={boundary}"),
                ));
                http.body = Some(body);
            }
        }
        Ok(http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use crate::http::HttpResponse;
    use crate::token::fake_token;
    use crate::transport::{MockTransport, Transport};
    use std::sync::mpsc;
    use std::time::Duration;

    fn client_with(transport: Arc<dyn Transport>) -> MapiClient {
        let config = ClientConfig::new(fake_token("alice"));
        MapiClient::with_transport(config, transport).unwrap()
    }

    fn mock_client() -> (MapiClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        (client_with(mock.clone()), mock)
    }

    #[test]
    fn url_interpolates_params_and_appends_token_last() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(
                RequestParams::get("/geocoding/v5/:mode/:query.json")
                    .param("mode", "mapbox.places")
                    .param("query", "1600 Pennsylvania Ave")
                    .query("limit", 2)
                    .query_opt("language", None::<String>),
            )
            .unwrap();
        let url = request.url().unwrap();
        assert_eq!(
            url.path(),
            "/geocoding/v5/mapbox.places/1600%20Pennsylvania%20Ave.json"
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("limit".to_string(), "2".to_string()));
        assert_eq!(pairs[1].0, "access_token");
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn slash_in_param_is_encoded() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/styles/v1/:ownerId/:styleId").param("styleId", "a/b"))
            .unwrap();
        assert_eq!(request.url().unwrap().path(), "/styles/v1/alice/a%2Fb");
    }

    #[test]
    fn explicit_owner_wins_over_token() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/tokens/v2/:ownerId").param("ownerId", "bob"))
            .unwrap();
        assert_eq!(request.url().unwrap().path(), "/tokens/v2/bob");
    }

    #[test]
    fn owner_requires_parseable_token_when_omitted() {
        let config = ClientConfig::new("opaque");
        let client = MapiClient::with_transport(config, Arc::new(MockTransport::new())).unwrap();
        let err = client
            .create_request::<Value>(RequestParams::get("/uploads/v1/:ownerId"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "ownerId", .. }));
    }

    #[test]
    fn missing_route_param_fails_url() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId/:datasetId"))
            .unwrap();
        assert!(matches!(request.url(), Err(Error::InvalidInput { field: "path", .. })));
    }

    #[test]
    fn absolute_path_keeps_its_query() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap()
            .follow("https://api.mapbox.com/datasets/v1/alice?start=abc&limit=1");
        let url = request.url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("start".to_string(), "abc".to_string()));
        assert_eq!(pairs[1], ("limit".to_string(), "1".to_string()));
        assert_eq!(pairs[2].0, "access_token");
    }

    #[test]
    fn foreign_link_gets_no_token() {
        let (client, _) = mock_client();
        let listing = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();

        let foreign = listing.follow("https://attacker.test/datasets/v1/alice?start=abc");
        let url = foreign.url().unwrap();
        assert!(url.query_pairs().all(|(key, _)| key != "access_token"));
        assert_eq!(url.query(), Some("start=abc"));

        let other_scheme = listing.follow("http://api.mapbox.com/datasets/v1/alice?start=abc");
        assert!(other_scheme.url().unwrap().query_pairs().all(|(key, _)| key != "access_token"));
    }

    #[test]
    fn info_redacts_token() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/tokens/v2/:ownerId"))
            .unwrap();
        let info = request.info();
        assert!(info.url.contains("access_token=pk.***") || info.url.contains("access_token=pk.%2A%2A%2A"));
        assert!(!info.url.contains("signature"));
        assert_eq!(info.path, "/tokens/v2/:ownerId");
    }

    #[test]
    fn clone_is_fresh_and_unsent() {
        let (client, _) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/tokens/v2/:ownerId").query("limit", 5))
            .unwrap();
        request.claim().unwrap();
        let copy = request.clone();
        assert!(request.is_sent());
        assert!(!copy.is_sent());
        assert_ne!(copy.id(), request.id());
        assert_eq!(copy.params(), request.params());
    }

    #[tokio::test]
    async fn send_resolves_typed_body() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, r#"{"name":"x"}"#));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        let response = request.send().await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["name"], "x");
        assert_eq!(response.request.id, request.id());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn second_send_fails_fast() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "{}"));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        request.send().await.unwrap();
        assert!(matches!(request.send().await, Err(Error::AlreadySent)));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(404, r#"{"message":"Not Found"}"#));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId/missing"))
            .unwrap();
        let err = request.send().await.unwrap_err();
        let mapi = err.as_mapi().unwrap();
        assert_eq!(mapi.kind, ErrorKind::Http);
        assert_eq!(mapi.status_code, Some(404));
        assert_eq!(mapi.message.as_deref(), Some("Not Found"));
        assert_eq!(mapi.request.id, request.id());
    }

    #[tokio::test]
    async fn transport_failure_is_http_error_without_status() {
        let (client, mock) = mock_client();
        mock.push_error(TransportError::new("connection refused"));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        let err = request.send().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Http));
        assert_eq!(err.status_code(), None);
        assert_eq!(err.as_mapi().unwrap().message.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_http_error() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "not json"));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        let err = request.send().await.unwrap_err();
        assert_eq!(err.status_code(), Some(200));
    }

    #[tokio::test]
    async fn empty_body_decodes_as_unit() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        });
        let request = client
            .create_request::<()>(RequestParams::delete("/datasets/v1/:ownerId/abc"))
            .unwrap();
        let response = request.send().await.unwrap();
        assert_eq!(response.status_code, 204);
        assert!(response.raw_body.is_empty());
    }

    #[tokio::test]
    async fn abort_before_send_never_hits_transport() {
        let (client, mock) = mock_client();
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        request.abort();
        request.abort();
        assert!(request.is_aborted());
        let err = request.send().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RequestAborted));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn abort_after_settle_is_noop() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "{}"));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        request.send().await.unwrap();
        request.abort();
        assert!(!request.is_aborted());
    }

    #[tokio::test]
    async fn abort_in_flight_settles_to_abort_error() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = std::sync::Mutex::new(release_rx);
        let transport = move |_: &HttpRequest| -> std::result::Result<HttpResponse, TransportError> {
            if let Ok(rx) = release_rx.lock() {
                let _ = rx.recv_timeout(Duration::from_secs(5));
            }
            Ok(HttpResponse::json(200, "{}"))
        };
        let client = client_with(Arc::new(transport));
        let request = client
            .create_request::<Value>(RequestParams::get("/datasets/v1/:ownerId"))
            .unwrap();
        let handle = request.abort_handle();

        let aborter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.abort();
        });
        let err = request.send().await.unwrap_err();
        aborter.await.unwrap();
        release_tx.send(()).unwrap();

        assert_eq!(err.kind(), Some(ErrorKind::RequestAborted));
        assert!(request.is_aborted());
    }

    #[tokio::test]
    async fn json_body_and_headers_reach_transport() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "{}"));
        let request = client
            .create_request::<Value>(
                RequestParams::post("/datasets/v1/:ownerId")
                    .json(&serde_json::json!({"name": "parks"}))
                    .unwrap()
                    .header("If-Unmodified-Since", "Mon, 01 Jan 2024 00:00:00 GMT"),
            )
            .unwrap();
        request.send().await.unwrap();
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.header("if-unmodified-since"), Some("Mon, 01 Jan 2024 00:00:00 GMT"));
        let body: Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "parks");
    }

    #[tokio::test]
    async fn form_body_is_urlencoded() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "{}"));
        let request = client
            .create_request::<Value>(
                RequestParams::post("/matching/v5/mapbox/driving")
                    .form(vec![("coordinates".to_string(), "1,2;3,4".to_string())]),
            )
            .unwrap();
        request.send().await.unwrap();
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(sent.body.as_deref(), Some(&b"coordinates=1%2C2%3B3%2C4"[..]));
    }

    #[tokio::test]
    async fn multipart_file_wraps_bytes() {
        let (client, mock) = mock_client();
        mock.push(HttpResponse::json(200, "{}"));
        let request = client
            .create_request::<Value>(
                RequestParams::post("/tilesets/v1/sources/:ownerId/trees")
                    .file(FilePayload::bytes(b"{\"type\":\"Feature\"}\n".to_vec()).send_as(SendFileAs::Form)),
            )
            .unwrap();
        request.send().await.unwrap();
        let sent = mock.last_request().unwrap();
        let content_type = sent.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8(sent.body.unwrap()).unwrap();
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("{\"type\":\"Feature\"}"));
        assert!(body.trim_end().ends_with("--"));
    }

    #[test]
    fn multipart_file_name_cannot_break_part_headers() {
        let quoted = FilePayload::path("/tmp/trees \"v2\".geojson");
        assert_eq!(quoted.file_name(), r#"trees \"v2\".geojson"#);

        let injected = FilePayload::path("/tmp/a\r\nX-Injected: 1\r\n.geojson");
        let name = injected.file_name();
        assert!(!name.contains('\r') && !name.contains('\n'));
        assert_eq!(name, "aX-Injected: 1.geojson");

        assert_eq!(FilePayload::path("/tmp/\n").file_name(), "file");
        assert_eq!(FilePayload::bytes(Vec::new()).file_name(), "file");
    }

    #[tokio::test]
    async fn missing_file_is_transport_error() {
        let (client, mock) = mock_client();
        let request = client
            .create_request::<Value>(
                RequestParams::put("/styles/v1/:ownerId/s/sprite/i")
                    .file(FilePayload::path("/definitely/not/here.svg")),
            )
            .unwrap();
        let err = request.send().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Http));
        assert_eq!(mock.calls(), 0);
    }
}

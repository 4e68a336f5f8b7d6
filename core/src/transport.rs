//! Pluggable HTTP execution.
//!
//! # Design
//! A `Transport` turns one plain-data `HttpRequest` into one `HttpResponse`.
//! Non-2xx statuses are data, not errors: interpreting them is the
//! envelope's job. Implementations are blocking; `MapiRequest::send` moves
//! the call onto tokio's blocking pool so it can be raced against abort.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes HTTP exchanges on behalf of the client.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Transport backed by a ureq agent.
///
/// The agent is configured with `http_status_as_error(false)` so 4xx/5xx
/// responses come back as data and reach the envelope's error handling.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
            HttpMethod::Post => send_body(with_headers(self.agent.post(url), headers), body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(url), headers), body),
            HttpMethod::Patch => send_body(with_headers(self.agent.patch(url), headers), body),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Scripted transport for tests and offline use.
///
/// Replies with queued responses in order, then with the fallback response
/// once the queue is empty. Every executed request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: Option<HttpResponse>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response` once queued replies run out.
    pub fn always(response: HttpResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::default()
        }
    }

    pub fn push(&self, response: HttpResponse) -> &Self {
        self.push_result(Ok(response))
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.push_result(Err(error))
    }

    fn push_result(&self, result: Result<HttpResponse, TransportError>) -> &Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(result);
        }
        self
    }

    /// Number of exchanges executed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let queued = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        match (queued, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(response)) => Ok(response.clone()),
            (None, None) => Err(TransportError::new("mock transport has no scripted response")),
        }
    }
}

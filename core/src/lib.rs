//! Typed client core for the Mapbox web services API.
//!
//! # Overview
//! A `MapiClient` holds the access token, the API origin and a transport.
//! Service leaves (`client.datasets()`, `client.directions()`, ...) turn
//! typed input records into `MapiRequest<T>` values; nothing touches the
//! network until `send` or `each_page` is awaited. Every request resolves to
//! exactly one `MapiResponse<T>` or one `Error`.
//!
//! # Design
//! - The transport is a trait over plain-data `HttpRequest` / `HttpResponse`
//!   values, so the envelope stays deterministic under `MockTransport` and
//!   the blocking `UreqTransport` can be swapped for anything else.
//! - `send` runs the transport on tokio's blocking pool and races it against
//!   a cancellation token; `abort` settles the request with an abort error.
//! - Requests are single-use. `Clone` yields a fresh, unsent copy.
//! - Pagination follows the `Link` header; cursors are opaque.
//! - The owner route parameter defaults to the user encoded in the token.
//! - The access token is appended last to every URL and redacted from
//!   request info, errors and logs.

pub mod client;
pub mod config;
pub mod error;
pub mod geojson;
pub mod http;
pub mod paging;
pub mod polyline;
pub mod request;
pub mod response;
pub mod services;
pub mod token;
pub mod transport;
pub mod types;

pub use client::MapiClient;
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, MapiError, Result, TransportError};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use http::{parse_link_header, HttpMethod, HttpRequest, HttpResponse, Link, Links};
pub use paging::Next;
pub use request::{AbortHandle, FilePayload, MapiRequest, RequestBody, RequestInfo, RequestParams};
pub use response::MapiResponse;
pub use token::{parse_token, TokenInfo};
pub use transport::{MockTransport, Transport, UreqTransport};
pub use types::{BoundingBox, Coordinates};

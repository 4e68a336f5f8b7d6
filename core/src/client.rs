//! The client handle every service is built from.
//!
//! # Design
//! `MapiClient` is an `Arc` around the immutable configuration and the
//! transport, so cloning it into each service is cheap and all services
//! created from one client share the same credential and origin. It builds
//! requests but never sends them; sending belongs to `MapiRequest`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{decode_bytes, decode_json, decode_text, MapiRequest, RequestParams};
use crate::services::{
    DatasetsService, DirectionsService, GeocodingService, IsochroneService, MapMatchingService,
    MatrixService, OptimizationService, StaticService, StylesService, TilequeryService,
    TilesetsService, TokensService, UploadsService,
};
use crate::transport::{Transport, UreqTransport};

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

/// Shared handle wrapping configuration and transport.
#[derive(Clone)]
pub struct MapiClient {
    inner: Arc<ClientInner>,
}

impl MapiClient {
    /// Create a client that talks HTTP through a ureq agent.
    ///
    /// Fails only when the access token is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ClientInner { config, transport }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn access_token(&self) -> &str {
        self.inner.config.access_token()
    }

    pub fn origin(&self) -> &str {
        self.inner.config.origin()
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    /// Build a request whose response body is JSON decoded into `T`.
    pub fn create_request<T: DeserializeOwned>(&self, params: RequestParams) -> Result<MapiRequest<T>> {
        MapiRequest::new(self.clone(), params, decode_json::<T>)
    }

    /// Build a request whose response body is kept as raw bytes.
    pub fn create_binary_request(&self, params: RequestParams) -> Result<MapiRequest<Vec<u8>>> {
        MapiRequest::new(self.clone(), params, decode_bytes)
    }

    /// Build a request whose response body is read as UTF-8 text.
    pub fn create_text_request(&self, params: RequestParams) -> Result<MapiRequest<String>> {
        MapiRequest::new(self.clone(), params, decode_text)
    }

    pub fn datasets(&self) -> DatasetsService {
        DatasetsService::new(self)
    }

    pub fn directions(&self) -> DirectionsService {
        DirectionsService::new(self)
    }

    pub fn geocoding(&self) -> GeocodingService {
        GeocodingService::new(self)
    }

    pub fn isochrone(&self) -> IsochroneService {
        IsochroneService::new(self)
    }

    pub fn map_matching(&self) -> MapMatchingService {
        MapMatchingService::new(self)
    }

    pub fn matrix(&self) -> MatrixService {
        MatrixService::new(self)
    }

    pub fn optimization(&self) -> OptimizationService {
        OptimizationService::new(self)
    }

    pub fn static_images(&self) -> StaticService {
        StaticService::new(self)
    }

    pub fn styles(&self) -> StylesService {
        StylesService::new(self)
    }

    pub fn tilequery(&self) -> TilequeryService {
        TilequeryService::new(self)
    }

    pub fn tilesets(&self) -> TilesetsService {
        TilesetsService::new(self)
    }

    pub fn tokens(&self) -> TokensService {
        TokensService::new(self)
    }

    pub fn uploads(&self) -> UploadsService {
        UploadsService::new(self)
    }
}

impl fmt::Debug for MapiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapiClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

//! Geocoding API, forward and reverse.
//!
//! A geocoding response is both an API response and a GeoJSON
//! `FeatureCollection`: it carries the collection's `type` and `features`
//! next to the echoed `query` and the `attribution` notice.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::geojson::{
    Feature, FeatureCollection, FeatureCollectionType, FeatureId, FeatureType, Geometry, Properties,
};
use crate::request::{MapiRequest, RequestParams};
use crate::types::{coordinate_pair, wire_enum, BoundingBox, Coordinates};

const GEOCODE: &str = "/geocoding/v5/:mode/:query.json";

wire_enum! {
    #[derive(Default)]
    GeocodingMode {
        #[default]
        Places => "mapbox.places",
        PlacesPermanent => "mapbox.places-permanent",
    }
}

wire_enum! {
    PlaceType {
        Country => "country",
        Region => "region",
        Postcode => "postcode",
        District => "district",
        Place => "place",
        Locality => "locality",
        Neighborhood => "neighborhood",
        Address => "address",
        Poi => "poi",
        PoiLandmark => "poi.landmark",
    }
}

wire_enum! {
    ReverseMode {
        Distance => "distance",
        Score => "score",
    }
}

/// Bias for forward results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proximity {
    Coordinates(Coordinates),
    /// Bias around the caller's IP address.
    Ip,
}

impl std::fmt::Display for Proximity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Proximity::Coordinates(coordinates) => f.write_str(&coordinate_pair(coordinates)),
            Proximity::Ip => f.write_str("ip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardGeocode {
    pub query: String,
    pub mode: GeocodingMode,
    /// ISO 3166 alpha-2 country codes.
    pub countries: Vec<String>,
    pub proximity: Option<Proximity>,
    pub types: Vec<PlaceType>,
    pub autocomplete: Option<bool>,
    pub bbox: Option<BoundingBox>,
    pub limit: Option<u32>,
    pub language: Vec<String>,
    pub routing: Option<bool>,
    pub fuzzy_match: Option<bool>,
    pub worldview: Option<String>,
}

impl ForwardGeocode {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: GeocodingMode::default(),
            countries: Vec::new(),
            proximity: None,
            types: Vec::new(),
            autocomplete: None,
            bbox: None,
            limit: None,
            language: Vec::new(),
            routing: None,
            fuzzy_match: None,
            worldview: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverseGeocode {
    pub query: Coordinates,
    pub mode: GeocodingMode,
    pub countries: Vec<String>,
    pub types: Vec<PlaceType>,
    pub bbox: Option<BoundingBox>,
    pub limit: Option<u32>,
    pub language: Vec<String>,
    pub reverse_mode: Option<ReverseMode>,
    pub routing: Option<bool>,
    pub worldview: Option<String>,
}

impl ReverseGeocode {
    pub fn new(query: Coordinates) -> Self {
        Self {
            query,
            mode: GeocodingMode::default(),
            countries: Vec::new(),
            types: Vec::new(),
            bbox: None,
            limit: None,
            language: Vec::new(),
            reverse_mode: None,
            routing: None,
            worldview: None,
        }
    }
}

/// One level of the administrative hierarchy a result sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingContext {
    /// `<type>.<id>`, e.g. `region.13303`.
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata: Option<String>,
    /// ISO 3166 code, for countries and regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
}

/// A geocoding result: a GeoJSON feature plus the place fields the API adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingFeature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub id: FeatureId,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Feature types, e.g. `["place"]` or `["poi"]`.
    pub place_type: Vec<PlaceType>,
    /// 0 to 1, how well the result matches the query.
    pub relevance: f64,
    /// House number, for address results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Name of the place in the requested language.
    pub text: String,
    /// Full name including the context, e.g. `Paris, France`.
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_place_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Representative point, `[lng, lat]`.
    pub center: Coordinates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<GeocodingContext>,
}

impl From<GeocodingFeature> for Feature {
    fn from(feature: GeocodingFeature) -> Self {
        Feature {
            kind: feature.kind,
            id: Some(feature.id),
            geometry: Some(feature.geometry),
            properties: Some(feature.properties),
            bbox: feature.bbox.map(Vec::from),
        }
    }
}

/// Geocoding results. Deserializes from the same JSON as a
/// [`FeatureCollection`] and converts into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResponse {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    /// Forward: the query split into tokens. Reverse: `[lng, lat]`.
    pub query: Vec<Value>,
    pub features: Vec<GeocodingFeature>,
    #[serde(default)]
    pub attribution: String,
}

impl GeocodingResponse {
    pub fn to_feature_collection(&self) -> FeatureCollection {
        self.clone().into()
    }
}

impl From<GeocodingResponse> for FeatureCollection {
    fn from(response: GeocodingResponse) -> Self {
        FeatureCollection {
            kind: response.kind,
            features: response.features.into_iter().map(Feature::from).collect(),
            bbox: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocodingService {
    client: MapiClient,
}

impl GeocodingService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn forward_geocode(&self, config: &ForwardGeocode) -> Result<MapiRequest<GeocodingResponse>> {
        if config.query.trim().is_empty() {
            return Err(Error::invalid("query", "must not be empty"));
        }
        let params = RequestParams::get(GEOCODE)
            .param("mode", config.mode.as_str())
            .param("query", config.query.as_str())
            .query_list("country", &config.countries, ",")
            .query_opt("proximity", config.proximity)
            .query_list("types", &config.types, ",")
            .query_opt("autocomplete", config.autocomplete)
            .query_list("bbox", config.bbox.iter().flatten(), ",")
            .query_opt("limit", config.limit)
            .query_list("language", &config.language, ",")
            .query_opt("routing", config.routing)
            .query_opt("fuzzyMatch", config.fuzzy_match)
            .query_opt("worldview", config.worldview.as_deref());
        self.client.create_request(params)
    }

    pub fn reverse_geocode(&self, config: &ReverseGeocode) -> Result<MapiRequest<GeocodingResponse>> {
        let params = RequestParams::get(GEOCODE)
            .param("mode", config.mode.as_str())
            .param("query", coordinate_pair(&config.query))
            .query_list("country", &config.countries, ",")
            .query_list("types", &config.types, ",")
            .query_list("bbox", config.bbox.iter().flatten(), ",")
            .query_opt("limit", config.limit)
            .query_list("language", &config.language, ",")
            .query_opt("reverseMode", config.reverse_mode)
            .query_opt("routing", config.routing)
            .query_opt("worldview", config.worldview.as_deref());
        self.client.create_request(params)
    }
}

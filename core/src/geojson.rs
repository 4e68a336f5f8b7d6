//! GeoJSON records exchanged by the datasets, geocoding, isochrone and
//! tilequery services.
//!
//! Positions are `[longitude, latitude]` with an optional altitude, as in
//! RFC 7946. API inputs that must be exactly a pair use
//! [`Coordinates`](crate::types::Coordinates) instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `[longitude, latitude]` or `[longitude, latitude, altitude]`.
pub type Position = Vec<f64>;

/// Free-form feature properties.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Geometry::Point {
            coordinates: vec![longitude, latitude],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    #[default]
    FeatureCollection,
}

/// Feature ids may be strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    String(String),
    Number(serde_json::Number),
}

impl FeatureId {
    pub fn as_string(&self) -> String {
        match self {
            FeatureId::String(s) => s.clone(),
            FeatureId::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::String(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Some(Properties::new()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

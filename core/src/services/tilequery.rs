//! Tilequery API: features from vector tiles around a point.
//!
//! Every returned feature carries a `tilequery` property with its distance
//! from the query point, the geometry type and the source layer.

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::geojson::FeatureCollection;
use crate::request::{MapiRequest, RequestParams};
use crate::types::{coordinate_pair, wire_enum, Coordinates};

const TILEQUERY: &str = "/v4/:mapIds/tilequery/:coordinates.json";

wire_enum! {
    TilequeryGeometry {
        Polygon => "polygon",
        Linestring => "linestring",
        Point => "point",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListTilequeryFeatures {
    /// Tileset ids to query, at least one.
    pub map_ids: Vec<String>,
    pub coordinates: Coordinates,
    /// Meters.
    pub radius: Option<f64>,
    /// 1 to 50.
    pub limit: Option<u32>,
    pub dedupe: Option<bool>,
    pub geometry: Option<TilequeryGeometry>,
    pub layers: Vec<String>,
}

impl ListTilequeryFeatures {
    pub fn new(map_ids: Vec<String>, coordinates: Coordinates) -> Self {
        Self {
            map_ids,
            coordinates,
            radius: None,
            limit: None,
            dedupe: None,
            geometry: None,
            layers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TilequeryService {
    client: MapiClient,
}

impl TilequeryService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn list_features(&self, config: &ListTilequeryFeatures) -> Result<MapiRequest<FeatureCollection>> {
        if config.map_ids.is_empty() {
            return Err(Error::invalid("mapIds", "at least one tileset id is required"));
        }
        if matches!(config.limit, Some(limit) if !(1..=50).contains(&limit)) {
            return Err(Error::invalid("limit", "must be between 1 and 50"));
        }
        if matches!(config.radius, Some(radius) if radius < 0.0) {
            return Err(Error::invalid("radius", "must not be negative"));
        }
        let params = RequestParams::get(TILEQUERY)
            .param("mapIds", config.map_ids.join(","))
            .param("coordinates", coordinate_pair(&config.coordinates))
            .query_opt("radius", config.radius)
            .query_opt("limit", config.limit)
            .query_opt("dedupe", config.dedupe)
            .query_opt("geometry", config.geometry)
            .query_list("layers", &config.layers, ",");
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::services::test_support::{client, path, query};

    fn streets() -> Vec<String> {
        vec!["mapbox.mapbox-streets-v8".to_string(), "mapbox.mapbox-terrain-v2".to_string()]
    }

    #[test]
    fn map_ids_and_coordinates_in_path() {
        let (client, _) = client();
        let config = ListTilequeryFeatures {
            radius: Some(25.0),
            limit: Some(5),
            geometry: Some(TilequeryGeometry::Linestring),
            layers: vec!["road".to_string(), "poi_label".to_string()],
            ..ListTilequeryFeatures::new(streets(), [-122.42901, 37.80633])
        };
        let request = client.tilequery().list_features(&config).unwrap();
        assert_eq!(
            path(&request),
            "/v4/mapbox.mapbox-streets-v8,mapbox.mapbox-terrain-v2/tilequery/-122.42901,37.80633.json"
        );
        assert_eq!(query(&request, "radius").as_deref(), Some("25"));
        assert_eq!(query(&request, "geometry").as_deref(), Some("linestring"));
        assert_eq!(query(&request, "layers").as_deref(), Some("road,poi_label"));
    }

    #[test]
    fn limits() {
        let (client, _) = client();
        let tilequery = client.tilequery();
        assert!(tilequery
            .list_features(&ListTilequeryFeatures::new(Vec::new(), [0.0, 0.0]))
            .is_err());
        let over = ListTilequeryFeatures {
            limit: Some(51),
            ..ListTilequeryFeatures::new(streets(), [0.0, 0.0])
        };
        assert!(matches!(
            tilequery.list_features(&over),
            Err(Error::InvalidInput { field: "limit", .. })
        ));
    }

    #[tokio::test]
    async fn decodes_features() {
        let (client, mock) = client();
        mock.push(HttpResponse::json(
            200,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":1234,
                "geometry":{"type":"Point","coordinates":[-122.42901,37.80633]},
                "properties":{"tilequery":{"distance":0,"geometry":"point","layer":"poi_label"}}}]}"#,
        ));
        let response = client
            .tilequery()
            .list_features(&ListTilequeryFeatures::new(streets(), [-122.42901, 37.80633]))
            .unwrap()
            .send()
            .await
            .unwrap();
        let feature = &response.body.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["tilequery"]["layer"], "poi_label");
    }
}

//! Optimization API: the fastest trip visiting every waypoint.

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{MapiRequest, RequestParams};
use crate::types::{
    check_count, coordinate_list, optional_list, wire_enum, Approach, Bearing, Coordinates,
    GeometryFormat, Overview, Radius, Route, RouteAnnotation, RoutingProfile,
};

const OPTIMIZATION: &str = "/optimized-trips/v1/mapbox/:profile/:coordinates";

wire_enum! {
    TripDestination {
        Any => "any",
        Last => "last",
    }
}

wire_enum! {
    TripSource {
        Any => "any",
        First => "first",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationWaypoint {
    pub coordinates: Coordinates,
    pub approach: Option<Approach>,
    pub bearing: Option<Bearing>,
    pub radius: Option<Radius>,
}

impl From<Coordinates> for OptimizationWaypoint {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            approach: None,
            bearing: None,
            radius: None,
        }
    }
}

/// A pickup that must be visited before its dropoff. Both are indices into
/// `waypoints`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub pickup: usize,
    pub dropoff: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetOptimization {
    pub profile: RoutingProfile,
    /// Between 2 and 12 waypoints.
    pub waypoints: Vec<OptimizationWaypoint>,
    pub annotations: Vec<RouteAnnotation>,
    pub destination: Option<TripDestination>,
    pub distributions: Vec<Distribution>,
    pub geometries: Option<GeometryFormat>,
    pub language: Option<String>,
    pub overview: Option<Overview>,
    pub roundtrip: Option<bool>,
    pub source: Option<TripSource>,
    pub steps: Option<bool>,
}

impl GetOptimization {
    pub fn new(waypoints: Vec<OptimizationWaypoint>) -> Self {
        Self {
            profile: RoutingProfile::default(),
            waypoints,
            annotations: Vec::new(),
            destination: None,
            distributions: Vec::new(),
            geometries: None,
            language: None,
            overview: None,
            roundtrip: None,
            source: None,
            steps: None,
        }
    }
}

/// A waypoint with its position in the optimized trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedWaypoint {
    #[serde(default)]
    pub name: String,
    pub location: Coordinates,
    pub waypoint_index: usize,
    pub trips_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub code: String,
    #[serde(default)]
    pub waypoints: Vec<OptimizedWaypoint>,
    #[serde(default)]
    pub trips: Vec<Route>,
}

#[derive(Debug, Clone)]
pub struct OptimizationService {
    client: MapiClient,
}

impl OptimizationService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_optimization(&self, config: &GetOptimization) -> Result<MapiRequest<OptimizationResponse>> {
        let waypoints = &config.waypoints;
        check_count("waypoints", waypoints.len(), 2, 12)?;
        if config
            .distributions
            .iter()
            .any(|d| d.pickup >= waypoints.len() || d.dropoff >= waypoints.len())
        {
            return Err(Error::invalid("distributions", "index out of range"));
        }

        let coordinates: Vec<Coordinates> = waypoints.iter().map(|w| w.coordinates).collect();
        let distributions = config
            .distributions
            .iter()
            .map(|d| format!("{},{}", d.pickup, d.dropoff));
        let params = RequestParams::get(OPTIMIZATION)
            .param("profile", config.profile.as_str())
            .param("coordinates", coordinate_list(&coordinates))
            .query_list("annotations", &config.annotations, ",")
            .query_opt("destination", config.destination)
            .query_list("distributions", distributions, ";")
            .query_opt("geometries", config.geometries)
            .query_opt("language", config.language.as_deref())
            .query_opt("overview", config.overview)
            .query_opt("roundtrip", config.roundtrip)
            .query_opt("source", config.source)
            .query_opt("steps", config.steps)
            .query_opt(
                "approaches",
                optional_list(waypoints, |w| w.approach.map(|a| a.to_string())),
            )
            .query_opt(
                "bearings",
                optional_list(waypoints, |w| w.bearing.map(|b| b.to_string())),
            )
            .query_opt(
                "radiuses",
                optional_list(waypoints, |w| w.radius.map(|r| r.to_string())),
            );
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::services::test_support::{client, path, query};

    fn stops(n: usize) -> Vec<OptimizationWaypoint> {
        (0..n).map(|i| OptimizationWaypoint::from([-122.42, 37.78 + i as f64 / 100.0])).collect()
    }

    #[test]
    fn distributions_are_pairs_joined_by_semicolons() {
        let (client, _) = client();
        let config = GetOptimization {
            profile: RoutingProfile::Cycling,
            distributions: vec![
                Distribution { pickup: 0, dropoff: 2 },
                Distribution { pickup: 1, dropoff: 3 },
            ],
            roundtrip: Some(false),
            source: Some(TripSource::First),
            destination: Some(TripDestination::Last),
            ..GetOptimization::new(stops(4))
        };
        let request = client.optimization().get_optimization(&config).unwrap();
        assert!(path(&request).starts_with("/optimized-trips/v1/mapbox/cycling/-122.42,37.78;"));
        assert_eq!(query(&request, "distributions").as_deref(), Some("0,2;1,3"));
        assert_eq!(query(&request, "roundtrip").as_deref(), Some("false"));
        assert_eq!(query(&request, "source").as_deref(), Some("first"));
        assert_eq!(query(&request, "destination").as_deref(), Some("last"));
    }

    #[test]
    fn bounds() {
        let (client, _) = client();
        let optimization = client.optimization();
        assert!(optimization.get_optimization(&GetOptimization::new(stops(13))).is_err());
        assert!(optimization.get_optimization(&GetOptimization::new(stops(12))).is_ok());
        let bad = GetOptimization {
            distributions: vec![Distribution { pickup: 0, dropoff: 7 }],
            ..GetOptimization::new(stops(3))
        };
        assert!(matches!(
            optimization.get_optimization(&bad),
            Err(Error::InvalidInput { field: "distributions", .. })
        ));
    }

    #[tokio::test]
    async fn decodes_trips() {
        let (client, mock) = client();
        mock.push(HttpResponse::json(
            200,
            r#"{"code":"Ok",
                "waypoints":[{"name":"","location":[-122.42,37.78],"waypoint_index":0,"trips_index":0},
                             {"name":"","location":[-122.42,37.79],"waypoint_index":1,"trips_index":0}],
                "trips":[{"distance":1200.0,"duration":300.0,"legs":[]}]}"#,
        ));
        let response = client
            .optimization()
            .get_optimization(&GetOptimization::new(stops(2)))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.body.trips.len(), 1);
        assert_eq!(response.body.waypoints[1].waypoint_index, 1);
    }
}

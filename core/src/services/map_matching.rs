//! Map Matching API: snap a noisy trace to the road network.
//!
//! Traces can be long, so the request is a form-encoded POST instead of a
//! GET with the coordinates in the path.

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::Result;
use crate::request::{MapiRequest, RequestParams};
use crate::types::{
    check_count, coordinate_list, optional_list, Approach, Coordinates, GeometryFormat, Overview,
    Radius, Route, RouteAnnotation, RoutingProfile,
};

const MATCHING: &str = "/matching/v5/mapbox/:profile";

#[derive(Debug, Clone, PartialEq)]
pub struct MapMatchingPoint {
    pub coordinates: Coordinates,
    pub approach: Option<Approach>,
    pub radius: Option<Radius>,
    /// `Some(false)` demotes the point to a plain tracepoint. The first and
    /// last points are always waypoints.
    pub is_waypoint: Option<bool>,
    pub waypoint_name: Option<String>,
    /// Unix time in seconds.
    pub timestamp: Option<i64>,
}

impl MapMatchingPoint {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            approach: None,
            radius: None,
            is_waypoint: None,
            waypoint_name: None,
            timestamp: None,
        }
    }
}

impl From<Coordinates> for MapMatchingPoint {
    fn from(coordinates: Coordinates) -> Self {
        Self::new(coordinates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetMatch {
    /// Between 2 and 100 points.
    pub points: Vec<MapMatchingPoint>,
    pub profile: RoutingProfile,
    pub annotations: Vec<RouteAnnotation>,
    pub geometries: Option<GeometryFormat>,
    pub language: Option<String>,
    pub overview: Option<Overview>,
    pub steps: Option<bool>,
    pub tidy: Option<bool>,
}

impl GetMatch {
    pub fn new(points: Vec<MapMatchingPoint>) -> Self {
        Self {
            points,
            profile: RoutingProfile::default(),
            annotations: Vec::new(),
            geometries: None,
            language: None,
            overview: None,
            steps: None,
            tidy: None,
        }
    }

    fn form(&self) -> Vec<(String, String)> {
        let points = &self.points;
        let coordinates: Vec<Coordinates> = points.iter().map(|p| p.coordinates).collect();
        let last = points.len().saturating_sub(1);

        let mut form = vec![("coordinates".to_string(), coordinate_list(&coordinates))];
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                form.push((key.to_string(), value));
            }
        };

        push("radiuses", optional_list(points, |p| p.radius.map(|r| r.to_string())));
        if points.iter().any(|p| p.is_waypoint == Some(false)) {
            let indices: Vec<String> = points
                .iter()
                .enumerate()
                .filter(|(i, p)| *i == 0 || *i == last || p.is_waypoint != Some(false))
                .map(|(i, _)| i.to_string())
                .collect();
            push("waypoints", Some(indices.join(";")));
        }
        push("timestamps", optional_list(points, |p| p.timestamp.map(|t| t.to_string())));
        push("waypoint_names", optional_list(points, |p| p.waypoint_name.clone()));
        push("approaches", optional_list(points, |p| p.approach.map(|a| a.to_string())));
        if !self.annotations.is_empty() {
            let joined: Vec<&str> = self.annotations.iter().map(|a| a.as_str()).collect();
            push("annotations", Some(joined.join(",")));
        }
        push("geometries", self.geometries.map(|g| g.to_string()));
        push("language", self.language.clone());
        push("overview", self.overview.map(|o| o.to_string()));
        push("steps", self.steps.map(|s| s.to_string()));
        push("tidy", self.tidy.map(|t| t.to_string()));
        form
    }
}

/// A route fitted to the trace, with a confidence between 0 and 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matching {
    pub confidence: f64,
    #[serde(flatten)]
    pub route: Route,
}

/// An input point snapped to the road network. `null` in the response when
/// the point was dropped as an outlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracepoint {
    pub matchings_index: usize,
    pub waypoint_index: Option<usize>,
    pub alternatives_count: u32,
    pub location: Coordinates,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMatchingResponse {
    pub code: String,
    #[serde(default)]
    pub matchings: Vec<Matching>,
    #[serde(default)]
    pub tracepoints: Vec<Option<Tracepoint>>,
}

#[derive(Debug, Clone)]
pub struct MapMatchingService {
    client: MapiClient,
}

impl MapMatchingService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_match(&self, config: &GetMatch) -> Result<MapiRequest<MapMatchingResponse>> {
        check_count("points", config.points.len(), 2, 100)?;
        let params = RequestParams::post(MATCHING)
            .param("profile", config.profile.as_str())
            .form(config.form());
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::request::RequestBody;
    use crate::services::test_support::{client, path};

    fn form_value(request: &MapiRequest<MapMatchingResponse>, key: &str) -> Option<String> {
        match request.body() {
            Some(RequestBody::Form(pairs)) => pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    #[test]
    fn trace_goes_in_the_form_body() {
        let (client, _) = client();
        let points = vec![
            MapMatchingPoint::from([-117.1728, 32.7124]),
            MapMatchingPoint::from([-117.1702, 32.7127]),
        ];
        let request = client.map_matching().get_match(&GetMatch::new(points)).unwrap();
        assert_eq!(request.method(), HttpMethod::Post);
        assert_eq!(path(&request), "/matching/v5/mapbox/driving");
        assert_eq!(
            form_value(&request, "coordinates").as_deref(),
            Some("-117.1728,32.7124;-117.1702,32.7127")
        );
        assert!(form_value(&request, "waypoints").is_none());
        assert!(form_value(&request, "radiuses").is_none());
    }

    #[test]
    fn endpoints_stay_waypoints() {
        let (client, _) = client();
        let mut points: Vec<MapMatchingPoint> = (0..4)
            .map(|i| MapMatchingPoint::from([i as f64, 0.0]))
            .collect();
        points[0].is_waypoint = Some(false);
        points[1].is_waypoint = Some(false);
        points[3].is_waypoint = Some(false);
        points[2].timestamp = Some(1_700_000_000);
        points[1].radius = Some(Radius::Meters(10.0));
        let config = GetMatch {
            tidy: Some(true),
            ..GetMatch::new(points)
        };
        let request = client.map_matching().get_match(&config).unwrap();
        assert_eq!(form_value(&request, "waypoints").as_deref(), Some("0;2;3"));
        assert_eq!(form_value(&request, "timestamps").as_deref(), Some(";;1700000000;"));
        assert_eq!(form_value(&request, "radiuses").as_deref(), Some(";10;;"));
        assert_eq!(form_value(&request, "tidy").as_deref(), Some("true"));
    }

    #[test]
    fn point_count_is_bounded() {
        let (client, _) = client();
        let one = GetMatch::new(vec![MapMatchingPoint::from([0.0, 0.0])]);
        assert!(client.map_matching().get_match(&one).is_err());
        let too_many = GetMatch::new(vec![MapMatchingPoint::from([0.0, 0.0]); 101]);
        assert!(client.map_matching().get_match(&too_many).is_err());
    }

    #[tokio::test]
    async fn decodes_matchings_and_dropped_tracepoints() {
        let (client, mock) = client();
        mock.push(HttpResponse::json(
            200,
            r#"{"code":"Ok",
                "matchings":[{"confidence":0.9,"distance":120.5,"duration":20.1,"legs":[]}],
                "tracepoints":[null,{"matchings_index":0,"waypoint_index":0,"alternatives_count":0,"location":[-117.17,32.71],"name":"Market St"}]}"#,
        ));
        let points = vec![MapMatchingPoint::from([0.0, 0.0]), MapMatchingPoint::from([1.0, 1.0])];
        let response = client
            .map_matching()
            .get_match(&GetMatch::new(points))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.body.matchings[0].confidence, 0.9);
        assert_eq!(response.body.matchings[0].route.distance, 120.5);
        assert!(response.body.tracepoints[0].is_none());
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.header("content-type"), Some("application/x-www-form-urlencoded"));
    }
}

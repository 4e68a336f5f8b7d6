//! Directions API.

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::Result;
use crate::request::{MapiRequest, RequestParams};
use crate::types::{
    check_count, coordinate_list, optional_list, wire_enum, Approach, Bearing, Coordinates,
    GeometryFormat, Overview, Radius, Route, RouteAnnotation, RoutingProfile, Waypoint,
};

const DIRECTIONS: &str = "/directions/v5/mapbox/:profile/:coordinates";

wire_enum! {
    DirectionsExclude {
        Motorway => "motorway",
        Toll => "toll",
        Ferry => "ferry",
    }
}

wire_enum! {
    VoiceUnits {
        Imperial => "imperial",
        Metric => "metric",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsWaypoint {
    pub coordinates: Coordinates,
    pub approach: Option<Approach>,
    pub bearing: Option<Bearing>,
    pub radius: Option<Radius>,
    pub waypoint_name: Option<String>,
}

impl DirectionsWaypoint {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            approach: None,
            bearing: None,
            radius: None,
            waypoint_name: None,
        }
    }
}

impl From<Coordinates> for DirectionsWaypoint {
    fn from(coordinates: Coordinates) -> Self {
        Self::new(coordinates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDirections {
    pub profile: RoutingProfile,
    /// Between 2 and 25 waypoints.
    pub waypoints: Vec<DirectionsWaypoint>,
    pub alternatives: Option<bool>,
    pub annotations: Vec<RouteAnnotation>,
    pub banner_instructions: Option<bool>,
    pub continue_straight: Option<bool>,
    pub exclude: Option<DirectionsExclude>,
    pub geometries: Option<GeometryFormat>,
    pub language: Option<String>,
    pub overview: Option<Overview>,
    pub roundabout_exits: Option<bool>,
    pub steps: Option<bool>,
    pub voice_instructions: Option<bool>,
    pub voice_units: Option<VoiceUnits>,
    /// Meters per second, walking profile only.
    pub walking_speed: Option<f64>,
    /// Between -1 and 1, walking profile only.
    pub walkway_bias: Option<f64>,
}

impl GetDirections {
    pub fn new(waypoints: Vec<DirectionsWaypoint>) -> Self {
        Self {
            profile: RoutingProfile::default(),
            waypoints,
            alternatives: None,
            annotations: Vec::new(),
            banner_instructions: None,
            continue_straight: None,
            exclude: None,
            geometries: None,
            language: None,
            overview: None,
            roundabout_exits: None,
            steps: None,
            voice_instructions: None,
            voice_units: None,
            walking_speed: None,
            walkway_bias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub code: String,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectionsService {
    client: MapiClient,
}

impl DirectionsService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_directions(&self, config: &GetDirections) -> Result<MapiRequest<DirectionsResponse>> {
        check_count("waypoints", config.waypoints.len(), 2, 25)?;
        let waypoints = &config.waypoints;
        let coordinates: Vec<Coordinates> = waypoints.iter().map(|w| w.coordinates).collect();

        let params = RequestParams::get(DIRECTIONS)
            .param("profile", config.profile.as_str())
            .param("coordinates", coordinate_list(&coordinates))
            .query_opt("alternatives", config.alternatives)
            .query_list("annotations", &config.annotations, ",")
            .query_opt("banner_instructions", config.banner_instructions)
            .query_opt("continue_straight", config.continue_straight)
            .query_opt("exclude", config.exclude)
            .query_opt("geometries", config.geometries)
            .query_opt("language", config.language.as_deref())
            .query_opt("overview", config.overview)
            .query_opt("roundabout_exits", config.roundabout_exits)
            .query_opt("steps", config.steps)
            .query_opt("voice_instructions", config.voice_instructions)
            .query_opt("voice_units", config.voice_units)
            .query_opt("walking_speed", config.walking_speed)
            .query_opt("walkway_bias", config.walkway_bias)
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
            )
            .query_opt(
                "waypoint_names",
                optional_list(waypoints, |w| w.waypoint_name.clone()),
            );
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::http::HttpResponse;
    use crate::services::test_support::{client, path, query};

    fn two_stops() -> Vec<DirectionsWaypoint> {
        vec![[13.4301, 52.5109].into(), [13.4265, 52.508].into()]
    }

    #[test]
    fn default_profile_is_driving() {
        let (client, _) = client();
        let request = client
            .directions()
            .get_directions(&GetDirections::new(two_stops()))
            .unwrap();
        assert_eq!(
            path(&request),
            "/directions/v5/mapbox/driving/13.4301,52.5109;13.4265,52.508"
        );
        assert!(query(&request, "approaches").is_none());
    }

    #[test]
    fn per_waypoint_lists_keep_positions() {
        let (client, _) = client();
        let mut waypoints = two_stops();
        waypoints[1].bearing = Some(Bearing { angle: 45, range: 90 });
        waypoints[0].radius = Some(Radius::Unlimited);
        waypoints[1].waypoint_name = Some("home".to_string());
        let config = GetDirections {
            profile: RoutingProfile::Walking,
            annotations: vec![RouteAnnotation::Distance, RouteAnnotation::Speed],
            steps: Some(true),
            overview: Some(Overview::False),
            ..GetDirections::new(waypoints)
        };
        let request = client.directions().get_directions(&config).unwrap();
        assert_eq!(query(&request, "bearings").as_deref(), Some(";45,90"));
        assert_eq!(query(&request, "radiuses").as_deref(), Some("unlimited;"));
        assert_eq!(query(&request, "waypoint_names").as_deref(), Some(";home"));
        assert_eq!(query(&request, "annotations").as_deref(), Some("distance,speed"));
        assert_eq!(query(&request, "steps").as_deref(), Some("true"));
        assert_eq!(query(&request, "overview").as_deref(), Some("false"));
    }

    #[test]
    fn waypoint_count_is_bounded() {
        let (client, _) = client();
        let one = GetDirections::new(vec![DirectionsWaypoint::new([0.0, 0.0])]);
        assert!(matches!(
            client.directions().get_directions(&one),
            Err(Error::InvalidInput { field: "waypoints", .. })
        ));
        let many = GetDirections::new(vec![DirectionsWaypoint::new([0.0, 0.0]); 26]);
        assert!(client.directions().get_directions(&many).is_err());
    }

    #[tokio::test]
    async fn decodes_routes() {
        let (client, mock) = client();
        mock.push(HttpResponse::json(
            200,
            r#"{"code":"Ok","uuid":"abc","waypoints":[{"name":"Kirchstraße","location":[13.43,52.51]}],
               "routes":[{"duration":88.4,"distance":830.4,"weight":88.4,"weight_name":"routability",
                          "geometry":"oklyJ`{ph@yBuY_F{^_FxJoBrBs@d@mAT",
                          "legs":[{"distance":830.4,"duration":88.4,"summary":"","steps":[]}]}]}"#,
        ));
        let response = client
            .directions()
            .get_directions(&GetDirections::new(two_stops()))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.body.code, "Ok");
        assert_eq!(response.body.routes[0].legs.len(), 1);
        assert_eq!(response.body.waypoints[0].location, [13.43, 52.51]);
    }
}

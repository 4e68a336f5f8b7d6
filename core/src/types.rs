//! Types shared by the routing-family services (directions, map matching,
//! matrix, isochrone, optimization) and small helpers for rendering them.
//!
//! Every coordinate input is `[longitude, latitude]`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// `[longitude, latitude]`. Exactly two values: triples neither type-check nor
/// deserialize.
pub type Coordinates = [f64; 2];

/// `[minLongitude, minLatitude, maxLongitude, maxLatitude]`.
pub type BoundingBox = [f64; 4];

/// Render `[[lng, lat], ..]` as `lng,lat;lng,lat`.
pub(crate) fn coordinate_list(coordinates: &[Coordinates]) -> String {
    coordinates
        .iter()
        .map(|[lng, lat]| format!("{lng},{lat}"))
        .collect::<Vec<_>>()
        .join(";")
}

pub(crate) fn coordinate_pair(coordinates: &Coordinates) -> String {
    format!("{},{}", coordinates[0], coordinates[1])
}

pub(crate) fn check_count(field: &'static str, len: usize, min: usize, max: usize) -> Result<()> {
    if len < min || len > max {
        return Err(Error::invalid(
            field,
            format!("expected between {min} and {max} items, got {len}"),
        ));
    }
    Ok(())
}

/// Join per-waypoint values with `;`, but only if at least one is set.
pub(crate) fn optional_list<T, F>(items: &[T], render: F) -> Option<String>
where
    F: Fn(&T) -> Option<String>,
{
    let rendered: Vec<Option<String>> = items.iter().map(render).collect();
    if rendered.iter().all(Option::is_none) {
        return None;
    }
    Some(
        rendered
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join(";"),
    )
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
pub(crate) use wire_enum;

wire_enum! {
    /// Routing profile.
    #[derive(Default)]
    RoutingProfile {
        DrivingTraffic => "driving-traffic",
        #[default]
        Driving => "driving",
        Walking => "walking",
        Cycling => "cycling",
    }
}

wire_enum! {
    /// Which side of the road a route should approach a point from.
    Approach {
        Unrestricted => "unrestricted",
        Curb => "curb",
    }
}

wire_enum! {
    /// Format of returned route geometries.
    GeometryFormat {
        GeoJson => "geojson",
        Polyline => "polyline",
        Polyline6 => "polyline6",
    }
}

wire_enum! {
    /// Level of detail of the route overview geometry.
    Overview {
        Full => "full",
        Simplified => "simplified",
        False => "false",
    }
}

wire_enum! {
    /// Per-segment metadata along a route.
    RouteAnnotation {
        Duration => "duration",
        Distance => "distance",
        Speed => "speed",
        Congestion => "congestion",
    }
}

/// Limits the search to a direction of travel at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bearing {
    /// Clockwise from true north, 0–360.
    pub angle: u16,
    /// Allowed deviation in degrees, 0–180.
    pub range: u16,
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.angle, self.range)
    }
}

/// Snapping radius around a waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    Meters(f64),
    Unlimited,
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Radius::Meters(meters) => write!(f, "{meters}"),
            Radius::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// A waypoint snapped to the road network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: String,
    pub location: Coordinates,
    /// Meters between the input coordinate and the snapped location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A route between waypoints. Distances in meters, durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub duration: f64,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Encoded polyline string or a GeoJSON LineString, depending on the
    /// requested `geometries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<LegAnnotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub maneuver: StepManeuver,
    pub distance: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_instructions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_instructions: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepManeuver {
    pub location: Coordinates,
    #[serde(default)]
    pub bearing_before: f64,
    #[serde(default)]
    pub bearing_after: f64,
    #[serde(default)]
    pub instruction: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_list_is_lng_lat_semicolon_separated() {
        assert_eq!(
            coordinate_list(&[[13.43, 52.51], [13.42, 52.5]]),
            "13.43,52.51;13.42,52.5"
        );
    }

    #[test]
    fn coordinates_reject_triples() {
        let pair: std::result::Result<Coordinates, _> = serde_json::from_str("[13.43, 52.51]");
        assert!(pair.is_ok());
        let triple: std::result::Result<Coordinates, _> = serde_json::from_str("[13.43, 52.51, 0]");
        assert!(triple.is_err());
        let single: std::result::Result<Coordinates, _> = serde_json::from_str("[13.43]");
        assert!(single.is_err());
    }

    #[test]
    fn optional_list_only_when_something_is_set() {
        let items = [Some(1), None, Some(3)];
        assert_eq!(
            optional_list(&items, |i| i.map(|v| v.to_string())).as_deref(),
            Some("1;;3")
        );
        let empty: [Option<u8>; 2] = [None, None];
        assert!(optional_list(&empty, |i| i.map(|v| v.to_string())).is_none());
    }

    #[test]
    fn wire_values_match_the_api() {
        assert_eq!(RoutingProfile::DrivingTraffic.as_str(), "driving-traffic");
        assert_eq!(RoutingProfile::default(), RoutingProfile::Driving);
        assert_eq!(Overview::False.to_string(), "false");
        assert_eq!(serde_json::to_string(&GeometryFormat::Polyline6).unwrap(), "\"polyline6\"");
        assert_eq!(Bearing { angle: 45, range: 90 }.to_string(), "45,90");
        assert_eq!(Radius::Unlimited.to_string(), "unlimited");
        assert_eq!(Radius::Meters(25.0).to_string(), "25");
    }

    #[test]
    fn count_bounds_are_inclusive() {
        assert!(check_count("waypoints", 2, 2, 25).is_ok());
        assert!(check_count("waypoints", 25, 2, 25).is_ok());
        assert!(check_count("waypoints", 1, 2, 25).is_err());
        assert!(check_count("waypoints", 26, 2, 25).is_err());
    }
}

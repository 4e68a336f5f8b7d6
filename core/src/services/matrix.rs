//! Matrix API: travel times and distances between many points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{MapiRequest, RequestParams};
use crate::types::{
    check_count, coordinate_list, optional_list, wire_enum, Approach, Coordinates, RoutingProfile,
    Waypoint,
};

const MATRIX: &str = "/directions-matrix/v1/mapbox/:profile/:coordinates";

wire_enum! {
    MatrixAnnotation {
        Duration => "duration",
        Distance => "distance",
    }
}

/// Which points act as sources or destinations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatrixPoints {
    #[default]
    All,
    /// Indices into `points`.
    Indices(Vec<usize>),
}

impl fmt::Display for MatrixPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixPoints::All => f.write_str("all"),
            MatrixPoints::Indices(indices) => {
                let joined: Vec<String> = indices.iter().map(usize::to_string).collect();
                f.write_str(&joined.join(";"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPoint {
    pub coordinates: Coordinates,
    pub approach: Option<Approach>,
}

impl From<Coordinates> for MatrixPoint {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            approach: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetMatrix {
    /// Between 2 and 25 points; at most 10 with `driving-traffic`.
    pub points: Vec<MatrixPoint>,
    pub profile: RoutingProfile,
    pub annotations: Vec<MatrixAnnotation>,
    pub sources: Option<MatrixPoints>,
    pub destinations: Option<MatrixPoints>,
}

impl GetMatrix {
    pub fn new(points: Vec<MatrixPoint>) -> Self {
        Self {
            points,
            profile: RoutingProfile::default(),
            annotations: Vec::new(),
            sources: None,
            destinations: None,
        }
    }

    fn validate(&self) -> Result<()> {
        let max = match self.profile {
            RoutingProfile::DrivingTraffic => 10,
            _ => 25,
        };
        check_count("points", self.points.len(), 2, max)?;
        for (field, selection) in [("sources", &self.sources), ("destinations", &self.destinations)] {
            if let Some(MatrixPoints::Indices(indices)) = selection {
                if indices.is_empty() {
                    return Err(Error::invalid(field, "at least one index is required"));
                }
                if indices.iter().any(|i| *i >= self.points.len()) {
                    return Err(Error::invalid(field, "index out of range"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResponse {
    pub code: String,
    /// Seconds, `None` where no route was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<Vec<Option<f64>>>>,
    /// Meters, `None` where no route was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    pub sources: Vec<Waypoint>,
    pub destinations: Vec<Waypoint>,
}

#[derive(Debug, Clone)]
pub struct MatrixService {
    client: MapiClient,
}

impl MatrixService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_matrix(&self, config: &GetMatrix) -> Result<MapiRequest<MatrixResponse>> {
        config.validate()?;
        let coordinates: Vec<Coordinates> = config.points.iter().map(|p| p.coordinates).collect();
        let params = RequestParams::get(MATRIX)
            .param("profile", config.profile.as_str())
            .param("coordinates", coordinate_list(&coordinates))
            .query_list("annotations", &config.annotations, ",")
            .query_opt(
                "approaches",
                optional_list(&config.points, |p| p.approach.map(|a| a.to_string())),
            )
            .query_opt("sources", config.sources.as_ref())
            .query_opt("destinations", config.destinations.as_ref());
        self.client.create_request(params)
    }
}

//! Isochrone API: areas reachable within given travel times.

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::geojson::FeatureCollection;
use crate::request::{MapiRequest, RequestParams};
use crate::types::{check_count, coordinate_pair, wire_enum, Coordinates};

const ISOCHRONE: &str = "/isochrone/v1/mapbox/:profile/:coordinates";

wire_enum! {
    #[derive(Default)]
    IsochroneProfile {
        #[default]
        Driving => "driving",
        Walking => "walking",
        Cycling => "cycling",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetContours {
    pub profile: IsochroneProfile,
    pub coordinates: Coordinates,
    /// One to four contour times, each 1 to 60 minutes.
    pub minutes: Vec<u32>,
    /// Hex colors without `#`, one per contour.
    pub colors: Vec<String>,
    pub polygons: Option<bool>,
    /// Between 0 and 1.
    pub denoise: Option<f64>,
    /// Simplification tolerance in meters.
    pub generalize: Option<f64>,
}

impl GetContours {
    pub fn new(coordinates: Coordinates, minutes: Vec<u32>) -> Self {
        Self {
            profile: IsochroneProfile::default(),
            coordinates,
            minutes,
            colors: Vec::new(),
            polygons: None,
            denoise: None,
            generalize: None,
        }
    }

    fn validate(&self) -> Result<()> {
        check_count("minutes", self.minutes.len(), 1, 4)?;
        if let Some(minute) = self.minutes.iter().find(|m| !(1..=60).contains(*m)) {
            return Err(Error::invalid("minutes", format!("{minute} is outside 1..=60")));
        }
        if !self.colors.is_empty() && self.colors.len() != self.minutes.len() {
            return Err(Error::invalid("colors", "must have one color per contour"));
        }
        if let Some(denoise) = self.denoise {
            if !(0.0..=1.0).contains(&denoise) {
                return Err(Error::invalid("denoise", "must be between 0 and 1"));
            }
        }
        if matches!(self.generalize, Some(g) if g < 0.0) {
            return Err(Error::invalid("generalize", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct IsochroneService {
    client: MapiClient,
}

impl IsochroneService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_contours(&self, config: &GetContours) -> Result<MapiRequest<FeatureCollection>> {
        config.validate()?;
        let colors = config.colors.iter().map(|c| c.trim_start_matches('#'));
        let params = RequestParams::get(ISOCHRONE)
            .param("profile", config.profile.as_str())
            .param("coordinates", coordinate_pair(&config.coordinates))
            .query_list("contours_minutes", &config.minutes, ",")
            .query_list("contours_colors", colors, ",")
            .query_opt("polygons", config.polygons)
            .query_opt("denoise", config.denoise)
            .query_opt("generalize", config.generalize);
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{client, path, query};

    #[test]
    fn contours_and_colors_are_comma_joined() {
        let (client, _) = client();
        let config = GetContours {
            profile: IsochroneProfile::Walking,
            colors: vec!["#ff0000".to_string(), "00ff00".to_string()],
            polygons: Some(true),
            ..GetContours::new([-118.22258, 33.99038], vec![5, 10])
        };
        let request = client.isochrone().get_contours(&config).unwrap();
        assert_eq!(path(&request), "/isochrone/v1/mapbox/walking/-118.22258,33.99038");
        assert_eq!(query(&request, "contours_minutes").as_deref(), Some("5,10"));
        assert_eq!(query(&request, "contours_colors").as_deref(), Some("ff0000,00ff00"));
        assert_eq!(query(&request, "polygons").as_deref(), Some("true"));
    }

    #[test]
    fn minute_bounds() {
        let (client, _) = client();
        let isochrone = client.isochrone();
        assert!(isochrone.get_contours(&GetContours::new([0.0, 0.0], vec![])).is_err());
        assert!(isochrone.get_contours(&GetContours::new([0.0, 0.0], vec![1, 2, 3, 4, 5])).is_err());
        assert!(isochrone.get_contours(&GetContours::new([0.0, 0.0], vec![61])).is_err());
        assert!(isochrone.get_contours(&GetContours::new([0.0, 0.0], vec![0])).is_err());
        assert!(isochrone.get_contours(&GetContours::new([0.0, 0.0], vec![1, 60])).is_ok());
    }

    #[test]
    fn colors_must_match_contours() {
        let (client, _) = client();
        let config = GetContours {
            colors: vec!["ff0000".to_string()],
            ..GetContours::new([0.0, 0.0], vec![5, 10])
        };
        let err = client.isochrone().get_contours(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "colors", .. }));
    }

    #[test]
    fn denoise_range() {
        let (client, _) = client();
        let config = GetContours {
            denoise: Some(1.5),
            ..GetContours::new([0.0, 0.0], vec![5])
        };
        assert!(client.isochrone().get_contours(&config).is_err());
    }
}

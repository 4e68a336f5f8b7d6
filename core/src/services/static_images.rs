//! Static Images API: render a style to a PNG, optionally with overlays.
//!
//! Overlays, camera and size all travel in the path:
//! `/styles/v1/:ownerId/:styleId/static/[overlay/]position/WxH[@2x]`.

use serde_json::Value;

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::polyline;
use crate::request::{MapiRequest, RequestParams};
use crate::types::{coordinate_pair, wire_enum, Coordinates};

const STATIC: &str = "/styles/v1/:ownerId/:styleId/static/:position/:dimensions";
const STATIC_WITH_OVERLAY: &str = "/styles/v1/:ownerId/:styleId/static/:overlay/:position/:dimensions";

wire_enum! {
    MarkerSize {
        Small => "s",
        Large => "l",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Marker {
        size: MarkerSize,
        coordinates: Coordinates,
        /// A letter, a number from 0 to 99, or a Maki icon name.
        label: Option<String>,
        /// Hex color, with or without `#`.
        color: Option<String>,
    },
    CustomMarker {
        coordinates: Coordinates,
        url: String,
    },
    Path {
        coordinates: Vec<Coordinates>,
        stroke_width: Option<f64>,
        stroke_color: Option<String>,
        stroke_opacity: Option<f64>,
        fill_color: Option<String>,
        fill_opacity: Option<f64>,
    },
    GeoJson(Value),
}

impl Overlay {
    pub fn marker(size: MarkerSize, coordinates: Coordinates) -> Self {
        Overlay::Marker {
            size,
            coordinates,
            label: None,
            color: None,
        }
    }

    pub fn path(coordinates: Vec<Coordinates>) -> Self {
        Overlay::Path {
            coordinates,
            stroke_width: None,
            stroke_color: None,
            stroke_opacity: None,
            fill_color: None,
            fill_opacity: None,
        }
    }

    fn render(&self) -> Result<String> {
        match self {
            Overlay::Marker {
                size,
                coordinates,
                label,
                color,
            } => {
                let mut out = format!("pin-{size}");
                if let Some(label) = label {
                    out.push('-');
                    out.push_str(&label.to_lowercase());
                }
                if let Some(color) = color {
                    out.push('+');
                    out.push_str(hex(color));
                }
                Ok(format!("{out}({})", coordinate_pair(coordinates)))
            }
            Overlay::CustomMarker { coordinates, url } => {
                Ok(format!("url-{url}({})", coordinate_pair(coordinates)))
            }
            Overlay::Path {
                coordinates,
                stroke_width,
                stroke_color,
                stroke_opacity,
                fill_color,
                fill_opacity,
            } => {
                if coordinates.len() < 2 {
                    return Err(Error::invalid("overlays", "a path needs at least two coordinates"));
                }
                let mut out = String::from("path");
                if let Some(width) = stroke_width {
                    out.push_str(&format!("-{width}"));
                }
                if let Some(color) = stroke_color {
                    out.push_str(&format!("+{}", hex(color)));
                }
                if let Some(opacity) = stroke_opacity {
                    out.push_str(&format!("-{opacity}"));
                }
                if let Some(color) = fill_color {
                    out.push_str(&format!("+{}", hex(color)));
                }
                if let Some(opacity) = fill_opacity {
                    out.push_str(&format!("-{opacity}"));
                }
                Ok(format!("{out}({})", polyline::encode(coordinates, 5)))
            }
            Overlay::GeoJson(value) => Ok(format!("geojson({})", serde_json::to_string(value)?)),
        }
    }
}

fn hex(color: &str) -> &str {
    color.trim_start_matches('#')
}

/// Map camera.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// Fit the overlays.
    Auto,
    Camera {
        coordinates: Coordinates,
        zoom: f64,
        bearing: Option<f64>,
        pitch: Option<f64>,
    },
}

impl Position {
    pub fn camera(coordinates: Coordinates, zoom: f64) -> Self {
        Position::Camera {
            coordinates,
            zoom,
            bearing: None,
            pitch: None,
        }
    }

    fn render(&self) -> Result<String> {
        match self {
            Position::Auto => Ok("auto".to_string()),
            Position::Camera {
                coordinates,
                zoom,
                bearing,
                pitch,
            } => {
                if !(0.0..=22.0).contains(zoom) {
                    return Err(Error::invalid("position", "zoom must be between 0 and 22"));
                }
                let mut out = format!("{},{zoom}", coordinate_pair(coordinates));
                if bearing.is_some() || pitch.is_some() {
                    out.push_str(&format!(",{}", bearing.unwrap_or(0.0)));
                }
                if let Some(pitch) = pitch {
                    if !(0.0..=60.0).contains(pitch) {
                        return Err(Error::invalid("position", "pitch must be between 0 and 60"));
                    }
                    out.push_str(&format!(",{pitch}"));
                }
                Ok(out)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetStaticImage {
    pub owner_id: String,
    pub style_id: String,
    /// Pixels, 1 to 1280.
    pub width: u32,
    /// Pixels, 1 to 1280.
    pub height: u32,
    pub position: Position,
    pub overlays: Vec<Overlay>,
    pub high_res: Option<bool>,
    pub before_layer: Option<String>,
    pub attribution: Option<bool>,
    pub logo: Option<bool>,
    /// Only with `Position::Auto`, e.g. `"10"` or `"5,10,5,10"`.
    pub padding: Option<String>,
}

impl GetStaticImage {
    pub fn new(
        owner_id: impl Into<String>,
        style_id: impl Into<String>,
        width: u32,
        height: u32,
        position: Position,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            style_id: style_id.into(),
            width,
            height,
            position,
            overlays: Vec::new(),
            high_res: None,
            before_layer: None,
            attribution: None,
            logo: None,
            padding: None,
        }
    }

    fn dimensions(&self) -> Result<String> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(1..=1280).contains(&value) {
                return Err(Error::invalid(field, format!("{value} is outside 1..=1280")));
            }
        }
        let suffix = if self.high_res == Some(true) { "@2x" } else { "" };
        Ok(format!("{}x{}{suffix}", self.width, self.height))
    }
}

#[derive(Debug, Clone)]
pub struct StaticService {
    client: MapiClient,
}

impl StaticService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// The image as raw PNG bytes.
    pub fn get_static_image(&self, config: &GetStaticImage) -> Result<MapiRequest<Vec<u8>>> {
        if config.position == Position::Auto && config.overlays.is_empty() {
            return Err(Error::invalid("position", "auto needs at least one overlay"));
        }
        let overlays = config
            .overlays
            .iter()
            .map(Overlay::render)
            .collect::<Result<Vec<_>>>()?;
        let template = if overlays.is_empty() { STATIC } else { STATIC_WITH_OVERLAY };

        let params = RequestParams::get(template)
            .param("ownerId", &config.owner_id)
            .param("styleId", &config.style_id)
            .param_opt("overlay", (!overlays.is_empty()).then(|| overlays.join(",")))
            .param("position", config.position.render()?)
            .param("dimensions", config.dimensions()?)
            .query_opt("before_layer", config.before_layer.as_deref())
            .query_opt("attribution", config.attribution)
            .query_opt("logo", config.logo)
            .query_opt("padding", config.padding.as_deref());
        self.client.create_binary_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::services::test_support::{client, path, query};
    use serde_json::json;

    #[test]
    fn camera_without_overlays() {
        let (client, _) = client();
        let config = GetStaticImage {
            high_res: Some(true),
            ..GetStaticImage::new(
                "mapbox",
                "streets-v11",
                600,
                400,
                Position::Camera {
                    coordinates: [-122.4241, 37.78],
                    zoom: 14.24,
                    bearing: None,
                    pitch: Some(60.0),
                },
            )
        };
        let request = client.static_images().get_static_image(&config).unwrap();
        assert_eq!(
            path(&request),
            "/styles/v1/mapbox/streets-v11/static/-122.4241,37.78,14.24,0,60/600x400@2x"
        );
    }

    #[test]
    fn overlays_are_comma_joined() {
        let (client, _) = client();
        let config = GetStaticImage {
            overlays: vec![
                Overlay::Marker {
                    size: MarkerSize::Large,
                    coordinates: [-76.9, 38.9],
                    label: Some("A".to_string()),
                    color: Some("#ff0000".to_string()),
                },
                Overlay::path(vec![[-120.2, 38.5], [-120.95, 40.7], [-126.453, 43.252]]),
                Overlay::GeoJson(json!({"type": "Point", "coordinates": [1, 2]})),
            ],
            padding: Some("10".to_string()),
            ..GetStaticImage::new("alice", "my-style", 300, 200, Position::Auto)
        };
        let request = client.static_images().get_static_image(&config).unwrap();
        let rendered = path(&request);
        assert!(rendered.starts_with(
            "/styles/v1/alice/my-style/static/pin-l-a+ff0000(-76.9,38.9),path(_p~iF~ps|U_ulLnnqC_mqNvxq`@),geojson({"
        ));
        assert!(rendered.contains("\"coordinates\":[1,2]"));
        assert!(rendered.ends_with("})/auto/300x200"));
        assert_eq!(query(&request, "padding").as_deref(), Some("10"));
    }

    #[test]
    fn styled_path_and_custom_marker() {
        let path_overlay = Overlay::Path {
            coordinates: vec![[0.0, 0.0], [1.0, 1.0]],
            stroke_width: Some(5.0),
            stroke_color: Some("f44".to_string()),
            stroke_opacity: Some(0.5),
            fill_color: None,
            fill_opacity: Some(0.1),
        };
        assert!(path_overlay.render().unwrap().starts_with("path-5+f44-0.5-0.1("));
        let custom = Overlay::CustomMarker {
            coordinates: [1.0, 2.0],
            url: "https://example.com/pin.png".to_string(),
        };
        assert_eq!(custom.render().unwrap(), "url-https://example.com/pin.png(1,2)");
    }

    #[test]
    fn invalid_shapes() {
        let (client, _) = client();
        let statics = client.static_images();
        let auto = GetStaticImage::new("alice", "s", 300, 200, Position::Auto);
        assert!(statics.get_static_image(&auto).is_err());
        let wide = GetStaticImage::new("alice", "s", 1281, 200, Position::camera([0.0, 0.0], 1.0));
        assert!(matches!(
            statics.get_static_image(&wide),
            Err(Error::InvalidInput { field: "width", .. })
        ));
        let zero = GetStaticImage::new("alice", "s", 300, 0, Position::camera([0.0, 0.0], 1.0));
        assert!(statics.get_static_image(&zero).is_err());
    }

    #[tokio::test]
    async fn body_is_raw_bytes() {
        let (client, mock) = client();
        let png = vec![0x89, b'P', b'N', b'G'];
        mock.push(HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "image/png".to_string())],
            body: png.clone(),
        });
        let config = GetStaticImage::new("alice", "s", 300, 200, Position::camera([0.0, 0.0], 1.0));
        let response = client
            .static_images()
            .get_static_image(&config)
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.body, png);
    }
}

//! Service leaves.
//!
//! Each service is a thin factory over a shared `MapiClient`: its methods map
//! one typed input record to one `MapiRequest` whose body type is the
//! documented response record. Nothing is sent until the caller calls
//! `send` or `each_page` on the returned request.
//!
//! Required inputs are plain fields set through each record's `new`
//! constructor; optional inputs are `Option` (or empty `Vec`) fields that are
//! omitted from the wire when unset.

pub mod datasets;
pub mod directions;
pub mod geocoding;
pub mod isochrone;
pub mod map_matching;
pub mod matrix;
pub mod optimization;
pub mod static_images;
pub mod styles;
pub mod tilequery;
pub mod tilesets;
pub mod tokens;
pub mod uploads;

pub use datasets::DatasetsService;
pub use directions::DirectionsService;
pub use geocoding::GeocodingService;
pub use isochrone::IsochroneService;
pub use map_matching::MapMatchingService;
pub use matrix::MatrixService;
pub use optimization::OptimizationService;
pub use static_images::StaticService;
pub use styles::StylesService;
pub use tilequery::TilequeryService;
pub use tilesets::TilesetsService;
pub use tokens::TokensService;
pub use uploads::UploadsService;

//! Tilesets API (Mapbox Tiling Service): tileset sources, recipes, publish
//! jobs and the processing queue.
//!
//! Tileset ids have the form `owner.name`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{FilePayload, MapiRequest, RequestParams, SendFileAs};
use crate::types::wire_enum;

const TILESETS: &str = "/tilesets/v1/:ownerId";
const TILESET: &str = "/tilesets/v1/:tilesetId";
const TILEJSON: &str = "/v4/:tilesetId.json";
const SOURCES: &str = "/tilesets/v1/sources/:ownerId";
const SOURCE: &str = "/tilesets/v1/sources/:ownerId/:id";
const PUBLISH: &str = "/tilesets/v1/:tilesetId/publish";
const STATUS: &str = "/tilesets/v1/:tilesetId/status";
const JOBS: &str = "/tilesets/v1/:tilesetId/jobs";
const JOB: &str = "/tilesets/v1/:tilesetId/jobs/:jobId";
const RECIPE: &str = "/tilesets/v1/:tilesetId/recipe";
const QUEUE: &str = "/tilesets/v1/queue";
const VALIDATE_RECIPE: &str = "/tilesets/v1/validateRecipe";

wire_enum! {
    TilesetType {
        Raster => "raster",
        Vector => "vector",
    }
}

wire_enum! {
    TilesetSort {
        Created => "created",
        Modified => "modified",
    }
}

wire_enum! {
    Visibility {
        Public => "public",
        Private => "private",
    }
}

wire_enum! {
    JobStage {
        Processing => "processing",
        Queued => "queued",
        Success => "success",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    #[serde(rename = "type")]
    pub kind: TilesetType,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 3]>,
    pub created: String,
    pub modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// TileJSON document. Unmodeled keys land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileJson {
    #[serde(default)]
    pub tilejson: String,
    #[serde(default)]
    pub tiles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of appending a file to a tileset source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetSourceUpload {
    pub id: String,
    pub files: u64,
    pub source_size: u64,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetSource {
    pub id: String,
    pub size: u64,
    pub files: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_nice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetMessage {
    pub message: String,
    #[serde(rename = "jobId", default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetStatus {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_job: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetJob {
    pub id: String,
    pub stage: JobStage,
    /// Milliseconds since the epoch.
    pub created: i64,
    #[serde(default)]
    pub created_nice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<i64>,
    #[serde(rename = "tilesetId")]
    pub tileset_id: String,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub warnings: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetsQueue {
    pub total: u64,
    pub processing: u64,
    pub queued: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub warnings: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetRecipe {
    pub recipe: Value,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub text: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTilesets {
    pub owner_id: Option<String>,
    pub kind: Option<TilesetType>,
    /// 1 to 500.
    pub limit: Option<u32>,
    pub sort_by: Option<TilesetSort>,
    pub start: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Identifies one tileset; shared by the single-tileset operations.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetRef {
    pub tileset_id: String,
}

impl TilesetRef {
    pub fn new(tileset_id: impl Into<String>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
        }
    }
}

pub type DeleteTileset = TilesetRef;
pub type TileJsonMetadata = TilesetRef;
pub type PublishTileset = TilesetRef;
pub type GetTilesetStatus = TilesetRef;
pub type GetRecipe = TilesetRef;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTilesetSource {
    /// Up to 32 characters of `a-z`, `0-9`, `-` and `_`.
    pub id: String,
    /// Line-delimited GeoJSON.
    pub file: FilePayload,
    pub owner_id: Option<String>,
}

impl CreateTilesetSource {
    pub fn new(id: impl Into<String>, file: FilePayload) -> Self {
        Self {
            id: id.into(),
            file,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetSourceRef {
    pub id: String,
    pub owner_id: Option<String>,
}

impl TilesetSourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: None,
        }
    }
}

pub type GetTilesetSource = TilesetSourceRef;
pub type DeleteTilesetSource = TilesetSourceRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTilesetSources {
    pub owner_id: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTileset {
    #[serde(skip)]
    pub tileset_id: String,
    pub recipe: Value,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateTileset {
    pub fn new(tileset_id: impl Into<String>, recipe: Value, name: impl Into<String>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            recipe,
            name: name.into(),
            private: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateTileset {
    #[serde(skip)]
    pub tileset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribution: Vec<Attribution>,
}

impl UpdateTileset {
    pub fn new(tileset_id: impl Into<String>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            name: None,
            description: None,
            private: None,
            attribution: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetJobRef {
    pub tileset_id: String,
    pub job_id: String,
}

impl TilesetJobRef {
    pub fn new(tileset_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            job_id: job_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListTilesetJobs {
    pub tileset_id: String,
    pub stage: Option<JobStage>,
    pub limit: Option<u32>,
    pub start: Option<String>,
}

impl ListTilesetJobs {
    pub fn new(tileset_id: impl Into<String>) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            stage: None,
            limit: None,
            start: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateRecipe {
    pub recipe: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecipe {
    pub tileset_id: String,
    pub recipe: Value,
}

impl UpdateRecipe {
    pub fn new(tileset_id: impl Into<String>, recipe: Value) -> Self {
        Self {
            tileset_id: tileset_id.into(),
            recipe,
        }
    }
}

fn check_source_id(id: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
    if id.is_empty() || id.len() > 32 || !id.chars().all(allowed) {
        return Err(Error::invalid("id", "expected 1 to 32 characters of a-z, 0-9, - or _"));
    }
    Ok(())
}

fn check_limit(limit: Option<u32>, max: u32) -> Result<()> {
    match limit {
        Some(limit) if limit == 0 || limit > max => {
            Err(Error::invalid("limit", format!("must be between 1 and {max}")))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct TilesetsService {
    client: MapiClient,
}

impl TilesetsService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn list_tilesets(&self, config: &ListTilesets) -> Result<MapiRequest<Vec<Tileset>>> {
        check_limit(config.limit, 500)?;
        let params = RequestParams::get(TILESETS)
            .param_opt("ownerId", config.owner_id.as_deref())
            .query_opt("type", config.kind)
            .query_opt("limit", config.limit)
            .query_opt("sortby", config.sort_by)
            .query_opt("start", config.start.as_deref())
            .query_opt("visibility", config.visibility);
        self.client.create_request(params)
    }

    pub fn delete_tileset(&self, config: &DeleteTileset) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(TILESET).param("tilesetId", &config.tileset_id);
        self.client.create_request(params)
    }

    pub fn tile_json_metadata(&self, config: &TileJsonMetadata) -> Result<MapiRequest<TileJson>> {
        let params = RequestParams::get(TILEJSON).param("tilesetId", &config.tileset_id);
        self.client.create_request(params)
    }

    /// Append a line-delimited GeoJSON file to a source, creating the source
    /// if needed.
    pub fn create_tileset_source(&self, config: &CreateTilesetSource) -> Result<MapiRequest<TilesetSourceUpload>> {
        check_source_id(&config.id)?;
        let params = RequestParams::post(SOURCE)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("id", &config.id)
            .file(config.file.clone().send_as(SendFileAs::Form));
        self.client.create_request(params)
    }

    pub fn get_tileset_source(&self, config: &GetTilesetSource) -> Result<MapiRequest<TilesetSource>> {
        let params = RequestParams::get(SOURCE)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("id", &config.id);
        self.client.create_request(params)
    }

    pub fn list_tileset_sources(&self, config: &ListTilesetSources) -> Result<MapiRequest<Vec<TilesetSource>>> {
        check_limit(config.limit, 500)?;
        let params = RequestParams::get(SOURCES)
            .param_opt("ownerId", config.owner_id.as_deref())
            .query_opt("limit", config.limit)
            .query_opt("start", config.start.as_deref());
        self.client.create_request(params)
    }

    pub fn delete_tileset_source(&self, config: &DeleteTilesetSource) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(SOURCE)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("id", &config.id);
        self.client.create_request(params)
    }

    pub fn create_tileset(&self, config: &CreateTileset) -> Result<MapiRequest<TilesetMessage>> {
        let params = RequestParams::post(TILESET)
            .param("tilesetId", &config.tileset_id)
            .json(config)?;
        self.client.create_request(params)
    }

    pub fn publish_tileset(&self, config: &PublishTileset) -> Result<MapiRequest<TilesetMessage>> {
        let params = RequestParams::post(PUBLISH).param("tilesetId", &config.tileset_id);
        self.client.create_request(params)
    }

    pub fn update_tileset(&self, config: &UpdateTileset) -> Result<MapiRequest<()>> {
        let params = RequestParams::patch(TILESET)
            .param("tilesetId", &config.tileset_id)
            .json(config)?;
        self.client.create_request(params)
    }

    pub fn tileset_status(&self, config: &GetTilesetStatus) -> Result<MapiRequest<TilesetStatus>> {
        let params = RequestParams::get(STATUS).param("tilesetId", &config.tileset_id);
        self.client.create_request(params)
    }

    pub fn tileset_job(&self, config: &TilesetJobRef) -> Result<MapiRequest<TilesetJob>> {
        let params = RequestParams::get(JOB)
            .param("tilesetId", &config.tileset_id)
            .param("jobId", &config.job_id);
        self.client.create_request(params)
    }

    pub fn list_tileset_jobs(&self, config: &ListTilesetJobs) -> Result<MapiRequest<Vec<TilesetJob>>> {
        check_limit(config.limit, 500)?;
        let params = RequestParams::get(JOBS)
            .param("tilesetId", &config.tileset_id)
            .query_opt("stage", config.stage)
            .query_opt("limit", config.limit)
            .query_opt("start", config.start.as_deref());
        self.client.create_request(params)
    }

    /// Jobs waiting and running across the account. The API exposes this as
    /// a PUT.
    pub fn get_tilesets_queue(&self) -> Result<MapiRequest<TilesetsQueue>> {
        self.client.create_request(RequestParams::put(QUEUE))
    }

    pub fn validate_recipe(&self, config: &ValidateRecipe) -> Result<MapiRequest<RecipeValidation>> {
        let params = RequestParams::put(VALIDATE_RECIPE).json(&config.recipe)?;
        self.client.create_request(params)
    }

    pub fn get_recipe(&self, config: &GetRecipe) -> Result<MapiRequest<TilesetRecipe>> {
        let params = RequestParams::get(RECIPE).param("tilesetId", &config.tileset_id);
        self.client.create_request(params)
    }

    pub fn update_recipe(&self, config: &UpdateRecipe) -> Result<MapiRequest<()>> {
        let params = RequestParams::patch(RECIPE)
            .param("tilesetId", &config.tileset_id)
            .json(&config.recipe)?;
        self.client.create_request(params)
    }
}

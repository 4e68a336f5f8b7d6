//! Styles API, plus the sprite, font and embeddable HTML resources that hang
//! off a style.
//!
//! Every operation takes an optional `owner_id`; when unset, the owner is
//! read from the access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{FilePayload, MapiRequest, RequestParams};
use crate::types::wire_enum;

const STYLES: &str = "/styles/v1/:ownerId";
const STYLE: &str = "/styles/v1/:ownerId/:styleId";
const STYLE_DRAFT: &str = "/styles/v1/:ownerId/:styleId/draft";
const ICON: &str = "/styles/v1/:ownerId/:styleId/sprite/:iconId";
const ICON_DRAFT: &str = "/styles/v1/:ownerId/:styleId/draft/sprite/:iconId";
const SPRITE: &str = "/styles/v1/:ownerId/:styleId/:fileName";
const SPRITE_DRAFT: &str = "/styles/v1/:ownerId/:styleId/draft/:fileName";
const EMBED: &str = "/styles/v1/:ownerId/:styleId.html";
const EMBED_DRAFT: &str = "/styles/v1/:ownerId/:styleId/draft.html";
const GLYPHS: &str = "/fonts/v1/:ownerId/:fontList/:fileName";

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

wire_enum! {
    SpriteFormat {
        Json => "json",
        Png => "png",
    }
}

/// A style document. Fields the client does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(default)]
    pub sources: Map<String, Value>,
    #[serde(default)]
    pub layers: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry in a style listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetStyle {
    pub style_id: String,
    /// Include Mapbox Studio metadata.
    pub metadata: Option<bool>,
    pub draft: Option<bool>,
    pub owner_id: Option<String>,
}

impl GetStyle {
    pub fn new(style_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
            metadata: None,
            draft: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateStyle {
    pub style: Value,
    pub owner_id: Option<String>,
}

impl CreateStyle {
    pub fn new(style: Value) -> Self {
        Self { style, owner_id: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStyle {
    pub style_id: String,
    pub style: Value,
    /// Sent as `If-Unmodified-Since`; the update fails if the style changed
    /// after this instant.
    pub last_known_modification: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
}

impl UpdateStyle {
    pub fn new(style_id: impl Into<String>, style: Value) -> Self {
        Self {
            style_id: style_id.into(),
            style,
            last_known_modification: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStyle {
    pub style_id: String,
    pub owner_id: Option<String>,
}

impl DeleteStyle {
    pub fn new(style_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListStyles {
    pub start: Option<String>,
    /// Bypass the listing cache.
    pub fresh: Option<bool>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutStyleIcon {
    pub style_id: String,
    pub icon_id: String,
    /// SVG image.
    pub file: FilePayload,
    pub draft: Option<bool>,
    pub owner_id: Option<String>,
}

impl PutStyleIcon {
    pub fn new(style_id: impl Into<String>, icon_id: impl Into<String>, file: FilePayload) -> Self {
        Self {
            style_id: style_id.into(),
            icon_id: icon_id.into(),
            file,
            draft: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStyleIcon {
    pub style_id: String,
    pub icon_id: String,
    pub draft: Option<bool>,
    pub owner_id: Option<String>,
}

impl DeleteStyleIcon {
    pub fn new(style_id: impl Into<String>, icon_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
            icon_id: icon_id.into(),
            draft: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetStyleSprite {
    pub style_id: String,
    pub format: SpriteFormat,
    pub high_res: Option<bool>,
    pub draft: Option<bool>,
    pub fresh: Option<bool>,
    pub owner_id: Option<String>,
}

impl GetStyleSprite {
    pub fn new(style_id: impl Into<String>, format: SpriteFormat) -> Self {
        Self {
            style_id: style_id.into(),
            format,
            high_res: None,
            draft: None,
            fresh: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetFontGlyphRange {
    pub fonts: Vec<String>,
    /// First glyph of the 256-glyph range; a multiple of 256.
    pub start: u32,
    pub owner_id: Option<String>,
}

impl GetFontGlyphRange {
    pub fn new(fonts: Vec<String>, start: u32) -> Self {
        Self {
            fonts,
            start,
            owner_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetEmbeddableHtml {
    pub style_id: String,
    pub scroll_zoom: Option<bool>,
    pub title: Option<bool>,
    pub fallback: Option<bool>,
    pub mapbox_gl_version: Option<String>,
    pub mapbox_gl_geocoder_version: Option<String>,
    pub draft: Option<bool>,
    pub owner_id: Option<String>,
}

impl GetEmbeddableHtml {
    pub fn new(style_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
            scroll_zoom: None,
            title: None,
            fallback: None,
            mapbox_gl_version: None,
            mapbox_gl_geocoder_version: None,
            draft: None,
            owner_id: None,
        }
    }
}

fn is_draft(draft: Option<bool>) -> bool {
    draft == Some(true)
}

fn http_date(instant: &DateTime<Utc>) -> String {
    instant.format(HTTP_DATE).to_string()
}

#[derive(Debug, Clone)]
pub struct StylesService {
    client: MapiClient,
}

impl StylesService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn get_style(&self, config: &GetStyle) -> Result<MapiRequest<Style>> {
        let template = if is_draft(config.draft) { STYLE_DRAFT } else { STYLE };
        let params = RequestParams::get(template)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .query_opt("metadata", config.metadata);
        self.client.create_request(params)
    }

    pub fn create_style(&self, config: &CreateStyle) -> Result<MapiRequest<Style>> {
        let params = RequestParams::post(STYLES)
            .param_opt("ownerId", config.owner_id.as_deref())
            .json(&config.style)?;
        self.client.create_request(params)
    }

    pub fn update_style(&self, config: &UpdateStyle) -> Result<MapiRequest<Style>> {
        let mut params = RequestParams::patch(STYLE)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .json(&config.style)?;
        if let Some(instant) = &config.last_known_modification {
            params = params.header("If-Unmodified-Since", http_date(instant));
        }
        self.client.create_request(params)
    }

    pub fn delete_style(&self, config: &DeleteStyle) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(STYLE)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id);
        self.client.create_request(params)
    }

    pub fn list_styles(&self, config: &ListStyles) -> Result<MapiRequest<Vec<StyleSummary>>> {
        let params = RequestParams::get(STYLES)
            .param_opt("ownerId", config.owner_id.as_deref())
            .query_opt("start", config.start.as_deref())
            .query_opt("fresh", config.fresh);
        self.client.create_request(params)
    }

    pub fn put_style_icon(&self, config: &PutStyleIcon) -> Result<MapiRequest<Value>> {
        let template = if is_draft(config.draft) { ICON_DRAFT } else { ICON };
        let file = match config.file.content_type {
            Some(_) => config.file.clone(),
            None => config.file.clone().content_type("image/svg+xml"),
        };
        let params = RequestParams::put(template)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .param("iconId", &config.icon_id)
            .file(file);
        self.client.create_request(params)
    }

    pub fn delete_style_icon(&self, config: &DeleteStyleIcon) -> Result<MapiRequest<()>> {
        let template = if is_draft(config.draft) { ICON_DRAFT } else { ICON };
        let params = RequestParams::delete(template)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .param("iconId", &config.icon_id);
        self.client.create_request(params)
    }

    /// Sprite sheet image or its JSON index, as raw bytes.
    pub fn get_style_sprite(&self, config: &GetStyleSprite) -> Result<MapiRequest<Vec<u8>>> {
        let template = if is_draft(config.draft) { SPRITE_DRAFT } else { SPRITE };
        let ratio = if config.high_res == Some(true) { "@2x" } else { "" };
        let params = RequestParams::get(template)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .param("fileName", format!("sprite{ratio}.{}", config.format))
            .query_opt("fresh", config.fresh);
        self.client.create_binary_request(params)
    }

    /// A protocol-buffer glyph range.
    pub fn get_font_glyph_range(&self, config: &GetFontGlyphRange) -> Result<MapiRequest<Vec<u8>>> {
        if config.fonts.is_empty() {
            return Err(Error::invalid("fonts", "must name at least one font"));
        }
        if config.start % 256 != 0 {
            return Err(Error::invalid("start", "must be a multiple of 256"));
        }
        let params = RequestParams::get(GLYPHS)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("fontList", config.fonts.join(","))
            .param("fileName", format!("{}-{}.pbf", config.start, config.start + 255));
        self.client.create_binary_request(params)
    }

    pub fn get_embeddable_html(&self, config: &GetEmbeddableHtml) -> Result<MapiRequest<String>> {
        let template = if is_draft(config.draft) { EMBED_DRAFT } else { EMBED };
        let params = RequestParams::get(template)
            .param_opt("ownerId", config.owner_id.as_deref())
            .param("styleId", &config.style_id)
            .query_opt("zoomwheel", config.scroll_zoom)
            .query_opt("title", config.title)
            .query_opt("fallback", config.fallback)
            .query_opt("mapboxGLVersion", config.mapbox_gl_version.as_deref())
            .query_opt("mapboxGLGeocoderVersion", config.mapbox_gl_geocoder_version.as_deref());
        self.client.create_text_request(params)
    }
}

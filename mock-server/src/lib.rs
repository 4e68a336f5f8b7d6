//! In-process emulation of the Mapbox datasets API and the token status
//! endpoint, for exercising the client over real HTTP.
//!
//! Every route requires an `access_token` query parameter. Listings honor
//! `limit` and `start` and advertise the following page through a `Link`
//! header, as the real API does; the cursor is an opaque offset.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub owner: String,
    pub id: String,
    pub created: String,
    pub modified: String,
    pub bounds: [f64; 4],
    pub features: usize,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatasetInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
struct StoredDataset {
    meta: Option<Dataset>,
    /// Insertion-ordered features keyed by id.
    features: Vec<(String, Value)>,
}

#[derive(Debug, Default)]
pub struct Store {
    datasets: BTreeMap<String, StoredDataset>,
    order: Vec<String>,
}

pub type Db = Arc<RwLock<Store>>;

/// An API failure rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type Params = HashMap<String, String>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/tokens/v2", get(token_status))
        .route("/datasets/v1/{owner}", get(list_datasets).post(create_dataset))
        .route(
            "/datasets/v1/{owner}/{dataset}",
            get(get_dataset).patch(update_dataset).delete(delete_dataset),
        )
        .route("/datasets/v1/{owner}/{dataset}/features", get(list_features))
        .route(
            "/datasets/v1/{owner}/{dataset}/features/{feature}",
            get(get_feature).put(put_feature).delete(delete_feature),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn require_token(params: &Params) -> Result<&str, ApiError> {
    params
        .get("access_token")
        .map(String::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Not Authorized - No Token"))
}

/// Slice one page out of `items` and build the `Link` header for the next.
fn paginate<T: Clone>(
    items: &[T],
    params: &Params,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<(Vec<T>, Option<String>), ApiError> {
    let start = match params.get("start") {
        Some(cursor) => cursor
            .parse::<usize>()
            .map_err(|_| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid start cursor"))?,
        None => 0,
    };
    let limit = match params.get("limit") {
        Some(limit) => limit
            .parse::<usize>()
            .ok()
            .filter(|limit| (1..=100).contains(limit))
            .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "limit must be between 1 and 100"))?,
        None => items.len().max(1),
    };
    let end = start.saturating_add(limit).min(items.len());
    let page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    let link = (end < items.len()).then(|| {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        format!(
            "<http://{host}{}?start={end}&limit={limit}>; rel=\"next\"",
            uri.path()
        )
    });
    Ok((page, link))
}

fn with_link<T: Serialize>(body: T, link: Option<String>) -> Response {
    match link {
        Some(link) => ([(header::LINK, link)], Json(body)).into_response(),
        None => Json(body).into_response(),
    }
}

fn refresh(dataset: &mut StoredDataset) {
    let size = dataset.features.iter().map(|(_, f)| f.to_string().len()).sum();
    let count = dataset.features.len();
    if let Some(meta) = dataset.meta.as_mut() {
        meta.features = count;
        meta.size = size;
        meta.modified = now();
    }
}

async fn token_status(Query(params): Query<Params>) -> Result<Json<Value>, ApiError> {
    let token = require_token(&params)?;
    let parts: Vec<&str> = token.split('.').collect();
    let payload = match parts.as_slice() {
        [_, payload, _] => URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok()),
        _ => None,
    };
    let Some(payload) = payload else {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid Token"));
    };
    Ok(Json(json!({
        "code": "TokenValid",
        "token": {
            "usage": parts[0],
            "user": payload["u"],
            "authorization": payload["a"],
        }
    })))
}

async fn list_datasets(
    State(db): State<Db>,
    Path(owner): Path<String>,
    Query(params): Query<Params>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    require_token(&params)?;
    let store = db.read().await;
    let mut datasets: Vec<Dataset> = store
        .order
        .iter()
        .filter_map(|id| store.datasets.get(id)?.meta.clone())
        .filter(|d| d.owner == owner)
        .collect();
    if params.get("sortby").map(String::as_str) == Some("modified") {
        datasets.sort_by(|a, b| b.modified.cmp(&a.modified));
    }
    let (page, link) = paginate(&datasets, &params, &uri, &headers)?;
    Ok(with_link(page, link))
}

async fn create_dataset(
    State(db): State<Db>,
    Path(owner): Path<String>,
    Query(params): Query<Params>,
    Json(input): Json<DatasetInput>,
) -> Result<Json<Dataset>, ApiError> {
    require_token(&params)?;
    let created = now();
    let dataset = Dataset {
        owner,
        id: Uuid::new_v4().simple().to_string(),
        created: created.clone(),
        modified: created,
        bounds: [-180.0, -85.0, 180.0, 85.0],
        features: 0,
        size: 0,
        name: input.name,
        description: input.description,
    };
    let mut store = db.write().await;
    store.order.push(dataset.id.clone());
    store.datasets.insert(
        dataset.id.clone(),
        StoredDataset {
            meta: Some(dataset.clone()),
            features: Vec::new(),
        },
    );
    Ok(Json(dataset))
}

async fn get_dataset(
    State(db): State<Db>,
    Path((_owner, id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Result<Json<Dataset>, ApiError> {
    require_token(&params)?;
    let store = db.read().await;
    store
        .datasets
        .get(&id)
        .and_then(|d| d.meta.clone())
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn update_dataset(
    State(db): State<Db>,
    Path((_owner, id)): Path<(String, String)>,
    Query(params): Query<Params>,
    Json(input): Json<DatasetInput>,
) -> Result<Json<Dataset>, ApiError> {
    require_token(&params)?;
    let mut store = db.write().await;
    let meta = store
        .datasets
        .get_mut(&id)
        .and_then(|d| d.meta.as_mut())
        .ok_or_else(ApiError::not_found)?;
    if let Some(name) = input.name {
        meta.name = Some(name);
    }
    if let Some(description) = input.description {
        meta.description = Some(description);
    }
    meta.modified = now();
    Ok(Json(meta.clone()))
}

async fn delete_dataset(
    State(db): State<Db>,
    Path((_owner, id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Result<StatusCode, ApiError> {
    require_token(&params)?;
    let mut store = db.write().await;
    store.datasets.remove(&id).ok_or_else(ApiError::not_found)?;
    store.order.retain(|existing| existing != &id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_features(
    State(db): State<Db>,
    Path((_owner, id)): Path<(String, String)>,
    Query(params): Query<Params>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    require_token(&params)?;
    let store = db.read().await;
    let dataset = store.datasets.get(&id).ok_or_else(ApiError::not_found)?;
    let features: Vec<Value> = dataset.features.iter().map(|(_, f)| f.clone()).collect();
    let (page, link) = paginate(&features, &params, &uri, &headers)?;
    Ok(with_link(json!({ "type": "FeatureCollection", "features": page }), link))
}

async fn get_feature(
    State(db): State<Db>,
    Path((_owner, id, feature_id)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    require_token(&params)?;
    let store = db.read().await;
    let dataset = store.datasets.get(&id).ok_or_else(ApiError::not_found)?;
    dataset
        .features
        .iter()
        .find(|(key, _)| key == &feature_id)
        .map(|(_, feature)| Json(feature.clone()))
        .ok_or_else(ApiError::not_found)
}

/// Insert or replace a feature. The stored copy always carries the path id.
async fn put_feature(
    State(db): State<Db>,
    Path((_owner, id, feature_id)): Path<(String, String, String)>,
    Query(params): Query<Params>,
    Json(mut feature): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    require_token(&params)?;
    if feature["type"] != "Feature" || !feature["geometry"].is_object() {
        return Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid GeoJSON feature"));
    }
    if feature["geometry"]["type"] == "GeometryCollection" {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "GeometryCollection is not supported",
        ));
    }
    match &feature["id"] {
        Value::Null => {}
        Value::String(given) if given == &feature_id => {}
        _ => {
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Provided feature id does not match the id in the URL",
            ))
        }
    }
    feature["id"] = Value::String(feature_id.clone());
    if feature["properties"].is_null() {
        feature["properties"] = json!({});
    }

    let mut store = db.write().await;
    let dataset = store.datasets.get_mut(&id).ok_or_else(ApiError::not_found)?;
    match dataset.features.iter().position(|(key, _)| key == &feature_id) {
        Some(index) => dataset.features[index].1 = feature.clone(),
        None => dataset.features.push((feature_id, feature.clone())),
    }
    refresh(dataset);
    Ok(Json(feature))
}

async fn delete_feature(
    State(db): State<Db>,
    Path((_owner, id, feature_id)): Path<(String, String, String)>,
    Query(params): Query<Params>,
) -> Result<StatusCode, ApiError> {
    require_token(&params)?;
    let mut store = db.write().await;
    let dataset = store.datasets.get_mut(&id).ok_or_else(ApiError::not_found)?;
    let before = dataset.features.len();
    dataset.features.retain(|(key, _)| key != &feature_id);
    if dataset.features.len() == before {
        return Err(ApiError::not_found());
    }
    refresh(dataset);
    Ok(StatusCode::NO_CONTENT)
}

//! Datasets API: dataset metadata and feature CRUD.
//!
//! Deletions answer 204 with an empty body, so they resolve to `()`.
//! Listings are paginated through the `Link` header; `start` is the opaque
//! cursor taken from a previous page.

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::geojson::{Feature, FeatureCollection, Geometry};
use crate::request::{MapiRequest, RequestParams};
use crate::types::{wire_enum, BoundingBox};

const DATASETS: &str = "/datasets/v1/:ownerId";
const DATASET: &str = "/datasets/v1/:ownerId/:datasetId";
const FEATURES: &str = "/datasets/v1/:ownerId/:datasetId/features";
const FEATURE: &str = "/datasets/v1/:ownerId/:datasetId/features/:featureId";

wire_enum! {
    DatasetSort {
        Created => "created",
        Modified => "modified",
    }
}

/// Dataset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub owner: String,
    pub id: String,
    /// ISO 8601 timestamps.
    pub created: String,
    pub modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    /// Number of features.
    #[serde(default)]
    pub features: u64,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDatasets {
    pub sortby: Option<DatasetSort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateDataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetMetadata {
    pub dataset_id: String,
}

impl GetMetadata {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMetadata {
    #[serde(skip)]
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateMetadata {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            name: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDataset {
    pub dataset_id: String,
}

impl DeleteDataset {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListFeatures {
    pub dataset_id: String,
    pub limit: Option<u32>,
    /// Opaque cursor from a previous page.
    pub start: Option<String>,
}

impl ListFeatures {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            limit: None,
            start: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutFeature {
    pub dataset_id: String,
    pub feature_id: String,
    pub feature: Feature,
}

impl PutFeature {
    pub fn new(dataset_id: impl Into<String>, feature_id: impl Into<String>, feature: Feature) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            feature_id: feature_id.into(),
            feature,
        }
    }
}

/// Identifies one feature; shared by `get_feature` and `delete_feature`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRef {
    pub dataset_id: String,
    pub feature_id: String,
}

impl FeatureRef {
    pub fn new(dataset_id: impl Into<String>, feature_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            feature_id: feature_id.into(),
        }
    }
}

pub type GetFeature = FeatureRef;
pub type DeleteFeature = FeatureRef;

#[derive(Debug, Clone)]
pub struct DatasetsService {
    client: MapiClient,
}

impl DatasetsService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn list_datasets(&self, config: &ListDatasets) -> Result<MapiRequest<Vec<Dataset>>> {
        let params = RequestParams::get(DATASETS).query_opt("sortby", config.sortby);
        self.client.create_request(params)
    }

    pub fn create_dataset(&self, config: &CreateDataset) -> Result<MapiRequest<Dataset>> {
        let params = RequestParams::post(DATASETS).json(config)?;
        self.client.create_request(params)
    }

    pub fn get_metadata(&self, config: &GetMetadata) -> Result<MapiRequest<Dataset>> {
        let params = RequestParams::get(DATASET).param("datasetId", &config.dataset_id);
        self.client.create_request(params)
    }

    pub fn update_metadata(&self, config: &UpdateMetadata) -> Result<MapiRequest<Dataset>> {
        let params = RequestParams::patch(DATASET)
            .param("datasetId", &config.dataset_id)
            .json(config)?;
        self.client.create_request(params)
    }

    pub fn delete_dataset(&self, config: &DeleteDataset) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(DATASET).param("datasetId", &config.dataset_id);
        self.client.create_request(params)
    }

    pub fn list_features(&self, config: &ListFeatures) -> Result<MapiRequest<FeatureCollection>> {
        let params = RequestParams::get(FEATURES)
            .param("datasetId", &config.dataset_id)
            .query_opt("limit", config.limit)
            .query_opt("start", config.start.as_deref());
        self.client.create_request(params)
    }

    /// Insert or replace a feature.
    ///
    /// The feature's own `id`, when set, must match `feature_id`, and
    /// `GeometryCollection` geometries are not accepted by the API.
    pub fn put_feature(&self, config: &PutFeature) -> Result<MapiRequest<Feature>> {
        if let Some(id) = &config.feature.id {
            if id.as_string() != config.feature_id {
                return Err(Error::invalid(
                    "featureId",
                    format!("does not match feature.id {:?}", id.as_string()),
                ));
            }
        }
        if matches!(config.feature.geometry, Some(Geometry::GeometryCollection { .. })) {
            return Err(Error::invalid("feature", "GeometryCollection geometries are not supported"));
        }
        let params = RequestParams::put(FEATURE)
            .param("datasetId", &config.dataset_id)
            .param("featureId", &config.feature_id)
            .json(&config.feature)?;
        self.client.create_request(params)
    }

    pub fn get_feature(&self, config: &GetFeature) -> Result<MapiRequest<Feature>> {
        let params = RequestParams::get(FEATURE)
            .param("datasetId", &config.dataset_id)
            .param("featureId", &config.feature_id);
        self.client.create_request(params)
    }

    pub fn delete_feature(&self, config: &DeleteFeature) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(FEATURE)
            .param("datasetId", &config.dataset_id)
            .param("featureId", &config.feature_id);
        self.client.create_request(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::request::RequestBody;
    use crate::services::test_support::{client, path, query};
    use serde_json::json;

    fn service() -> (DatasetsService, std::sync::Arc<crate::transport::MockTransport>) {
        let (client, mock) = client();
        (client.datasets(), mock)
    }

    #[test]
    fn list_datasets_with_sort() {
        let (datasets, _) = service();
        let request = datasets
            .list_datasets(&ListDatasets {
                sortby: Some(DatasetSort::Modified),
            })
            .unwrap();
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(path(&request), "/datasets/v1/alice");
        assert_eq!(query(&request, "sortby").as_deref(), Some("modified"));
    }

    #[test]
    fn create_dataset_sends_only_set_fields() {
        let (datasets, _) = service();
        let request = datasets
            .create_dataset(&CreateDataset {
                name: Some("parks".to_string()),
                description: None,
            })
            .unwrap();
        assert_eq!(request.method(), HttpMethod::Post);
        assert_eq!(request.body(), Some(&RequestBody::Json(json!({"name": "parks"}))));
    }

    #[test]
    fn update_metadata_uses_patch_and_keeps_id_out_of_body() {
        let (datasets, _) = service();
        let request = datasets
            .update_metadata(&UpdateMetadata {
                description: Some("city parks".to_string()),
                ..UpdateMetadata::new("ds1")
            })
            .unwrap();
        assert_eq!(request.method(), HttpMethod::Patch);
        assert_eq!(path(&request), "/datasets/v1/alice/ds1");
        assert_eq!(request.body(), Some(&RequestBody::Json(json!({"description": "city parks"}))));
    }

    #[test]
    fn list_features_passes_cursor_verbatim() {
        let (datasets, _) = service();
        let request = datasets
            .list_features(&ListFeatures {
                limit: Some(10),
                start: Some("ck9=+/x".to_string()),
                ..ListFeatures::new("ds1")
            })
            .unwrap();
        assert_eq!(path(&request), "/datasets/v1/alice/ds1/features");
        assert_eq!(query(&request, "start").as_deref(), Some("ck9=+/x"));
        assert_eq!(query(&request, "limit").as_deref(), Some("10"));
    }

    #[test]
    fn put_feature_rejects_mismatched_id() {
        let (datasets, _) = service();
        let feature = Feature::new(Geometry::point(1.0, 2.0)).with_id("other");
        let err = datasets.put_feature(&PutFeature::new("ds1", "f1", feature)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "featureId", .. }));
    }

    #[test]
    fn put_feature_rejects_geometry_collection() {
        let (datasets, _) = service();
        let feature = Feature::new(Geometry::GeometryCollection { geometries: Vec::new() });
        let err = datasets.put_feature(&PutFeature::new("ds1", "f1", feature)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "feature", .. }));
    }

    #[test]
    fn feature_paths() {
        let (datasets, _) = service();
        let get = datasets.get_feature(&FeatureRef::new("ds1", "f 1")).unwrap();
        assert_eq!(path(&get), "/datasets/v1/alice/ds1/features/f 1");
        let delete = datasets.delete_feature(&FeatureRef::new("ds1", "f1")).unwrap();
        assert_eq!(delete.method(), HttpMethod::Delete);
    }

    #[tokio::test]
    async fn create_dataset_resolves_to_single_dataset() {
        let (datasets, mock) = service();
        mock.push(HttpResponse::json(
            200,
            r#"{"owner":"alice","id":"ds1","created":"2024-01-01T00:00:00.000Z","modified":"2024-01-01T00:00:00.000Z","bounds":[-10,-10,10,10],"features":0,"size":0,"name":"parks"}"#,
        ));
        let response = datasets
            .create_dataset(&CreateDataset::default())
            .unwrap()
            .send()
            .await
            .unwrap();
        let dataset: Dataset = response.body;
        assert_eq!(dataset.id, "ds1");
        assert_eq!(dataset.bounds, Some([-10.0, -10.0, 10.0, 10.0]));
        assert!(dataset.description.is_none());
    }

    #[tokio::test]
    async fn delete_dataset_resolves_on_204() {
        let (datasets, mock) = service();
        mock.push(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        });
        let response = datasets
            .delete_dataset(&DeleteDataset::new("ds1"))
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(response.status_code, 204);
    }
}

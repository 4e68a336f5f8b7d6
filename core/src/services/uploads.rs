//! Uploads API: turn staged files into tilesets.
//!
//! The staging credentials point at an S3 bucket; putting the file there is
//! left to the caller.

use serde::{Deserialize, Serialize};

use crate::client::MapiClient;
use crate::error::{Error, Result};
use crate::request::{MapiRequest, RequestParams};

const UPLOADS: &str = "/uploads/v1/:ownerId";
const UPLOAD: &str = "/uploads/v1/:ownerId/:uploadId";
const CREDENTIALS: &str = "/uploads/v1/:ownerId/credentials";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub id: String,
    pub name: String,
    pub complete: bool,
    pub error: Option<String>,
    pub created: String,
    pub modified: String,
    pub tileset: String,
    pub owner: String,
    /// 0 to 1.
    pub progress: f64,
}

/// Temporary S3 credentials for staging a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredentials {
    pub access_key_id: String,
    pub bucket: String,
    pub key: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListUploads {
    /// Oldest first.
    pub reverse: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateUpload {
    /// `owner.name`.
    pub tileset: String,
    /// Staged file URL, as returned with the upload credentials.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

impl CreateUpload {
    pub fn new(tileset: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tileset: tileset.into(),
            url: url.into(),
            name: None,
            private: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRef {
    pub upload_id: String,
}

impl UploadRef {
    pub fn new(upload_id: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
        }
    }
}

pub type GetUpload = UploadRef;
pub type DeleteUpload = UploadRef;

#[derive(Debug, Clone)]
pub struct UploadsService {
    client: MapiClient,
}

impl UploadsService {
    pub fn new(client: &MapiClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    pub fn list_uploads(&self, config: &ListUploads) -> Result<MapiRequest<Vec<Upload>>> {
        let params = RequestParams::get(UPLOADS).query_opt("reverse", config.reverse);
        self.client.create_request(params)
    }

    pub fn create_upload_credentials(&self) -> Result<MapiRequest<UploadCredentials>> {
        self.client.create_request(RequestParams::post(CREDENTIALS))
    }

    pub fn create_upload(&self, config: &CreateUpload) -> Result<MapiRequest<Upload>> {
        if !config.tileset.contains('.') {
            return Err(Error::invalid("tileset", "expected owner.name"));
        }
        let params = RequestParams::post(UPLOADS).json(config)?;
        self.client.create_request(params)
    }

    pub fn get_upload(&self, config: &GetUpload) -> Result<MapiRequest<Upload>> {
        let params = RequestParams::get(UPLOAD).param("uploadId", &config.upload_id);
        self.client.create_request(params)
    }

    pub fn delete_upload(&self, config: &DeleteUpload) -> Result<MapiRequest<()>> {
        let params = RequestParams::delete(UPLOAD).param("uploadId", &config.upload_id);
        self.client.create_request(params)
    }
}

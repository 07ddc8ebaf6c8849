//! Response shapes for the file-browsing surface.

use serde::Deserialize;

/// One stored file as reported by `GET /api/files`. Unknown fields are
/// tolerated; the server's `_id`/`originalName` spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "originalName", alias = "filename")]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "fileType")]
    pub file_type: String,
    #[serde(default, rename = "uploadDate")]
    pub upload_date: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
}

/// Full listing response: `{files: [...], pagination: {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    #[serde(default)]
    pub pagination: Pagination,
}

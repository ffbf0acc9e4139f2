use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct UploadArg {
    pub path: String,
    pub mode: &'static str,
    pub autorename: bool,
    pub mute: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PathArg<'a> {
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListFolderArg<'a> {
    pub path: &'a str,
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListFolderContinueArg<'a> {
    pub cursor: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub server_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TemporaryLinkResult {
    pub link: String,
}

/// One page of a folder listing; `has_more` means another page must be
/// fetched through the continue endpoint.
#[derive(Debug, Deserialize)]
pub struct ListFolderResult {
    pub entries: Vec<ListEntry>,
    pub cursor: String,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListEntry {
    #[serde(rename = ".tag")]
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub server_modified: Option<DateTime<Utc>>,
}

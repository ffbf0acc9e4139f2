use crate::dropbox::types::{
    FileMetadata, ListFolderArg, ListFolderContinueArg, ListFolderResult, PathArg,
    TemporaryLinkResult, UploadArg,
};
use crate::traits::{RemoteFile, StorageClient, StorageError};
use async_trait::async_trait;
use reclip_http::{Auth, HeaderMap, HeaderName, HeaderValue, HttpClient, HttpError, RequestOpts};
use serde::Serialize;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

pub struct DropboxApi {
    /// JSON endpoints (list, link, delete).
    api: HttpClient,
    /// Upload endpoint; Dropbox serves it from a separate content host.
    content: HttpClient,
    token: String,
    folder: String,
}

impl DropboxApi {
    pub fn new(
        api_base: &str,
        content_base: &str,
        access_token: String,
        folder: String,
    ) -> Result<Self, HttpError> {
        Ok(Self {
            api: HttpClient::new(api_base)?,
            content: HttpClient::new(content_base)?,
            token: access_token,
            folder,
        })
    }

    fn auth(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            ..Default::default()
        }
    }

    fn target_path(&self, name: &str) -> String {
        format!("{}/{}", self.folder.trim_end_matches('/'), name)
    }
}

/// The upload request is described entirely by a JSON header; the body is
/// the raw file.
fn api_arg_header(arg: &impl Serialize) -> Result<HeaderMap, StorageError> {
    let rendered =
        serde_json::to_string(arg).map_err(|e| StorageError::Api(e.to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("dropbox-api-arg"),
        HeaderValue::from_str(&rendered)
            .map_err(|e| StorageError::Api(format!("invalid {API_ARG_HEADER}: {e}")))?,
    );
    Ok(headers)
}

#[async_trait]
impl StorageClient for DropboxApi {
    async fn upload(&self, data: Vec<u8>, name: &str) -> Result<String, StorageError> {
        let target = self.target_path(name);
        let arg = UploadArg {
            path: target.clone(),
            mode: "add",
            autorename: false,
            mute: true,
        };
        let opts = RequestOpts {
            headers: Some(api_arg_header(&arg)?),
            ..self.auth()
        };
        let meta: FileMetadata = self.content.post_octets("2/files/upload", data, opts).await?;
        let stored = meta.path_lower.or(meta.path_display).unwrap_or(target);
        tracing::info!(path = %stored, "storage.uploaded");
        Ok(stored)
    }

    async fn temporary_link(&self, path: &str) -> Result<String, StorageError> {
        let result: TemporaryLinkResult = self
            .api
            .post_json("2/files/get_temporary_link", &PathArg { path }, self.auth())
            .await?;
        Ok(result.link)
    }

    async fn list_folder(&self) -> Result<Vec<RemoteFile>, StorageError> {
        let mut page: ListFolderResult = self
            .api
            .post_json(
                "2/files/list_folder",
                &ListFolderArg {
                    path: &self.folder,
                    recursive: false,
                },
                self.auth(),
            )
            .await?;

        let mut files = Vec::new();
        loop {
            for entry in page.entries.drain(..) {
                // folders and deleted markers carry no server_modified
                if entry.tag != "file" {
                    continue;
                }
                let Some(modified_at) = entry.server_modified else {
                    continue;
                };
                files.push(RemoteFile {
                    path: entry.path_lower.unwrap_or(entry.name),
                    modified_at,
                });
            }
            if !page.has_more {
                break;
            }
            page = self
                .api
                .post_json(
                    "2/files/list_folder/continue",
                    &ListFolderContinueArg {
                        cursor: &page.cursor,
                    },
                    self.auth(),
                )
                .await?;
        }
        Ok(files)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let _: serde_json::Value = self
            .api
            .post_json("2/files/delete_v2", &PathArg { path }, self.auth())
            .await?;
        tracing::info!(path = %path, "storage.deleted");
        Ok(())
    }
}

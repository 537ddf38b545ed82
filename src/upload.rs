//! Packages ingested files into upload requests.
//!
//! A lone file outside folder mode goes to the single-file endpoint. Anything
//! else is sent as one batch. In folder mode each file carries its relative
//! path and the server recreates the folder structure under the target;
//! otherwise every file carries only its name and lands directly in it.

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::api::client::ApiClient;
use crate::docs::model::NodeId;
use crate::error::{AppError, Result};
use crate::ingest::IngestedFile;

/// Everything needed to submit one upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub files: Vec<IngestedFile>,
    /// `None` uploads at the top level.
    pub target_folder_id: Option<NodeId>,
    pub description: String,
    pub tag_ids: Vec<i64>,
    /// Preserve directory structure even for a single file.
    pub folder_mode: bool,
}

/// Which endpoint a request goes to.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadPlan<'a> {
    Single(&'a IngestedFile),
    /// `paths[i]` is the upload path of `files[i]`.
    Batch {
        files: &'a [IngestedFile],
        paths: Vec<&'a str>,
    },
}

/// Value of one multipart field before file contents are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(String),
    File(&'a IngestedFile),
}

/// What the server reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub total_files: u64,
    pub created_folders: u64,
}

impl UploadRequest {
    pub fn plan(&self) -> Result<UploadPlan<'_>> {
        match self.files.as_slice() {
            [] => Err(AppError::Validation("No files selected for upload".into())),
            [only] if !self.folder_mode => Ok(UploadPlan::Single(only)),
            files => Ok(UploadPlan::Batch {
                files,
                paths: files.iter().map(|f| f.upload_path(self.folder_mode)).collect(),
            }),
        }
    }

    /// Multipart fields in submission order.
    pub fn fields(&self) -> Result<Vec<(&'static str, FieldValue<'_>)>> {
        let mut fields = Vec::new();
        match self.plan()? {
            UploadPlan::Single(file) => fields.push(("file", FieldValue::File(file))),
            UploadPlan::Batch { files, paths } => {
                for file in files {
                    fields.push(("files", FieldValue::File(file)));
                }
                for path in paths {
                    fields.push(("file_paths[]", FieldValue::Text(path.to_string())));
                }
            }
        }

        fields.push(("description", FieldValue::Text(self.description.clone())));
        if let Some(parent) = self.target_folder_id {
            fields.push(("parent_id", FieldValue::Text(parent.to_string())));
        }
        if !self.tag_ids.is_empty() {
            fields.push((
                "tag_ids",
                FieldValue::Text(serde_json::to_string(&self.tag_ids)?),
            ));
        }
        Ok(fields)
    }

    /// Load file contents and build the multipart body.
    async fn form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields()? {
            form = match value {
                FieldValue::Text(text) => form.text(name, text),
                FieldValue::File(file) => {
                    let bytes = file.file.read().await?;
                    form.part(name, Part::bytes(bytes).file_name(file.file.name.clone()))
                }
            };
        }
        Ok(form)
    }
}

/// Send the request to the matching endpoint.
pub async fn submit(client: &ApiClient, request: &UploadRequest) -> Result<UploadOutcome> {
    let plan = request.plan()?;
    let form = request.form().await?;

    let outcome = match plan {
        UploadPlan::Single(_) => {
            client.upload_single(form).await?;
            UploadOutcome {
                total_files: 1,
                created_folders: 0,
            }
        }
        UploadPlan::Batch { files, .. } => {
            let summary = client.upload_batch(form).await?;
            UploadOutcome {
                total_files: if summary.total_files == 0 {
                    files.len() as u64
                } else {
                    summary.total_files
                },
                created_folders: summary.created_folders.count(),
            }
        }
    };

    info!(
        files = outcome.total_files,
        folders = outcome.created_folders,
        parent = ?request.target_folder_id,
        "upload complete"
    );
    Ok(outcome)
}

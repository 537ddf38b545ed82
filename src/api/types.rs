use serde::{Deserialize, Serialize};

use crate::docs::model::NodeId;
use crate::error::{AppError, Result};

/// `{ success, data, message }` wrapper used by every JSON endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Server-provided explanation, if any.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }

    /// Unwrap the payload, turning `success: false` into an error.
    pub fn into_result(self, action: &str) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            let reason = self.reason().unwrap_or("no details").to_string();
            Err(AppError::api(format!("{} failed: {}", action, reason)))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDocumentRequest {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
}

/// Folder count reported by the batch endpoint: either a number or the list
/// of created folders.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FolderCount {
    Number(u64),
    List(Vec<serde_json::Value>),
}

impl Default for FolderCount {
    fn default() -> Self {
        FolderCount::Number(0)
    }
}

impl FolderCount {
    pub fn count(&self) -> u64 {
        match self {
            FolderCount::Number(n) => *n,
            FolderCount::List(items) => items.len() as u64,
        }
    }
}

/// Payload of `POST /api/upload/batch`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchUploadSummary {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub created_folders: FolderCount,
}

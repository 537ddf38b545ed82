use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    ApiEnvelope, BatchUploadSummary, CreateFolderRequest, CreateTagRequest, UpdateDocumentRequest,
};
use crate::docs::model::{ChildrenSummary, Node, NodeDetail, NodeId, Tag};
use crate::error::{AppError, Result};

/// Client for the document server's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the JSON envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!(action, status = status.as_u16(), bytes = body.len(), "api response");

        if !status.is_success() {
            let reason = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.reason().map(str::to_string))
                .unwrap_or(body);
            return Err(AppError::Api {
                status: Some(status.as_u16()),
                message: format!("{} failed: {}", action, reason),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_result(action)
    }

    async fn send_required<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T> {
        self.send(request, action)
            .await?
            .ok_or_else(|| AppError::api(format!("{} returned no data", action)))
    }

    /// `GET /api/documents/tree`
    pub async fn fetch_tree(&self) -> Result<Vec<Node>> {
        let req = self.client.get(self.url("/api/documents/tree"));
        Ok(self.send(req, "Load tree").await?.unwrap_or_default())
    }

    /// `GET /api/documents/{id}/detail`
    pub async fn fetch_detail(&self, id: NodeId) -> Result<NodeDetail> {
        let req = self
            .client
            .get(self.url(&format!("/api/documents/{}/detail", id)));
        self.send_required(req, "Load details").await
    }

    /// `GET /api/documents/{id}/children`
    pub async fn fetch_children_summary(&self, id: NodeId) -> Result<ChildrenSummary> {
        let req = self
            .client
            .get(self.url(&format!("/api/documents/{}/children", id)));
        Ok(self
            .send(req, "Load children summary")
            .await?
            .unwrap_or_default())
    }

    /// `POST /api/documents/folder`; returns the new folder's id when the
    /// server reports it.
    pub async fn create_folder(&self, body: &CreateFolderRequest) -> Result<Option<NodeId>> {
        let req = self
            .client
            .post(self.url("/api/documents/folder"))
            .json(body);
        let data: Option<serde_json::Value> = self.send(req, "Create folder").await?;
        Ok(data.and_then(|d| d.get("id").and_then(|id| id.as_i64())))
    }

    /// `PUT /api/documents/{id}`
    pub async fn update_document(&self, id: NodeId, body: &UpdateDocumentRequest) -> Result<()> {
        let req = self
            .client
            .put(self.url(&format!("/api/documents/{}", id)))
            .json(body);
        self.send::<serde_json::Value>(req, "Update").await?;
        Ok(())
    }

    /// `DELETE /api/documents/{id}`
    pub async fn delete_document(&self, id: NodeId) -> Result<()> {
        let req = self
            .client
            .delete(self.url(&format!("/api/documents/{}", id)));
        self.send::<serde_json::Value>(req, "Delete").await?;
        Ok(())
    }

    /// `POST /api/upload/` with a single `file` part.
    pub async fn upload_single(&self, form: Form) -> Result<()> {
        let req = self.client.post(self.url("/api/upload/")).multipart(form);
        self.send::<serde_json::Value>(req, "Upload").await?;
        Ok(())
    }

    /// `POST /api/upload/batch` with repeated `files` / `file_paths[]` parts.
    pub async fn upload_batch(&self, form: Form) -> Result<BatchUploadSummary> {
        let req = self
            .client
            .post(self.url("/api/upload/batch"))
            .multipart(form);
        Ok(self
            .send(req, "Batch upload")
            .await?
            .unwrap_or_default())
    }

    /// `GET /api/tags/`
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let req = self.client.get(self.url("/api/tags/"));
        Ok(self.send(req, "Load tags").await?.unwrap_or_default())
    }

    /// `POST /api/tags/`
    pub async fn create_tag(&self, body: &CreateTagRequest) -> Result<Tag> {
        let req = self.client.post(self.url("/api/tags/")).json(body);
        self.send_required(req, "Create tag").await
    }
}

//! View persistence over the backend's `views` resource.

use chrono::Utc;

use crate::models::{View, ViewDocument};

use super::client::ApiClient;
use super::error::ApiError;

/// CRUD plus export/import for persisted views.
///
/// Save is insert-or-update keyed by id: a view without an id gets a fresh
/// one and is POSTed; a persisted view is PUT in place. Validation runs
/// before any request leaves the process.
#[derive(Debug, Clone)]
pub struct ViewStore {
    client: ApiClient,
}

impl ViewStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<View>, ApiError> {
        let resp = self
            .client
            .http()
            .get(self.client.url("/api/views"))
            .send()
            .await?;
        let resp = ApiClient::check(resp).await?;
        // The backend encodes a nil slice as null.
        let views: Option<Vec<View>> = resp.json().await?;
        Ok(views.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<View, ApiError> {
        let resp = self
            .client
            .http()
            .get(self.client.url(&format!("/api/views/{}", id)))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::ViewNotFound(id.to_string()));
        }
        let resp = ApiClient::check(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn save(&self, view: &mut View) -> Result<(), ApiError> {
        view.validate()?;

        let now = Utc::now().to_rfc3339();
        view.updated = now.clone();

        if view.is_persisted() {
            let resp = self
                .client
                .http()
                .put(self.client.url(&format!("/api/views/{}", view.id)))
                .json(view)
                .send()
                .await?;
            ApiClient::check(resp).await?;
        } else {
            view.assign_id();
            view.created = now;
            let resp = self
                .client
                .http()
                .post(self.client.url("/api/views"))
                .json(view)
                .send()
                .await?;
            ApiClient::check(resp).await?;
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .http()
            .delete(self.client.url(&format!("/api/views/{}", id)))
            .send()
            .await?;
        ApiClient::check(resp).await?;
        Ok(())
    }

    /// Fetch a view and strip its store id into a portable document.
    pub async fn export(&self, id: &str) -> Result<ViewDocument, ApiError> {
        Ok(self.get(id).await?.export())
    }

    /// Create a brand-new persisted view from a portable document. The
    /// document's shape was already validated during parsing; any id it may
    /// have carried is gone by construction.
    pub async fn import(&self, document: ViewDocument) -> Result<View, ApiError> {
        let mut view = document.into_view();
        self.save(&mut view).await?;
        Ok(view)
    }
}

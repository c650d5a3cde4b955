use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use skpush_core::SubscriberRecord;
use url::Url;

use crate::error::StoreError;
use crate::traits::SubscriberStore;

/// Subscriber store backed by the host's resource CRUD API.
///
/// Records live under `(resource_type, provider)` on the host; every
/// call is bearer-token authenticated with the token obtained at login.
pub struct ResourcesStore {
    client: Client,
    base_url: Url,
    resource_type: String,
    provider_id: String,
    token: String,
}

impl ResourcesStore {
    pub fn new(
        client: Client,
        base_url: Url,
        resource_type: impl Into<String>,
        provider_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            resource_type: resource_type.into(),
            provider_id: provider_id.into(),
            token: token.into(),
        }
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        let mut url = self
            .base_url
            .join(&format!("signalk/v2/api/resources/{}", self.resource_type))
            .map_err(|e| StoreError::internal(e.to_string()))?;
        url.query_pairs_mut().append_pair("provider", &self.provider_id);
        Ok(url)
    }

    fn record_url(&self, id: &str) -> Result<Url, StoreError> {
        let mut url = self
            .base_url
            .join(&format!(
                "signalk/v2/api/resources/{}/{}",
                self.resource_type, id
            ))
            .map_err(|e| StoreError::internal(e.to_string()))?;
        url.query_pairs_mut().append_pair("provider", &self.provider_id);
        Ok(url)
    }
}

#[async_trait]
impl SubscriberStore for ResourcesStore {
    async fn list(&self) -> Result<HashMap<String, SubscriberRecord>, StoreError> {
        let response = self
            .client
            .get(self.collection_url()?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<HashMap<String, SubscriberRecord>>()
                .await
                .map_err(|e| StoreError::internal(format!("malformed resource list: {e}"))),
            // An empty collection may not exist yet on some providers.
            StatusCode::NOT_FOUND => Ok(HashMap::new()),
            status => Err(StoreError::connection(format!(
                "resource list returned {status}"
            ))),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<SubscriberRecord>, StoreError> {
        let response = self
            .client
            .get(self.record_url(id)?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<SubscriberRecord>()
                .await
                .map(Some)
                .map_err(|e| StoreError::invalid_record(id, e.to_string())),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(StoreError::connection(format!(
                "resource read returned {status}"
            ))),
        }
    }

    async fn set(&self, id: &str, record: &SubscriberRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.record_url(id)?)
            .bearer_auth(&self.token)
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::connection(format!(
                "resource write returned {}",
                response.status()
            )))
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.record_url(id)?)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(id)),
            status => Err(StoreError::connection(format!(
                "resource delete returned {status}"
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "resources-api"
    }
}

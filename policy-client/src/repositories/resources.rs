use super::{classify_create, classify_delete, fetch_list, fetch_one, list_or_empty, rejected_key, CreateOutcome};
use crate::error::TransportError;
use crate::models::{is_valid_key, Resource};
use crate::transport::TransportClient;
use serde_json::json;

/// Resources under `/schema/{project}/{env}/resources`.
pub struct ResourceRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> ResourceRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!("{}/resources", client.settings().schema_path());
        Self { client, base }
    }

    pub async fn create(&self, resource: &Resource) -> bool {
        self.create_outcome(resource).await.is_ok()
    }

    pub async fn create_outcome(&self, resource: &Resource) -> CreateOutcome {
        if !is_valid_key(&resource.key) {
            return rejected_key("resource", &resource.key);
        }
        let body = json!(resource);
        classify_create("resource", &resource.key, self.client.post(&self.base, &body).await)
    }

    pub async fn list(&self) -> Vec<Resource> {
        list_or_empty(self.client, &self.base, "resources").await
    }

    pub async fn try_list(&self) -> Result<Vec<Resource>, TransportError> {
        fetch_list(self.client, &self.base).await
    }

    pub async fn get(&self, key: &str) -> Option<Resource> {
        fetch_one(self.client, &format!("{}/{}", self.base, key)).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        classify_delete("resource", key, self.client.delete(&endpoint, None).await)
    }
}

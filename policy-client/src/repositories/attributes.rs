use super::{classify_create, classify_delete, fetch_list, list_or_empty, rejected_key, CreateOutcome};
use crate::error::TransportError;
use crate::models::{is_valid_key, UserAttribute, USER_RESOURCE_KEY};
use crate::transport::TransportClient;
use serde_json::json;

/// Attributes of the implicit user resource.
pub struct AttributeRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> AttributeRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!(
            "{}/resources/{}/attributes",
            client.settings().schema_path(),
            USER_RESOURCE_KEY
        );
        Self { client, base }
    }

    pub async fn create(&self, attribute: &UserAttribute) -> bool {
        self.create_outcome(attribute).await.is_ok()
    }

    pub async fn create_outcome(&self, attribute: &UserAttribute) -> CreateOutcome {
        if !is_valid_key(&attribute.key) {
            return rejected_key("user attribute", &attribute.key);
        }
        let body = json!(attribute);
        classify_create("user attribute", &attribute.key, self.client.post(&self.base, &body).await)
    }

    pub async fn list(&self) -> Vec<UserAttribute> {
        list_or_empty(self.client, &self.base, "user attributes").await
    }

    pub async fn try_list(&self) -> Result<Vec<UserAttribute>, TransportError> {
        fetch_list(self.client, &self.base).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        classify_delete("user attribute", key, self.client.delete(&endpoint, None).await)
    }
}

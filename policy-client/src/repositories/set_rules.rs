use super::{classify_create, classify_delete, fetch_list, list_or_empty, CreateOutcome};
use crate::error::TransportError;
use crate::models::SetRule;
use crate::transport::TransportClient;
use serde_json::json;

/// Set rules under `/facts/{project}/{env}/set_rules`.
///
/// A rule has no id of its own; deletion sends the full triple again.
pub struct SetRuleRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> SetRuleRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!("{}/set_rules", client.settings().facts_path());
        Self { client, base }
    }

    pub async fn create(&self, rule: &SetRule) -> bool {
        self.create_outcome(rule).await.is_ok()
    }

    pub async fn create_outcome(&self, rule: &SetRule) -> CreateOutcome {
        let body = json!(rule);
        classify_create("set rule", &rule.to_string(), self.client.post(&self.base, &body).await)
    }

    pub async fn list(&self) -> Vec<SetRule> {
        list_or_empty(self.client, &self.base, "set rules").await
    }

    pub async fn try_list(&self) -> Result<Vec<SetRule>, TransportError> {
        fetch_list(self.client, &self.base).await
    }

    pub async fn delete(&self, rule: &SetRule) -> bool {
        let body = json!(rule);
        classify_delete(
            "set rule",
            &rule.to_string(),
            self.client.delete(&self.base, Some(&body)).await,
        )
    }
}

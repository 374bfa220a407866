use super::{classify_create, classify_delete, fetch_list, fetch_one, list_or_empty, rejected_key, CreateOutcome};
use crate::error::TransportError;
use crate::models::{is_valid_key, ConditionSet, ConditionSetKind, Conditions};
use crate::transport::TransportClient;
use serde_json::{json, Value};
use tracing::{info, warn};

/// User sets and resource sets under `/schema/{project}/{env}/condition_sets`.
pub struct ConditionSetRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> ConditionSetRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!("{}/condition_sets", client.settings().schema_path());
        Self { client, base }
    }

    /// Create a set; the payload's `type` comes from the set's kind.
    pub async fn create(&self, set: &ConditionSet) -> bool {
        self.create_outcome(set).await.is_ok()
    }

    pub async fn create_outcome(&self, set: &ConditionSet) -> CreateOutcome {
        if !is_valid_key(&set.key) {
            return rejected_key(label(set.kind), &set.key);
        }
        let body = json!(set);
        classify_create(label(set.kind), &set.key, self.client.post(&self.base, &body).await)
    }

    /// Create a user set, or replace its conditions if it already exists.
    pub async fn upsert_user_set(&self, set: &ConditionSet) -> CreateOutcome {
        let mut set = set.clone();
        set.kind = ConditionSetKind::UserSet;

        let outcome = self.create_outcome(&set).await;
        if outcome != CreateOutcome::AlreadyExists {
            return outcome;
        }

        if self.patch_conditions(&set.key, &set.conditions).await {
            CreateOutcome::AlreadyExists
        } else {
            CreateOutcome::Failed
        }
    }

    /// PATCH only the condition expression of an existing set.
    pub async fn update_conditions(&self, key: &str, conditions: &Conditions) -> bool {
        self.patch_conditions(key, &conditions.to_value()).await
    }

    async fn patch_conditions(&self, key: &str, conditions: &Value) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        let body = json!({ "conditions": conditions });
        match self.client.patch(&endpoint, &body).await {
            Ok(_) => {
                info!("Updated conditions of '{}'", key);
                true
            }
            Err(e) => {
                warn!("Failed to update conditions of '{}': {}", key, e.reason());
                false
            }
        }
    }

    pub async fn list(&self) -> Vec<ConditionSet> {
        list_or_empty(self.client, &self.base, "condition sets").await
    }

    pub async fn try_list(&self) -> Result<Vec<ConditionSet>, TransportError> {
        fetch_list(self.client, &self.base).await
    }

    pub async fn get(&self, key: &str) -> Option<ConditionSet> {
        fetch_one(self.client, &format!("{}/{}", self.base, key)).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        classify_delete("condition set", key, self.client.delete(&endpoint, None).await)
    }
}

fn label(kind: ConditionSetKind) -> &'static str {
    match kind {
        ConditionSetKind::UserSet => "user set",
        ConditionSetKind::ResourceSet => "resource set",
    }
}

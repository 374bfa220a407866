//! Typed façades over the transport client, one per entity class.
//!
//! Shared semantics:
//! - `create` is true on 2xx and on 409 (already present).
//! - `list` never fails; a failed call logs and yields an empty vector.
//!   `try_list` exposes the failure for callers that need to report it.
//! - `delete` is true on 2xx and on 404 (already absent).

pub mod attributes;
pub mod condition_sets;
pub mod resources;
pub mod roles;
pub mod set_rules;
pub mod tenants;

pub use attributes::AttributeRepository;
pub use condition_sets::ConditionSetRepository;
pub use resources::ResourceRepository;
pub use roles::RoleRepository;
pub use set_rules::SetRuleRepository;
pub use tenants::TenantRepository;

use crate::error::TransportError;
use crate::transport::{ApiReply, CallResult, TransportClient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

/// Outcome of a create call as seen by callers that care about the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    Failed,
}

impl CreateOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, CreateOutcome::Failed)
    }
}

pub(crate) fn classify_create(entity: &str, key: &str, result: CallResult) -> CreateOutcome {
    match result {
        Ok(ApiReply { exists: true, .. }) => {
            info!("{} '{}' already exists", entity, key);
            CreateOutcome::AlreadyExists
        }
        Ok(_) => {
            info!("Created {} '{}'", entity, key);
            CreateOutcome::Created
        }
        Err(e) => {
            warn!("Failed to create {} '{}': {}", entity, key, e.reason());
            CreateOutcome::Failed
        }
    }
}

pub(crate) fn classify_delete(entity: &str, key: &str, result: CallResult) -> bool {
    match result {
        Ok(_) => {
            info!("Deleted {} '{}'", entity, key);
            true
        }
        Err(e) if e.is_not_found() => {
            info!("{} '{}' already absent", entity, key);
            true
        }
        Err(e) => {
            warn!("Failed to delete {} '{}': {}", entity, key, e.reason());
            false
        }
    }
}

pub(crate) fn rejected_key(entity: &str, key: &str) -> CreateOutcome {
    warn!(
        "Refusing to create {} '{}': keys must match ^[a-z][a-z0-9_-]*$",
        entity, key
    );
    CreateOutcome::Failed
}

pub(crate) async fn fetch_list<T: DeserializeOwned>(
    client: &TransportClient,
    endpoint: &str,
) -> Result<Vec<T>, TransportError> {
    let reply = client.get(endpoint).await?;
    Ok(decode_items(reply.data))
}

pub(crate) async fn list_or_empty<T: DeserializeOwned>(
    client: &TransportClient,
    endpoint: &str,
    entity: &str,
) -> Vec<T> {
    match fetch_list(client, endpoint).await {
        Ok(items) => items,
        Err(e) => {
            warn!("Could not list {}: {}", entity, e.reason());
            Vec::new()
        }
    }
}

pub(crate) async fn fetch_one<T: DeserializeOwned>(
    client: &TransportClient,
    endpoint: &str,
) -> Option<T> {
    let reply = client.get(endpoint).await.ok()?;
    reply.data.and_then(|data| serde_json::from_value(data).ok())
}

/// Accepts both a bare array and a `{ "data": [...] }` page.
/// Items that do not decode are skipped.
fn decode_items<T: DeserializeOwned>(data: Option<Value>) -> Vec<T> {
    let items = match data {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut page)) => match page.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping undecodable list item: {}", e);
                None
            }
        })
        .collect()
}

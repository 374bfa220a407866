//! Read-only snapshot of the remote policy model.
//!
//! Every entity class is listed independently; a failing list call only
//! marks its own section as unavailable.

use crate::models::{ConditionSet, SetRule};
use crate::repositories::{
    AttributeRepository, ConditionSetRepository, ResourceRepository, RoleRepository,
    SetRuleRepository,
};
use crate::transport::TransportClient;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Attribute whose scope prefix is linted by default.
pub const DEFAULT_LINT_ATTRIBUTE: &str = "groups";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Listed { items: Vec<T> },
    Unavailable { message: String },
}

impl<T> Section<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Section::Listed { items } => items,
            Section::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Section::Listed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceEntry {
    pub key: String,
    pub name: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleEntry {
    pub key: String,
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Which scope prefix a user set's conditions use for the linted attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLint {
    /// `user.<attribute>`: read from the check-time subject payload.
    UserScope,
    /// `subject.<attribute>`: almost always a misconfiguration.
    SubjectScope,
    /// The attribute is not referenced.
    NotReferenced,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSetEntry {
    pub key: String,
    pub name: String,
    pub conditions: String,
    pub scope: ScopeLint,
}

impl UserSetEntry {
    pub fn is_flagged(&self) -> bool {
        self.scope == ScopeLint::SubjectScope
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSetEntry {
    pub key: String,
    pub name: String,
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub generated_at: String,
    pub project_id: String,
    pub env_id: String,
    pub lint_attribute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdp_healthy: Option<bool>,
    pub resources: Section<ResourceEntry>,
    pub roles: Section<RoleEntry>,
    pub user_attributes: Section<AttributeEntry>,
    pub user_sets: Section<UserSetEntry>,
    pub resource_sets: Section<ResourceSetEntry>,
    pub set_rules: Section<SetRule>,
}

impl VerifyReport {
    /// Keys of user sets that reference `subject.<attribute>`.
    pub fn flagged_user_sets(&self) -> Vec<&str> {
        self.user_sets
            .items()
            .iter()
            .filter(|entry| entry.is_flagged())
            .map(|entry| entry.key.as_str())
            .collect()
    }

    /// True when every section could be listed.
    pub fn is_complete(&self) -> bool {
        self.resources.is_available()
            && self.roles.is_available()
            && self.user_attributes.is_available()
            && self.user_sets.is_available()
            && self.resource_sets.is_available()
            && self.set_rules.is_available()
    }
}

/// Lint a condition tree for the scope prefix of `attribute`.
pub fn lint_scope(conditions: &Value, attribute: &str) -> ScopeLint {
    let serialized = conditions.to_string();
    if serialized.contains(&format!("subject.{}", attribute)) {
        ScopeLint::SubjectScope
    } else if serialized.contains(&format!("user.{}", attribute)) {
        ScopeLint::UserScope
    } else {
        ScopeLint::NotReferenced
    }
}

pub struct Verifier<'a> {
    client: &'a TransportClient,
    lint_attribute: String,
    probe_health: bool,
}

impl<'a> Verifier<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        Self {
            client,
            lint_attribute: DEFAULT_LINT_ATTRIBUTE.to_string(),
            probe_health: false,
        }
    }

    pub fn with_lint_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.lint_attribute = attribute.into();
        self
    }

    /// Also probe the decision point's health endpoint.
    pub fn with_health_probe(mut self, enabled: bool) -> Self {
        self.probe_health = enabled;
        self
    }

    pub async fn verify(&self) -> VerifyReport {
        let settings = self.client.settings();
        info!(
            "Verifying policy model for {}/{}",
            settings.project_id, settings.env_id
        );

        let pdp_healthy = if self.probe_health {
            Some(self.client.check_health().await)
        } else {
            None
        };

        let resources = section(
            "resources",
            ResourceRepository::new(self.client).try_list().await,
            |r| ResourceEntry {
                key: r.key,
                name: r.name,
                actions: r.actions.into_keys().collect(),
            },
        );

        let roles = section("roles", RoleRepository::new(self.client).try_list().await, |r| {
            RoleEntry {
                key: r.key,
                name: r.name,
                permissions: r.permissions,
            }
        });

        let user_attributes = section(
            "user attributes",
            AttributeRepository::new(self.client).try_list().await,
            |a| AttributeEntry {
                key: a.key,
                kind: a.kind.to_string(),
            },
        );

        let (user_sets, resource_sets) =
            match ConditionSetRepository::new(self.client).try_list().await {
                Ok(sets) => self.partition(sets),
                Err(e) => {
                    warn!("Could not list condition sets: {}", e.reason());
                    let message = e.to_string();
                    (
                        Section::Unavailable {
                            message: message.clone(),
                        },
                        Section::Unavailable { message },
                    )
                }
            };

        let set_rules = section(
            "set rules",
            SetRuleRepository::new(self.client).try_list().await,
            |rule| rule,
        );

        let report = VerifyReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            project_id: settings.project_id.clone(),
            env_id: settings.env_id.clone(),
            lint_attribute: self.lint_attribute.clone(),
            pdp_healthy,
            resources,
            roles,
            user_attributes,
            user_sets,
            resource_sets,
            set_rules,
        };

        for key in report.flagged_user_sets() {
            warn!(
                "User set '{}' references subject.{} instead of user.{}",
                key, self.lint_attribute, self.lint_attribute
            );
        }

        report
    }

    fn partition(
        &self,
        sets: Vec<ConditionSet>,
    ) -> (Section<UserSetEntry>, Section<ResourceSetEntry>) {
        let mut user_sets = Vec::new();
        let mut resource_sets = Vec::new();

        for set in sets {
            if set.is_user_set() {
                user_sets.push(UserSetEntry {
                    scope: lint_scope(&set.conditions, &self.lint_attribute),
                    conditions: set.conditions.to_string(),
                    key: set.key,
                    name: set.name,
                });
            } else {
                resource_sets.push(ResourceSetEntry {
                    key: set.key,
                    name: set.name,
                    resource: set.resource_id,
                });
            }
        }

        (
            Section::Listed { items: user_sets },
            Section::Listed {
                items: resource_sets,
            },
        )
    }
}

fn section<T, U, F>(
    entity: &str,
    listed: Result<Vec<T>, crate::error::TransportError>,
    map: F,
) -> Section<U>
where
    F: FnMut(T) -> U,
{
    match listed {
        Ok(items) => Section::Listed {
            items: items.into_iter().map(map).collect(),
        },
        Err(e) => {
            warn!("Could not list {}: {}", entity, e.reason());
            Section::Unavailable {
                message: e.to_string(),
            }
        }
    }
}

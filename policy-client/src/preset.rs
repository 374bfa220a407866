//! Declarative policy bundles and their provisioning.
//!
//! A bundle is YAML. Grants are written as user set × resource × actions and
//! expand to one set rule per action; the resource set defaults to the one
//! the service generates for each resource (`__autogen_<resource>`).

use crate::error::PresetError;
use crate::models::{
    autogen_resource_set, is_valid_key, title_case, ConditionSet, ConditionSetKind, Conditions,
    Operator, Permission, Predicate, Resource, Role, SetRule, UserAttribute,
};
use crate::repositories::{
    AttributeRepository, ConditionSetRepository, CreateOutcome, ResourceRepository,
    RoleRepository, SetRuleRepository,
};
use crate::transport::TransportClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

const HORAION_YAML: &str = include_str!("../presets/horaion.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct PresetSet {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resource a resource set is bound to.
    #[serde(default)]
    pub resource: Option<String>,
    pub conditions: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Grant {
    pub user_set: String,
    pub resource: String,
    pub actions: Vec<String>,
    #[serde(default)]
    pub resource_set: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresetBundle {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_attributes: Vec<UserAttribute>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub user_sets: Vec<PresetSet>,
    #[serde(default)]
    pub resource_sets: Vec<PresetSet>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl PresetBundle {
    /// The built-in Horaion bundle.
    pub fn horaion() -> Result<Self, PresetError> {
        Self::from_yaml_str(HORAION_YAML)
    }

    pub fn from_file(path: &Path) -> Result<Self, PresetError> {
        info!("Loading preset bundle from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, PresetError> {
        let mut bundle: PresetBundle = serde_yaml::from_str(content)?;
        for resource in &mut bundle.resources {
            if resource.name.is_empty() {
                resource.name = title_case(&resource.key);
            }
            for (key, action) in resource.actions.iter_mut() {
                if action.name.is_empty() {
                    action.name = title_case(key);
                }
            }
        }
        for role in &mut bundle.roles {
            if role.name.is_empty() {
                role.name = title_case(&role.key);
            }
        }
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<(), PresetError> {
        let invalid = |what: &str, key: &str| {
            PresetError::Validation(format!("{} key '{}' is not a valid key", what, key))
        };

        for attribute in &self.user_attributes {
            if !is_valid_key(&attribute.key) {
                return Err(invalid("user attribute", &attribute.key));
            }
        }
        for resource in &self.resources {
            if !is_valid_key(&resource.key) {
                return Err(invalid("resource", &resource.key));
            }
            if let Some(action) = resource.actions.keys().find(|a| !is_valid_key(a)) {
                return Err(invalid("action", action));
            }
        }
        for role in &self.roles {
            if !is_valid_key(&role.key) {
                return Err(invalid("role", &role.key));
            }
            for permission in &role.permissions {
                if Permission::parse(permission).is_none() {
                    return Err(PresetError::Validation(format!(
                        "role '{}' has malformed permission '{}'",
                        role.key, permission
                    )));
                }
            }
        }
        for set in self.user_sets.iter().chain(&self.resource_sets) {
            if !is_valid_key(&set.key) {
                return Err(invalid("condition set", &set.key));
            }
            if Conditions::from_value(&set.conditions).is_none() {
                return Err(PresetError::Validation(format!(
                    "condition set '{}' must use a flat allOf list of single-attribute predicates",
                    set.key
                )));
            }
        }
        for set in &self.resource_sets {
            match set.resource.as_deref() {
                None => {
                    return Err(PresetError::Validation(format!(
                        "resource set '{}' has no resource",
                        set.key
                    )))
                }
                Some(resource) if !is_valid_key(resource) => {
                    return Err(invalid("resource set resource", resource))
                }
                Some(_) => {}
            }
        }

        let user_sets: HashSet<&str> = self.user_sets.iter().map(|s| s.key.as_str()).collect();
        for grant in &self.grants {
            if !user_sets.contains(grant.user_set.as_str()) {
                return Err(PresetError::Validation(format!(
                    "grant references unknown user set '{}'",
                    grant.user_set
                )));
            }
            let resource = self
                .resources
                .iter()
                .find(|r| r.key == grant.resource)
                .ok_or_else(|| {
                    PresetError::Validation(format!(
                        "grant references unknown resource '{}'",
                        grant.resource
                    ))
                })?;
            if let Some(action) = grant
                .actions
                .iter()
                .find(|a| !resource.actions.contains_key(a.as_str()))
            {
                return Err(PresetError::Validation(format!(
                    "grant references unknown action '{}:{}'",
                    grant.resource, action
                )));
            }
            if let Some(resource_set) = &grant.resource_set {
                if !is_valid_resource_set_key(resource_set) {
                    return Err(invalid("grant resource set", resource_set));
                }
            }
        }

        Ok(())
    }

    pub fn user_set_definitions(&self) -> Vec<ConditionSet> {
        self.user_sets
            .iter()
            .map(|s| to_condition_set(s, ConditionSetKind::UserSet))
            .collect()
    }

    pub fn resource_set_definitions(&self) -> Vec<ConditionSet> {
        self.resource_sets
            .iter()
            .map(|s| to_condition_set(s, ConditionSetKind::ResourceSet))
            .collect()
    }

    /// Grants expanded into set-rule triples.
    pub fn set_rules(&self) -> Vec<SetRule> {
        self.grants
            .iter()
            .flat_map(|grant| {
                let resource_set = grant
                    .resource_set
                    .clone()
                    .unwrap_or_else(|| autogen_resource_set(&grant.resource));
                grant.actions.iter().map(move |action| {
                    SetRule::new(
                        grant.user_set.clone(),
                        resource_set.clone(),
                        &Permission::new(grant.resource.clone(), action.clone()),
                    )
                })
            })
            .collect()
    }
}

/// Plain keys, or the service's generated `__autogen_<resource>` sets.
fn is_valid_resource_set_key(key: &str) -> bool {
    match key.strip_prefix("__autogen_") {
        Some(resource) => is_valid_key(resource),
        None => is_valid_key(key),
    }
}

fn to_condition_set(set: &PresetSet, kind: ConditionSetKind) -> ConditionSet {
    ConditionSet {
        key: set.key.clone(),
        name: set.name.clone(),
        description: set.description.clone(),
        kind,
        resource_id: set.resource.clone(),
        conditions: set.conditions.clone(),
    }
}

/// User set matching subjects whose `user.groups` contains `group`.
pub fn group_user_set(key: &str, name: &str, group: &str) -> ConditionSet {
    ConditionSet::user_set(
        key,
        name,
        Conditions::all_of(vec![Predicate::user(
            "groups",
            Operator::ArrayContains,
            group,
        )]),
    )
    .with_description(format!("Members of the {} group", group))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

impl ProvisionSummary {
    pub fn record(&mut self, outcome: CreateOutcome) {
        match outcome {
            CreateOutcome::Created => self.created += 1,
            CreateOutcome::AlreadyExists => self.existing += 1,
            CreateOutcome::Failed => self.failed += 1,
        }
    }

    fn record_ok(&mut self, ok: bool) {
        if ok {
            self.created += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Feeds a [`PresetBundle`] through the entity repositories.
pub struct PresetRunner<'a> {
    client: &'a TransportClient,
}

impl<'a> PresetRunner<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        Self { client }
    }

    /// Attributes, resources, roles, user sets, resource sets, then set rules.
    pub async fn provision(&self, bundle: &PresetBundle) -> ProvisionSummary {
        info!("Provisioning preset '{}'", bundle.name);
        let mut summary = ProvisionSummary::default();

        self.provision_attributes(bundle, &mut summary).await;

        let resources = ResourceRepository::new(self.client);
        for resource in &bundle.resources {
            summary.record(resources.create_outcome(resource).await);
        }

        let roles = RoleRepository::new(self.client);
        for role in &bundle.roles {
            let outcome = roles.create_outcome(role).await;
            summary.record(outcome);
            if !outcome.is_ok() {
                continue;
            }
            for permission in role.permissions.iter().filter_map(|p| Permission::parse(p)) {
                summary.record_ok(
                    roles
                        .assign_permission(&role.key, &permission.resource, &permission.action)
                        .await,
                );
            }
        }

        self.provision_user_set_definitions(bundle, &mut summary).await;

        let sets = ConditionSetRepository::new(self.client);
        for set in bundle.resource_set_definitions() {
            summary.record(sets.create_outcome(&set).await);
        }

        let rules = SetRuleRepository::new(self.client);
        for rule in bundle.set_rules() {
            summary.record(rules.create_outcome(&rule).await);
        }

        log_summary(&bundle.name, &summary);
        summary
    }

    /// Only the user attributes and user sets of a bundle.
    pub async fn provision_user_sets(&self, bundle: &PresetBundle) -> ProvisionSummary {
        info!("Provisioning user sets of preset '{}'", bundle.name);
        let mut summary = ProvisionSummary::default();
        self.provision_attributes(bundle, &mut summary).await;
        self.provision_user_set_definitions(bundle, &mut summary).await;
        log_summary(&bundle.name, &summary);
        summary
    }

    async fn provision_attributes(&self, bundle: &PresetBundle, summary: &mut ProvisionSummary) {
        let attributes = AttributeRepository::new(self.client);
        for attribute in &bundle.user_attributes {
            summary.record(attributes.create_outcome(attribute).await);
        }
    }

    async fn provision_user_set_definitions(
        &self,
        bundle: &PresetBundle,
        summary: &mut ProvisionSummary,
    ) {
        let sets = ConditionSetRepository::new(self.client);
        for set in bundle.user_set_definitions() {
            summary.record(sets.upsert_user_set(&set).await);
        }
    }
}

fn log_summary(name: &str, summary: &ProvisionSummary) {
    if summary.failed > 0 {
        warn!(
            "Preset '{}': {} created, {} already present, {} failed",
            name, summary.created, summary.existing, summary.failed
        );
    } else {
        info!(
            "Preset '{}': {} created, {} already present",
            name, summary.created, summary.existing
        );
    }
}

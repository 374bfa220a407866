//! Ordered, best-effort teardown of the remote policy model.
//!
//! Stages run strictly in sequence so that nothing is deleted while
//! something else still references it:
//! set rules, condition sets (resource sets before user sets), the default
//! user attribute, roles, resources, the default tenant.
//!
//! A failed item is logged and counted; it never stops the stage or the run.
//! Only the default user attribute is removed. Custom attributes are not
//! enumerated.

use crate::error::TransportError;
use crate::models::ConditionSetKind;
use crate::repositories::tenants::DEFAULT_TENANT_KEY;
use crate::repositories::{
    AttributeRepository, ConditionSetRepository, ResourceRepository, RoleRepository,
    SetRuleRepository, TenantRepository,
};
use crate::transport::TransportClient;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

pub const PROTECTED_RESOURCES: &[&str] = &["__user"];
pub const PROTECTED_ROLES: &[&str] = &["admin", "viewer"];
pub const DEFAULT_USER_ATTRIBUTE: &str = "groups";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStage {
    SetRules,
    ConditionSets,
    UserAttributes,
    Roles,
    Resources,
    Tenant,
}

impl fmt::Display for ResetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResetStage::SetRules => "set rules",
            ResetStage::ConditionSets => "condition sets",
            ResetStage::UserAttributes => "user attributes",
            ResetStage::Roles => "roles",
            ResetStage::Resources => "resources",
            ResetStage::Tenant => "tenant",
        };
        f.write_str(label)
    }
}

/// Which part of the model a reset tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    Full,
    Abac,
    Resources,
    Roles,
}

impl ResetScope {
    pub fn stages(&self) -> &'static [ResetStage] {
        match self {
            ResetScope::Full => &[
                ResetStage::SetRules,
                ResetStage::ConditionSets,
                ResetStage::UserAttributes,
                ResetStage::Roles,
                ResetStage::Resources,
                ResetStage::Tenant,
            ],
            ResetScope::Abac => &[
                ResetStage::SetRules,
                ResetStage::ConditionSets,
                ResetStage::UserAttributes,
            ],
            ResetScope::Resources => &[ResetStage::Resources],
            ResetScope::Roles => &[ResetStage::Roles],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: ResetStage,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageSummary {
    fn new(stage: ResetStage) -> Self {
        Self {
            stage,
            deleted: 0,
            skipped: 0,
            failed: 0,
        }
    }

    /// A collection that could not be listed counts as one failure.
    fn unlisted(&mut self, err: &TransportError) {
        warn!("Could not list {}: {}", self.stage, err.reason());
        self.failed += 1;
    }

    fn record(&mut self, ok: bool) {
        if ok {
            self.deleted += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetSummary {
    pub stages: Vec<StageSummary>,
}

impl ResetSummary {
    pub fn total_deleted(&self) -> usize {
        self.stages.iter().map(|s| s.deleted).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.stages.iter().map(|s| s.failed).sum()
    }
}

pub struct ResetOrchestrator<'a> {
    client: &'a TransportClient,
    user_attribute: String,
    tenant: String,
}

impl<'a> ResetOrchestrator<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        Self {
            client,
            user_attribute: DEFAULT_USER_ATTRIBUTE.to_string(),
            tenant: DEFAULT_TENANT_KEY.to_string(),
        }
    }

    pub fn with_user_attribute(mut self, key: impl Into<String>) -> Self {
        self.user_attribute = key.into();
        self
    }

    pub async fn run(&self, scope: ResetScope) -> ResetSummary {
        info!("Starting {:?} reset", scope);
        let mut summary = ResetSummary::default();
        for stage in scope.stages() {
            summary.stages.push(self.run_stage(*stage).await);
        }
        info!(
            "Reset finished: {} deleted, {} failed",
            summary.total_deleted(),
            summary.total_failed()
        );
        summary
    }

    pub async fn run_stage(&self, stage: ResetStage) -> StageSummary {
        info!("Reset stage: deleting {}", stage);
        let mut summary = StageSummary::new(stage);

        match stage {
            ResetStage::SetRules => {
                let repo = SetRuleRepository::new(self.client);
                match repo.try_list().await {
                    Ok(rules) => {
                        for rule in rules {
                            summary.record(repo.delete(&rule).await);
                        }
                    }
                    Err(e) => summary.unlisted(&e),
                }
            }
            ResetStage::ConditionSets => {
                let repo = ConditionSetRepository::new(self.client);
                match repo.try_list().await {
                    Ok(sets) => {
                        for kind in [ConditionSetKind::ResourceSet, ConditionSetKind::UserSet] {
                            for set in sets.iter().filter(|s| s.kind == kind) {
                                summary.record(repo.delete(&set.key).await);
                            }
                        }
                    }
                    Err(e) => summary.unlisted(&e),
                }
            }
            ResetStage::UserAttributes => {
                let repo = AttributeRepository::new(self.client);
                summary.record(repo.delete(&self.user_attribute).await);
            }
            ResetStage::Roles => {
                let repo = RoleRepository::new(self.client);
                let roles = match repo.try_list().await {
                    Ok(roles) => roles,
                    Err(e) => {
                        summary.unlisted(&e);
                        Vec::new()
                    }
                };
                for role in roles {
                    if PROTECTED_ROLES.contains(&role.key.as_str()) {
                        info!("Skipping protected role '{}'", role.key);
                        summary.skipped += 1;
                        continue;
                    }
                    summary.record(repo.delete(&role.key).await);
                }
            }
            ResetStage::Resources => {
                let repo = ResourceRepository::new(self.client);
                let resources = match repo.try_list().await {
                    Ok(resources) => resources,
                    Err(e) => {
                        summary.unlisted(&e);
                        Vec::new()
                    }
                };
                for resource in resources {
                    if PROTECTED_RESOURCES.contains(&resource.key.as_str()) {
                        info!("Skipping protected resource '{}'", resource.key);
                        summary.skipped += 1;
                        continue;
                    }
                    summary.record(repo.delete(&resource.key).await);
                }
            }
            ResetStage::Tenant => {
                let repo = TenantRepository::new(self.client);
                summary.record(repo.delete(&self.tenant).await);
            }
        }

        info!(
            "Stage {}: {} deleted, {} skipped, {} failed",
            stage, summary.deleted, summary.skipped, summary.failed
        );
        summary
    }
}

//! Client for a remote authorization-policy administration service.
//!
//! The crate mirrors a declarative policy model (resources, roles, user
//! attributes, condition sets and set rules) onto the service's
//! administrative API and reads it back.
//!
//! # Layers
//!
//! 1. [`transport::TransportClient`] issues authenticated JSON requests and
//!    normalizes every outcome; 409 Conflict counts as success.
//! 2. [`repositories`] wrap the transport with entity-specific verbs.
//! 3. [`verify::Verifier`] reads everything back into a [`verify::VerifyReport`].
//! 4. [`reset::ResetOrchestrator`] deletes entities in dependency order.
//! 5. [`preset::PresetRunner`] provisions a declarative [`preset::PresetBundle`].
//!
//! All calls run sequentially. Nothing is cached and nothing is persisted
//! locally; the remote service is the source of truth.
//!
//! # Example
//!
//! ```rust,no_run
//! use policy_client::{PolicyAdmin, Settings};
//! use policy_client::models::Resource;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let admin = PolicyAdmin::new(Settings::from_env()?);
//! let invoice = Resource::new("invoice", "Invoice").with_action("read");
//! if admin.resources().create(&invoice).await {
//!     println!("{} resources", admin.resources().list().await.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod preset;
pub mod repositories;
pub mod reset;
pub mod transport;
pub mod verify;

pub use config::Settings;
pub use error::{ConfigError, PresetError, TransportError};
pub use transport::{ApiReply, CallResult, TransportClient};

use repositories::{
    AttributeRepository, ConditionSetRepository, ResourceRepository, RoleRepository,
    SetRuleRepository,
};
use reset::{ResetOrchestrator, ResetScope, ResetSummary};
use verify::{Verifier, VerifyReport};

/// Entry point owning the transport client.
pub struct PolicyAdmin {
    client: TransportClient,
}

impl PolicyAdmin {
    pub fn new(settings: Settings) -> Self {
        Self {
            client: TransportClient::new(settings),
        }
    }

    pub fn client(&self) -> &TransportClient {
        &self.client
    }

    pub fn settings(&self) -> &Settings {
        self.client.settings()
    }

    pub fn resources(&self) -> ResourceRepository<'_> {
        ResourceRepository::new(&self.client)
    }

    pub fn roles(&self) -> RoleRepository<'_> {
        RoleRepository::new(&self.client)
    }

    pub fn attributes(&self) -> AttributeRepository<'_> {
        AttributeRepository::new(&self.client)
    }

    pub fn condition_sets(&self) -> ConditionSetRepository<'_> {
        ConditionSetRepository::new(&self.client)
    }

    pub fn set_rules(&self) -> SetRuleRepository<'_> {
        SetRuleRepository::new(&self.client)
    }

    pub async fn check_health(&self) -> bool {
        self.client.check_health().await
    }

    /// Full read-back including a decision-point health probe.
    pub async fn verify(&self) -> VerifyReport {
        Verifier::new(&self.client).with_health_probe(true).verify().await
    }

    pub async fn reset(&self, scope: ResetScope) -> ResetSummary {
        ResetOrchestrator::new(&self.client).run(scope).await
    }
}

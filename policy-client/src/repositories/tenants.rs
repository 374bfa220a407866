use super::classify_delete;
use crate::transport::TransportClient;

pub const DEFAULT_TENANT_KEY: &str = "default";

/// Tenants under `/facts/{project}/{env}/tenants`. Only cleanup is supported.
pub struct TenantRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> TenantRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!("{}/tenants", client.settings().facts_path());
        Self { client, base }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        classify_delete("tenant", key, self.client.delete(&endpoint, None).await)
    }
}

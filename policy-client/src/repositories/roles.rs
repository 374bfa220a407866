use super::{classify_create, classify_delete, fetch_list, fetch_one, list_or_empty, rejected_key, CreateOutcome};
use crate::error::TransportError;
use crate::models::{is_valid_key, Permission, Role};
use crate::transport::TransportClient;
use serde_json::json;
use tracing::{info, warn};

/// Roles under `/schema/{project}/{env}/roles`.
pub struct RoleRepository<'a> {
    client: &'a TransportClient,
    base: String,
}

impl<'a> RoleRepository<'a> {
    pub fn new(client: &'a TransportClient) -> Self {
        let base = format!("{}/roles", client.settings().schema_path());
        Self { client, base }
    }

    /// Create the role itself. Permissions are attached with [`Self::assign_permission`].
    pub async fn create(&self, role: &Role) -> bool {
        self.create_outcome(role).await.is_ok()
    }

    pub async fn create_outcome(&self, role: &Role) -> CreateOutcome {
        if !is_valid_key(&role.key) {
            return rejected_key("role", &role.key);
        }
        let body = json!(role);
        classify_create("role", &role.key, self.client.post(&self.base, &body).await)
    }

    pub async fn list(&self) -> Vec<Role> {
        list_or_empty(self.client, &self.base, "roles").await
    }

    pub async fn try_list(&self) -> Result<Vec<Role>, TransportError> {
        fetch_list(self.client, &self.base).await
    }

    pub async fn get(&self, key: &str) -> Option<Role> {
        fetch_one(self.client, &format!("{}/{}", self.base, key)).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        let endpoint = format!("{}/{}", self.base, key);
        classify_delete("role", key, self.client.delete(&endpoint, None).await)
    }

    /// Append one `resource:action` permission to a role.
    pub async fn assign_permission(&self, role_key: &str, resource: &str, action: &str) -> bool {
        let permission = Permission::new(resource, action);
        let endpoint = format!("{}/{}/permissions", self.base, role_key);
        let body = json!({ "permissions": [permission.to_string()] });

        match self.client.post(&endpoint, &body).await {
            Ok(_) => {
                info!("Granted '{}' to role '{}'", permission, role_key);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to grant '{}' to role '{}': {}",
                    permission,
                    role_key,
                    e.reason()
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TransportClient {
        TransportClient::new(Settings::new(server.uri(), "k").with_scope("proj", "env"))
    }

    #[tokio::test]
    async fn test_create_sends_no_permissions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/schema/proj/env/roles"))
            .and(body_json(json!({"key": "planner", "name": "Planner"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut role = Role::new("planner", "Planner");
        role.permissions.push("schedule:read".into());
        assert!(RoleRepository::new(&client).create(&role).await);
    }

    #[tokio::test]
    async fn test_assign_permission() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/schema/proj/env/roles/planner/permissions"))
            .and(body_json(json!({"permissions": ["schedule:read"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let repo = RoleRepository::new(&client);
        assert!(repo.assign_permission("planner", "schedule", "read").await);
    }

    #[tokio::test]
    async fn test_assign_permission_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let repo = RoleRepository::new(&client);
        assert!(!repo.assign_permission("ghost", "schedule", "read").await);
    }

    #[tokio::test]
    async fn test_list_decodes_permissions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/schema/proj/env/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"key": "admin", "name": "Admin", "permissions": ["schedule:read"]},
                {"key": "viewer", "name": "Viewer"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let roles = RoleRepository::new(&client).list().await;
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].permissions, vec!["schedule:read".to_string()]);
        assert!(roles[1].permissions.is_empty());
    }
}

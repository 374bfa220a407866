mod helpers;

use helpers::{admin_for, facts, mount_list, paths_with_method, requests_with_method, schema};
use policy_client::reset::{ResetOrchestrator, ResetScope, ResetStage};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_populated_model(server: &MockServer) {
    mount_list(
        server,
        &facts("/set_rules"),
        json!([{"user_set": "us1", "permission": "invoice:read", "resource_set": "rs1"}]),
    )
    .await;
    // user set listed first on purpose: resource sets must still go first
    mount_list(
        server,
        &schema("/condition_sets"),
        json!([
            {"key": "us1", "name": "Users", "type": "userset", "conditions": {}},
            {"key": "rs1", "name": "Invoices", "type": "resourceset", "resource_id": "invoice", "conditions": {}}
        ]),
    )
    .await;
    mount_list(
        server,
        &schema("/roles"),
        json!([
            {"key": "admin", "name": "Admin"},
            {"key": "viewer", "name": "Viewer"},
            {"key": "editor", "name": "Editor"}
        ]),
    )
    .await;
    mount_list(
        server,
        &schema("/resources"),
        json!([
            {"key": "__user", "name": "User", "actions": {}},
            {"key": "invoice", "name": "Invoice", "actions": {"read": {"name": "Read"}}}
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_full_reset_deletes_in_dependency_order() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let admin = admin_for(&server);
    let summary = admin.reset(ResetScope::Full).await;

    let deleted = paths_with_method(&server, "DELETE").await;
    assert_eq!(
        deleted,
        vec![
            facts("/set_rules"),
            schema("/condition_sets/rs1"),
            schema("/condition_sets/us1"),
            schema("/resources/__user/attributes/groups"),
            schema("/roles/editor"),
            schema("/resources/invoice"),
            facts("/tenants/default"),
        ]
    );

    let stages: Vec<ResetStage> = summary.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, ResetScope::Full.stages());
    assert_eq!(summary.total_deleted(), 7);
    assert_eq!(summary.total_failed(), 0);
}

#[tokio::test]
async fn test_protected_keys_are_never_deleted() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let admin = admin_for(&server);
    let summary = admin.reset(ResetScope::Full).await;

    let deleted = paths_with_method(&server, "DELETE").await;
    for protected in ["/roles/admin", "/roles/viewer"] {
        assert!(!deleted.contains(&schema(protected)));
    }
    assert!(!deleted.iter().any(|p| p.ends_with("/resources/__user")));

    let skipped: usize = summary.stages.iter().map(|s| s.skipped).sum();
    assert_eq!(skipped, 3);
}

#[tokio::test]
async fn test_set_rule_delete_carries_triple() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    admin_for(&server).reset(ResetScope::Abac).await;

    let requests = requests_with_method(&server, "DELETE").await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!({"user_set": "us1", "permission": "invoice:read", "resource_set": "rs1"})
    );
    // ABAC reset stops after the user attribute
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_not_found_counts_as_deleted_and_failures_do_not_abort() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .and(path(schema("/roles/editor")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let summary = admin_for(&server).reset(ResetScope::Full).await;

    assert_eq!(summary.total_failed(), 1);
    assert_eq!(summary.total_deleted(), 6);
    let last = summary.stages.last().unwrap();
    assert_eq!(last.stage, ResetStage::Tenant);
    assert_eq!(last.deleted, 1);
}

#[tokio::test]
async fn test_partial_scopes() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let admin = admin_for(&server);
    admin.reset(ResetScope::Roles).await;
    assert_eq!(paths_with_method(&server, "DELETE").await, vec![schema("/roles/editor")]);

    server.reset().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    admin.reset(ResetScope::Resources).await;
    assert_eq!(
        paths_with_method(&server, "DELETE").await,
        vec![schema("/resources/invoice")]
    );
}

#[tokio::test]
async fn test_unlistable_collections_count_as_failed_stages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let summary = admin_for(&server).reset(ResetScope::Full).await;

    // only the fixed attribute and the tenant need no listing
    assert_eq!(
        paths_with_method(&server, "DELETE").await,
        vec![
            schema("/resources/__user/attributes/groups"),
            facts("/tenants/default"),
        ]
    );
    assert_eq!(summary.total_deleted(), 2);
    assert_eq!(summary.total_failed(), 4);
    for stage in &summary.stages {
        let expected = match stage.stage {
            ResetStage::UserAttributes | ResetStage::Tenant => 0,
            _ => 1,
        };
        assert_eq!(stage.failed, expected, "stage {}", stage.stage);
    }
}

#[tokio::test]
async fn test_custom_user_attribute_is_removed_instead_of_groups() {
    let server = MockServer::start().await;
    mount_populated_model(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let admin = admin_for(&server);
    let summary = ResetOrchestrator::new(admin.client())
        .with_user_attribute("department")
        .run(ResetScope::Abac)
        .await;

    let deleted = paths_with_method(&server, "DELETE").await;
    assert!(deleted.contains(&schema("/resources/__user/attributes/department")));
    assert!(!deleted.contains(&schema("/resources/__user/attributes/groups")));
    assert_eq!(summary.total_failed(), 0);
}

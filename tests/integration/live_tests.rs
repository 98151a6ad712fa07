//! Read-only checks against a real platform account.

use sg_cli::api::types::Scope;
use sg_cli::api::{ApiClient, PlatformApi};
use sg_cli::config::Config;

fn live_scope() -> Option<(ApiClient, Scope)> {
    let org = std::env::var("SG_TEST_ORG").ok()?;
    let group = std::env::var("SG_TEST_WORKFLOW_GROUP").ok()?;
    let config = Config::load(None).ok()?;
    config.require_token().ok()?;
    let client = ApiClient::new(&config).ok()?;
    Some((client, Scope::new(org, group)))
}

#[tokio::test]
async fn test_live_list_workflows() {
    let Some((client, scope)) = live_scope() else {
        eprintln!("Skipping: SG_API_TOKEN, SG_TEST_ORG or SG_TEST_WORKFLOW_GROUP not set");
        return;
    };

    let response = client.list_workflows(&scope).await.unwrap();
    assert!(response.is_null() || response.get("msg").is_some());
}

#[tokio::test]
async fn test_live_unknown_workflow_is_an_api_error() {
    let Some((client, scope)) = live_scope() else {
        eprintln!("Skipping: SG_API_TOKEN, SG_TEST_ORG or SG_TEST_WORKFLOW_GROUP not set");
        return;
    };

    let err = client
        .get_workflow(&scope, "sg-cli-live-test-does-not-exist")
        .await
        .unwrap_err();
    assert_eq!(
        sg_cli::errors::get_exit_code(&err),
        sg_cli::errors::EXIT_API_ERROR
    );
}

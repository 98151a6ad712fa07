//! Unit tests for the API module
//!
//! Tests cover:
//! - URL building and segment escaping
//! - Status classification
//! - Request body helpers
//! - Retry configuration

use reqwest::StatusCode;
use serde_json::json;
use sg_cli::api::types::{stack_run_body, workflow_run_body, RunAction, Scope};
use sg_cli::api::{api_url, classify_status, parse_body, ApiClient, PlatformApi, RetryConfig};
use sg_cli::config::Config;
use sg_cli::errors::{get_exit_code, is_conflict_error, ApiError, EXIT_CONFIG_ERROR};

mod url_tests {
    use super::*;

    #[test]
    fn test_workflow_url() {
        let url = api_url(
            "https://api.app.stackguardian.io",
            &["orgs", "acme", "wfgrps", "platform", "wfs", "network"],
            true,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.app.stackguardian.io/api/v1/orgs/acme/wfgrps/platform/wfs/network/"
        );
    }

    #[test]
    fn test_space_in_identifier_is_escaped() {
        let url = api_url("https://api.example.test", &["orgs", "my org"], false).unwrap();
        assert_eq!(url.path(), "/api/v1/orgs/my%20org");
    }
}

mod status_tests {
    use super::*;

    #[test]
    fn test_not_unique_is_conflict() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            r#"{"msg": "Workflow name not unique"}"#,
        );
        let err: anyhow::Error = err.into();
        assert!(is_conflict_error(&err));
    }

    #[test]
    fn test_server_error_is_http_status() {
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::HttpStatus { status: 500, .. }
        ));
    }

    #[test]
    fn test_unprocessable_is_not_conflict() {
        let err: anyhow::Error =
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, r#"{"msg": "bad field"}"#).into();
        assert!(!is_conflict_error(&err));
    }

    #[test]
    fn test_parse_body_variants() {
        assert!(parse_body("").is_null());
        assert_eq!(parse_body("[1]"), json!([1]));
    }
}

mod body_tests {
    use super::*;

    #[test]
    fn test_run_bodies() {
        assert_eq!(
            workflow_run_body(RunAction::Destroy),
            json!({"TerraformAction": {"action": "destroy"}})
        );
        assert_eq!(stack_run_body(RunAction::Apply), json!({"ActionType": "apply"}));
    }
}

mod client_tests {
    use super::*;

    #[test]
    fn test_retry_config_backoff_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_ms(1), 500);
        assert_eq!(config.backoff_ms(10), config.max_delay_ms);
    }

    #[test]
    fn test_client_without_token_fails_with_config_error() {
        let client = ApiClient::new(&Config::default())
            .unwrap()
            .with_retry_config(RetryConfig {
                max_retries: 0,
                ..Default::default()
            });
        let err = tokio_test::block_on(client.list_workflows(&Scope::new("acme", "platform")))
            .unwrap_err();
        assert_eq!(get_exit_code(&err), EXIT_CONFIG_ERROR);
    }
}

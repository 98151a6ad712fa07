//! Request and response shapes for the platform REST API.
//!
//! Payloads are kept as `serde_json::Value`; only the few fields the CLI
//! reads or builds itself are typed here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The organization and workflow group every request is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub org: String,
    pub workflow_group: String,
}

impl Scope {
    pub fn new(org: impl Into<String>, workflow_group: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            workflow_group: workflow_group.into(),
        }
    }

    /// Same org, different workflow group.
    pub fn with_workflow_group(&self, workflow_group: impl Into<String>) -> Self {
        Self {
            org: self.org.clone(),
            workflow_group: workflow_group.into(),
        }
    }
}

/// Terraform action triggered on a workflow or stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunAction {
    Apply,
    Destroy,
}

impl fmt::Display for RunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunAction::Apply => write!(f, "apply"),
            RunAction::Destroy => write!(f, "destroy"),
        }
    }
}

/// Body of a workflow run that only carries a Terraform action.
pub fn workflow_run_body(action: RunAction) -> Value {
    json!({ "TerraformAction": { "action": action } })
}

/// Body of a stack run.
pub fn stack_run_body(action: RunAction) -> Value {
    json!({ "ActionType": action })
}

/// Stack statuses after which a deployment no longer changes on its own.
pub const SETTLED_STACK_STATUSES: [&str; 3] = ["ERRORED", "COMPLETED", "APPROVAL_REQUIRED"];

/// `msg.LatestWfStatus` of a stack read response.
pub fn stack_status(response: &Value) -> Option<&str> {
    response.get("msg")?.get("LatestWfStatus")?.as_str()
}

/// Response of the `tfstate_upload_url` endpoint; `msg` holds the presigned URL.
#[derive(Debug, Clone, Deserialize)]
pub struct TfStateUploadUrl {
    pub msg: String,
}

/// One entry of a workflow listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowSummary {
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of the workflow listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowListing {
    #[serde(default)]
    pub msg: Vec<WorkflowSummary>,
}

//! Payload loading
//!
//! Reads resource definitions from disk, applies `--patch-payload` and
//! splits bulk workflow files into per-workflow request bodies.

use crate::errors::{PayloadError, SgError};
use crate::patch::{json_kind, patch_document};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the CLI-only section inside a bulk workflow entry.
pub const CLI_CONFIGURATION_KEY: &str = "CLIConfiguration";

/// Read a payload file as UTF-8 text.
pub async fn read_payload(path: &Path) -> Result<String, PayloadError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Read payload {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

/// Turn raw payload text into a request body, patching it when a patch is given.
///
/// The result always has an object at its root.
pub fn prepare(raw: &str, patch: Option<&str>) -> Result<Value, SgError> {
    match patch {
        Some(patch) => Ok(patch_document(raw, patch)?),
        None => {
            let value: Value = serde_json::from_str(raw).map_err(|e| {
                PayloadError::Invalid(format!("payload is not valid JSON: {}", e))
            })?;
            if !value.is_object() {
                return Err(PayloadError::Invalid(format!(
                    "payload must be a JSON object, found {}",
                    json_kind(&value)
                ))
                .into());
            }
            Ok(value)
        }
    }
}

/// The non-empty `ResourceName` of a payload. `kind` names the resource in
/// the error ("Workflow", "Stack").
pub fn resource_name<'a>(body: &'a Value, kind: &'static str) -> Result<&'a str, PayloadError> {
    body.get("ResourceName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(PayloadError::MissingResourceName { kind })
}

/// Set the `RunOnCreate` flag of a stack body.
pub fn with_run_on_create(body: &mut Value, run: bool) {
    if let Value::Object(map) = body {
        map.insert("RunOnCreate".to_string(), Value::Bool(run));
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WorkflowGroupRef {
    #[serde(default)]
    pub name: String,
}

/// CLI-only settings carried by each entry of a bulk payload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CliConfiguration {
    #[serde(rename = "WorkflowGroup", default)]
    pub workflow_group: WorkflowGroupRef,
    #[serde(rename = "TfStateFilePath", default)]
    pub tf_state_file_path: String,
}

impl CliConfiguration {
    /// Workflow group override, if one is set.
    pub fn workflow_group_name(&self) -> Option<&str> {
        Some(self.workflow_group.name.as_str()).filter(|n| !n.is_empty())
    }

    /// Terraform state file to upload, if one is set.
    pub fn tf_state_path(&self) -> Option<PathBuf> {
        Some(self.tf_state_file_path.as_str())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// One workflow of a bulk payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWorkflowEntry {
    /// Request body, without the `CLIConfiguration` section.
    pub body: Value,
    pub cli_configuration: CliConfiguration,
}

/// Split a bulk payload (a JSON array of workflow objects) into entries.
pub fn split_bulk(raw: &str) -> Result<Vec<BulkWorkflowEntry>, PayloadError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        PayloadError::Invalid(format!(
            "Bulk payload should be an array of objects; {}",
            e
        ))
    })?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(PayloadError::Invalid(format!(
                "Bulk payload should be an array of objects, found {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut map = match item {
                Value::Object(map) => map,
                other => {
                    return Err(PayloadError::Invalid(format!(
                        "bulk entry {} must be an object, found {}",
                        index,
                        json_kind(&other)
                    )))
                }
            };
            let cli_configuration = match map.remove(CLI_CONFIGURATION_KEY) {
                None | Some(Value::Null) => CliConfiguration::default(),
                Some(section) => serde_json::from_value(section).map_err(|e| {
                    PayloadError::Invalid(format!(
                        "bulk entry {} has an invalid {}: {}",
                        index, CLI_CONFIGURATION_KEY, e
                    ))
                })?,
            };
            Ok(BulkWorkflowEntry {
                body: Value::Object(map),
                cli_configuration,
            })
        })
        .collect()
}

use super::{CommandContext, CreateOptions};
use crate::api::types::{workflow_run_body, RunAction, Scope, WorkflowListing};
use crate::errors::{is_conflict_error, ApiError};
use crate::output::workflow_run_url;
use crate::payload::{self, BulkWorkflowEntry};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// `workflow create`
pub async fn create<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    opts: &CreateOptions,
) -> Result<()> {
    let raw = payload::read_payload(&opts.payload).await?;
    if opts.bulk {
        create_bulk(ctx, scope, &raw, opts).await
    } else {
        create_single(ctx, scope, &raw, opts).await
    }
}

async fn create_single<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    raw: &str,
    opts: &CreateOptions,
) -> Result<()> {
    let body = payload::prepare(raw, opts.patch_payload.as_deref())?;
    let name = payload::resource_name(&body, "Workflow")?.to_string();

    if !ctx.preview_gate(&body, opts.flags)? {
        return Ok(());
    }

    if opts.run {
        let response = ctx
            .api
            .create_workflow_run(scope, &name, &body)
            .await
            .context("Failed to create workflow run")?;
        ctx.printer.response(&response, opts.output_json)?;
        ctx.printer.success("Workflow run created successfully.")?;
        let url = workflow_run_url(&ctx.dashboard_url, scope, &name);
        ctx.printer.run_link(&url)?;
    } else {
        let response = ctx
            .api
            .create_workflow(scope, &body)
            .await
            .context("Failed to create workflow")?;
        ctx.printer.response(&response, opts.output_json)?;
        ctx.printer.success("Workflow created successfully.")?;
    }
    Ok(())
}

async fn create_bulk<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    raw: &str,
    opts: &CreateOptions,
) -> Result<()> {
    if opts.patch_payload.is_some() {
        warn!("--patch-payload is ignored together with --bulk");
    }

    let entries = payload::split_bulk(raw)?;
    let total = entries.len();
    let mut failed = 0usize;

    for entry in entries {
        if let Err(e) = create_bulk_entry(ctx, scope, entry, opts).await {
            failed += 1;
            ctx.printer.failure(&format!("{:#}", e))?;
            ctx.printer.blank()?;
        }
    }

    info!("Bulk create finished: {} of {} failed", failed, total);
    if failed > 0 {
        bail!("{} of {} workflows failed", failed, total);
    }
    Ok(())
}

async fn create_bulk_entry<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    default_scope: &Scope,
    entry: BulkWorkflowEntry,
    opts: &CreateOptions,
) -> Result<()> {
    let name = payload::resource_name(&entry.body, "Workflow")
        .map_err(|e| anyhow::anyhow!("{}, skipping", e))?
        .to_string();
    ctx.printer.notice(&format!("Processing workflow: {}", name))?;

    if !ctx.preview_gate(&entry.body, opts.flags)? {
        return Ok(());
    }

    let scope = match entry.cli_configuration.workflow_group_name() {
        Some(group) => default_scope.with_workflow_group(group),
        None => default_scope.clone(),
    };

    let created = match ctx.api.create_workflow(&scope, &entry.body).await {
        Ok(response) => {
            ctx.printer.response(&response, opts.output_json)?;
            ctx.printer.success("Workflow created successfully.")?;
            true
        }
        Err(e) if is_conflict_error(&e) => {
            ctx.printer.line("Workflow already exists, updating instead...")?;
            let response = ctx
                .api
                .update_workflow(&scope, &name, &entry.body)
                .await
                .with_context(|| {
                    format!("Updating workflow failed for resource name: {}", name)
                })?;
            ctx.printer.response(&response, opts.output_json)?;
            ctx.printer.success("Workflow updated successfully.")?;
            false
        }
        Err(e) => {
            return Err(e.context(format!(
                "Processing workflow failed for resource name: {}",
                name
            )))
        }
    };

    let upload = match entry.cli_configuration.tf_state_path() {
        Some(path) => {
            ctx.printer.notice("Attempting to upload state file..")?;
            upload_state(ctx, &scope, &name, &path)
                .await
                .with_context(|| format!("Failed to upload state file for workflow: {}", name))
        }
        None => {
            ctx.printer.notice(&format!(
                "TfStateFilePath is not provided for workflow: {}, skipping upload of state file",
                name
            ))?;
            Ok(())
        }
    };

    if created && opts.run {
        start_run_after_create(ctx, &scope, &name, &entry.body, opts.output_json).await?;
    }

    upload
}

async fn start_run_after_create<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    name: &str,
    body: &Value,
    output_json: bool,
) -> Result<()> {
    let response = ctx
        .api
        .create_workflow_run(scope, name, body)
        .await
        .with_context(|| format!("Failed to create workflow run for: {}", name))?;
    ctx.printer.response(&response, output_json)?;
    ctx.printer.success("Workflow run created successfully.")?;
    let url = workflow_run_url(&ctx.dashboard_url, scope, name);
    ctx.printer.run_link(&url)?;
    ctx.printer.blank()?;
    Ok(())
}

/// Read a Terraform state file and PUT it to the workflow's presigned upload URL.
async fn upload_state<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    name: &str,
    path: &Path,
) -> Result<()> {
    let state = tokio::fs::read(path).await.with_context(|| {
        format!(
            "Failed to access state file: {}. Please check if the state file exists and is accessible",
            path.display()
        )
    })?;

    let upload_url = ctx
        .api
        .tfstate_upload_url(scope, name)
        .await
        .with_context(|| format!("Failed to get tfstate upload url for workflow: {}", name))?;

    ctx.printer.notice("Uploading state file..")?;
    ctx.api.upload_tfstate(&upload_url, state).await?;
    ctx.printer.notice("State file uploaded successfully.")?;
    Ok(())
}

/// `workflow apply` and `workflow destroy`
pub async fn run<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    workflow: &str,
    action: RunAction,
    output_json: bool,
) -> Result<()> {
    let response = ctx
        .api
        .create_workflow_run(scope, workflow, &workflow_run_body(action))
        .await?;
    ctx.printer.response(&response, output_json)?;
    ctx.printer.success(&format!("Workflow {} run successfully.", action))?;
    let url = workflow_run_url(&ctx.dashboard_url, scope, workflow);
    ctx.printer.run_link(&url)?;
    Ok(())
}

/// `workflow delete`
pub async fn delete<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    workflow: &str,
    output_json: bool,
) -> Result<()> {
    let response = ctx.api.delete_workflow(scope, workflow).await?;
    ctx.printer.response(&response, output_json)?;
    ctx.printer.success("Workflow deleted successfully.")?;
    Ok(())
}

/// `workflow read`
pub async fn read<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    workflow: &str,
) -> Result<()> {
    let response = ctx.api.get_workflow(scope, workflow).await?;
    ctx.printer.json(&response)?;
    Ok(())
}

/// `workflow list`
pub async fn list<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    output_json: bool,
) -> Result<()> {
    let response = ctx.api.list_workflows(scope).await?;
    ctx.printer.response(&response, output_json)?;

    let listing: WorkflowListing = match response {
        Value::Null => WorkflowListing::default(),
        other => serde_json::from_value(other)
            .map_err(|e| ApiError::Parse(format!("workflow listing: {}", e)))?,
    };
    ctx.printer.workflow_listing(&listing)?;
    Ok(())
}

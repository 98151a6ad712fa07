use super::{CommandContext, CreateOptions};
use crate::api::types::{stack_status, RunAction, Scope, SETTLED_STACK_STATUSES};
use crate::output::stack_run_url;
use crate::payload;
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::time::Instant;
use tracing::debug;

/// `stack create`. `--run` maps to `RunOnCreate` in the body and the query;
/// `--wait` then polls the stack until its deployment settles.
pub async fn create<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    opts: &CreateOptions,
) -> Result<()> {
    let raw = payload::read_payload(&opts.payload).await?;
    let mut body = payload::prepare(&raw, opts.patch_payload.as_deref())?;
    let name = payload::resource_name(&body, "Stack")?.to_string();
    payload::with_run_on_create(&mut body, opts.run);

    if !ctx.preview_gate(&body, opts.flags)? {
        return Ok(());
    }

    let response = ctx
        .api
        .create_stack(scope, &body, opts.run)
        .await
        .context("Failed to create stack")?;
    ctx.printer.response(&response, opts.output_json)?;
    ctx.printer.success("Stack created successfully.")?;

    if opts.wait {
        wait_for_stack(ctx, scope, &name).await?;
    }
    Ok(())
}

/// Poll `LatestWfStatus` until it is one of [`SETTLED_STACK_STATUSES`].
/// `ERRORED` fails the command; the other settled states succeed.
async fn wait_for_stack<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    stack: &str,
) -> Result<()> {
    let started = Instant::now();
    let status = loop {
        let response = ctx
            .api
            .get_stack(scope, stack)
            .await
            .with_context(|| format!("Failed to read status of stack: {}", stack))?;
        let status = stack_status(&response).unwrap_or_default().to_string();
        debug!("Stack {} status: {:?}", stack, status);
        if SETTLED_STACK_STATUSES.contains(&status.as_str()) {
            break status;
        }

        ctx.printer.notice("Stack under deployment")?;
        if started.elapsed() >= ctx.wait.timeout {
            bail!(
                "Timed out after {}s waiting for stack {} to finish",
                ctx.wait.timeout.as_secs(),
                stack
            );
        }
        tokio::time::sleep(ctx.wait.interval).await;
    };

    let url = stack_run_url(&ctx.dashboard_url, scope, stack);
    if status == "ERRORED" {
        ctx.printer.failure(&format!("Stack finished with {} status. Details: {}", status, url))?;
        bail!("Stack {} finished with {} status", stack, status);
    }
    ctx.printer.success(&format!("Stack finished with {} status.", status))?;
    ctx.printer.run_link(&url)?;
    Ok(())
}

/// `stack apply` and `stack destroy`
pub async fn run<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    stack: &str,
    action: RunAction,
    output_json: bool,
) -> Result<()> {
    let response = ctx.api.run_stack(scope, stack, action).await?;
    ctx.printer.response(&response, output_json)?;
    let url = stack_run_url(&ctx.dashboard_url, scope, stack);
    ctx.printer.run_link(&url)?;
    ctx.printer.success(&format!("Stack {} executed.", action))?;
    Ok(())
}

/// `stack outputs`
pub async fn outputs<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    stack: &str,
) -> Result<()> {
    let response = ctx.api.stack_outputs(scope, stack).await?;
    ctx.printer.json(&response)?;
    Ok(())
}

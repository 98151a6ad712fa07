use super::CommandContext;
use crate::api::types::Scope;
use anyhow::{bail, Result};
use serde_json::Value;
use std::io::Write;

/// `artifacts list`. An empty reply from the server means the workflow has
/// no artifacts.
pub async fn list<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    scope: &Scope,
    workflow: &str,
) -> Result<()> {
    let response = ctx.api.list_artifacts(scope, workflow).await?;
    if response == Value::Null {
        bail!("No artifacts found for this workflow");
    }
    ctx.printer.json(&response)?;
    Ok(())
}

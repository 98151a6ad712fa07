//! Output Control Module
//!
//! Everything a command prints goes through [`Printer`], so handlers can be
//! run against an in-memory buffer in tests:
//! - `line` / `blank`: plain text
//! - `json` / `preview`: four-space indented JSON
//! - `success` / `notice` / `failure`: status lines, colored when enabled;
//!   `failure` writes to the error sink
//! - `workflow_listing`: the human readable workflow list

use crate::api::types::{Scope, WorkflowListing};
use colored::*;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// Command output goes to `out`; `>> [ERROR]` lines go to `err`.
pub struct Printer<W: Write, E: Write = io::Stderr> {
    out: W,
    err: E,
    color: bool,
}

impl Printer<io::Stdout, io::Stderr> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), color)
    }
}

impl<W: Write, E: Write> Printer<W, E> {
    pub fn new(out: W, err: E, color: bool) -> Self {
        Self { out, err, color }
    }

    /// Consume the printer, returning the output and error sinks.
    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.out, "{}", text.as_ref())
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Pretty-print `value` with four-space indentation.
    pub fn json(&mut self, value: &Value) -> io::Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser).map_err(io::Error::other)?;
        self.out.write_all(&buf)?;
        writeln!(self.out)
    }

    /// Show the request body that is about to be sent.
    pub fn preview(&mut self, body: &Value) -> io::Result<()> {
        self.json(body)
    }

    /// Print an API response when `--output-json` was given.
    pub fn response(&mut self, value: &Value, output_json: bool) -> io::Result<()> {
        if output_json {
            self.json(value)?;
        }
        Ok(())
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", text.green())
        } else {
            writeln!(self.out, "{}", text)
        }
    }

    /// Progress line, prefixed with `>> `.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        let line = format!(">> {}", text);
        if self.color {
            writeln!(self.out, "{}", line.cyan())
        } else {
            writeln!(self.out, "{}", line)
        }
    }

    /// Error line on the error sink, prefixed with `>> [ERROR] `.
    pub fn failure(&mut self, text: &str) -> io::Result<()> {
        let line = format!(">> [ERROR] {}", text);
        if self.color {
            writeln!(self.err, "{}", line.red().bold())
        } else {
            writeln!(self.err, "{}", line)
        }
    }

    /// Print the link to the runs tab of a workflow or stack.
    pub fn run_link(&mut self, url: &str) -> io::Result<()> {
        self.line("To view the workflow run, please visit the following URL:")?;
        if self.color {
            writeln!(self.out, "{}", url.underline())
        } else {
            self.line(url)
        }
    }

    /// Print name and description of every workflow in a listing response.
    pub fn workflow_listing(&mut self, listing: &WorkflowListing) -> io::Result<()> {
        for workflow in &listing.msg {
            let name = workflow.resource_name.as_deref().unwrap_or_default();
            let description = workflow.description.as_deref().unwrap_or_default();
            if self.color {
                writeln!(self.out, "> Workflow Name: {}", name.bold())?;
            } else {
                writeln!(self.out, "> Workflow Name: {}", name)?;
            }
            writeln!(self.out, "Description: {}", description)?;
            self.blank()?;
        }
        Ok(())
    }
}

/// Dashboard URL of the runs tab of a workflow.
pub fn workflow_run_url(dashboard: &str, scope: &Scope, workflow: &str) -> String {
    format!(
        "{}/orgs/{}/wfgrps/{}/wfs/{}?tab=runs",
        dashboard.trim_end_matches('/'),
        scope.org,
        scope.workflow_group,
        workflow
    )
}

/// Dashboard URL of the runs tab of a stack.
pub fn stack_run_url(dashboard: &str, scope: &Scope, stack: &str) -> String {
    format!(
        "{}/orgs/{}/wfgrps/{}/stacks/{}?tab=runs",
        dashboard.trim_end_matches('/'),
        scope.org,
        scope.workflow_group,
        stack
    )
}

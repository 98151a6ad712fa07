//! Command handlers
//!
//! One function per CLI operation. Handlers talk to the platform through
//! [`PlatformApi`] and print through [`Printer`], so every flow can be run
//! against the mock client and an in-memory buffer.

use crate::api::PlatformApi;
use crate::config::WaitSettings;
use crate::output::Printer;
use anyhow::Result;
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

pub mod artifacts;
pub mod stack;
pub mod workflow;

/// Shared state of a single CLI invocation.
pub struct CommandContext<'a, W: Write, E: Write = io::Stderr> {
    pub api: &'a dyn PlatformApi,
    pub printer: Printer<W, E>,
    pub dashboard_url: String,
    pub wait: WaitPolicy,
}

impl<'a, W: Write, E: Write> CommandContext<'a, W, E> {
    pub fn new(
        api: &'a dyn PlatformApi,
        printer: Printer<W, E>,
        dashboard_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            printer,
            dashboard_url: dashboard_url.into(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Print the request body for `--preview` and `--dry-run`.
    ///
    /// Returns `false` when the caller must stop before sending anything.
    pub(crate) fn preview_gate(&mut self, body: &Value, flags: PreviewFlags) -> Result<bool> {
        if flags.dry_run || flags.preview {
            self.printer.preview(body)?;
        }
        Ok(!flags.dry_run)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewFlags {
    /// Print the body and continue.
    pub preview: bool,
    /// Print the body and stop.
    pub dry_run: bool,
}

/// How `stack create --wait` polls the stack status.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_settings(&WaitSettings::default())
    }
}

impl WaitPolicy {
    pub fn from_settings(settings: &WaitSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.poll_interval_secs),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Options of the `create` commands.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub payload: PathBuf,
    pub patch_payload: Option<String>,
    pub flags: PreviewFlags,
    pub run: bool,
    pub bulk: bool,
    pub output_json: bool,
    /// `stack create` only: poll until the stack deployment settles.
    pub wait: bool,
}

//! sg-cli - manage workflows and stacks on the StackGuardian platform.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::api::types::{RunAction, Scope};
use crate::api::ApiClient;
use crate::commands::{self, CommandContext, CreateOptions, PreviewFlags, WaitPolicy};
use crate::config::Config;
use crate::observability::telemetry::init_tracing;
use crate::output::Printer;

#[derive(Parser, Debug)]
#[command(name = "sg-cli")]
#[command(about = "sg-cli is CLI command for managing resources on StackGuardian platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Verbose mode (log API requests to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage workflows
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },

    /// Manage stacks
    Stack {
        #[command(subcommand)]
        command: StackCommand,
    },

    /// Manage workflow artifacts
    Artifacts {
        #[command(subcommand)]
        command: ArtifactsCommand,
    },
}

/// Organization and workflow group every command is addressed to.
#[derive(Args, Debug, Clone)]
struct ScopeArgs {
    /// The organization name on StackGuardian platform
    #[arg(long)]
    org: String,

    /// The workflow group under the organization
    #[arg(long = "workflow-group")]
    workflow_group: String,
}

impl ScopeArgs {
    fn to_scope(&self) -> Scope {
        Scope::new(self.org.as_str(), self.workflow_group.as_str())
    }
}

#[derive(Args, Debug, Clone)]
struct CreateArgs {
    /// Patch the payload: add or replace values. Requires valid JSON input
    #[arg(long, value_name = "JSON")]
    patch_payload: Option<String>,

    /// Print the payload before creating. Execution will not pause
    #[arg(long)]
    preview: bool,

    /// Print the payload and stop, nothing will be created
    #[arg(long)]
    dry_run: bool,

    /// Execute after creating
    #[arg(long)]
    run: bool,

    /// Print the API response as JSON
    #[arg(long)]
    output_json: bool,
}

impl CreateArgs {
    fn into_options(self, payload: PathBuf, bulk: bool) -> CreateOptions {
        CreateOptions {
            payload,
            patch_payload: self.patch_payload,
            flags: PreviewFlags {
                preview: self.preview,
                dry_run: self.dry_run,
            },
            run: self.run,
            bulk,
            output_json: self.output_json,
            wait: false,
        }
    }
}

#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Create new workflow
    Create {
        #[command(flatten)]
        scope: ScopeArgs,

        /// The payload JSON file that defines the workflow
        #[arg(long, value_name = "FILE")]
        payload: PathBuf,

        /// Import every workflow of an array payload; uploads state files and
        /// honours --run
        #[arg(long)]
        bulk: bool,

        #[command(flatten)]
        create: CreateArgs,
    },

    /// Delete the workflow from workflow group
    Delete {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        workflow_id: String,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Execute "Apply" on existing workflow
    Apply {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        workflow_id: String,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Execute "Destroy" on existing workflow
    Destroy {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        workflow_id: String,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Read, get details of a workflow
    Read {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        workflow_id: String,
    },

    /// List workflows
    List {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum StackCommand {
    /// Create new stack
    Create {
        #[command(flatten)]
        scope: ScopeArgs,

        /// The payload JSON file that defines the stack
        #[arg(value_name = "PAYLOAD")]
        payload: PathBuf,

        /// With --run, poll the stack until its deployment completes, errors
        /// or needs approval
        #[arg(long, requires = "run")]
        wait: bool,

        #[command(flatten)]
        create: CreateArgs,
    },

    /// Execute "Apply" on existing stack
    Apply {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        stack_id: String,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Execute "Destroy" on existing stack
    Destroy {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        stack_id: String,

        /// Print the API response as JSON
        #[arg(long)]
        output_json: bool,
    },

    /// Get outputs from stack
    Outputs {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        stack_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ArtifactsCommand {
    /// List artifacts of a workflow
    List {
        #[command(flatten)]
        scope: ScopeArgs,

        /// The workflow id in the workflow group
        #[arg(long)]
        workflow_id: String,

        /// Accepted for symmetry with other commands; artifacts are always printed as JSON
        #[arg(long)]
        output_json: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    debug!("Using API endpoint {}", config.base_url);

    let color = config.ui.color && !cli.no_color;
    if !color {
        colored::control::set_override(false);
    }

    let client = ApiClient::new(&config)?;
    let mut ctx = CommandContext::new(&client, Printer::stdout(color), config.dashboard_base())
        .with_wait(WaitPolicy::from_settings(&config.wait));
    dispatch(&mut ctx, cli.command).await
}

async fn dispatch<W: Write, E: Write>(
    ctx: &mut CommandContext<'_, W, E>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Workflow { command } => match command {
            WorkflowCommand::Create {
                scope,
                payload,
                bulk,
                create,
            } => {
                let opts = create.into_options(payload, bulk);
                commands::workflow::create(ctx, &scope.to_scope(), &opts).await
            }
            WorkflowCommand::Delete {
                scope,
                workflow_id,
                output_json,
            } => {
                commands::workflow::delete(ctx, &scope.to_scope(), &workflow_id, output_json).await
            }
            WorkflowCommand::Apply {
                scope,
                workflow_id,
                output_json,
            } => {
                commands::workflow::run(
                    ctx,
                    &scope.to_scope(),
                    &workflow_id,
                    RunAction::Apply,
                    output_json,
                )
                .await
            }
            WorkflowCommand::Destroy {
                scope,
                workflow_id,
                output_json,
            } => {
                commands::workflow::run(
                    ctx,
                    &scope.to_scope(),
                    &workflow_id,
                    RunAction::Destroy,
                    output_json,
                )
                .await
            }
            WorkflowCommand::Read { scope, workflow_id } => {
                commands::workflow::read(ctx, &scope.to_scope(), &workflow_id).await
            }
            WorkflowCommand::List { scope, output_json } => {
                commands::workflow::list(ctx, &scope.to_scope(), output_json).await
            }
        },

        Commands::Stack { command } => match command {
            StackCommand::Create {
                scope,
                payload,
                wait,
                create,
            } => {
                let opts = CreateOptions {
                    wait,
                    ..create.into_options(payload, false)
                };
                commands::stack::create(ctx, &scope.to_scope(), &opts).await
            }
            StackCommand::Apply {
                scope,
                stack_id,
                output_json,
            } => {
                commands::stack::run(
                    ctx,
                    &scope.to_scope(),
                    &stack_id,
                    RunAction::Apply,
                    output_json,
                )
                .await
            }
            StackCommand::Destroy {
                scope,
                stack_id,
                output_json,
            } => {
                commands::stack::run(
                    ctx,
                    &scope.to_scope(),
                    &stack_id,
                    RunAction::Destroy,
                    output_json,
                )
                .await
            }
            StackCommand::Outputs { scope, stack_id } => {
                commands::stack::outputs(ctx, &scope.to_scope(), &stack_id).await
            }
        },

        Commands::Artifacts { command } => match command {
            ArtifactsCommand::List {
                scope,
                workflow_id,
                output_json: _,
            } => commands::artifacts::list(ctx, &scope.to_scope(), &workflow_id).await,
        },
    }
}

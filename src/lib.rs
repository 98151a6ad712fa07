//! sg-cli - command line client for the StackGuardian orchestration platform
//!
//! Creates, runs and inspects workflows and stacks through the platform REST
//! API. Resource payloads are JSON files that can be adjusted on the command
//! line with `--patch-payload`, a patch-wins deep merge:
//!
//! - **Patch**: overlay a JSON fragment onto a payload before it is sent
//! - **Payload**: load single and bulk payloads, validate resource names
//! - **API**: async platform client with retry and a mockable trait
//! - **Commands**: one handler per CLI operation
//!
//! # Quick Start
//!
//! ```
//! let merged = sg_cli::patch::patch_json(
//!     r#"{"ResourceName": "vpc", "Tags": ["prod"]}"#,
//!     r#"{"Tags": ["dev"]}"#,
//! )?;
//! assert_eq!(merged, r#"{"ResourceName":"vpc","Tags":["dev"]}"#);
//! # Ok::<(), sg_cli::errors::PatchError>(())
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod observability;
pub mod output;
pub mod patch;
pub mod payload;

pub use config::Config;
pub use errors::{PatchError, SgError};
pub use patch::patch_json;

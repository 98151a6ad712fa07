use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The central error type for sg-cli.
///
/// Every layer (payload patching, payload loading, the platform API and
/// configuration) has its own enum; this one unifies them so the binary can
/// pick an exit code without string matching.
#[derive(Error, Debug)]
pub enum SgError {
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Which of the two inputs of a patch operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Base,
    Patch,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Base => write!(f, "base"),
            Document::Patch => write!(f, "patch"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{document} JSON is not valid, please verify the JSON input: {source}")]
    Parse {
        document: Document,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} JSON must be an object at the top level, found {found}")]
    Shape {
        document: Document,
        found: &'static str,
    },
}

impl PatchError {
    pub fn document(&self) -> Document {
        match self {
            PatchError::Parse { document, .. } | PatchError::Shape { document, .. } => *document,
        }
    }
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read payload file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid payload: {0}")]
    Invalid(String),

    #[error("{kind} ResourceName is required in object payload")]
    MissingResourceName { kind: &'static str },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("API returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Check whether an error reports that the resource already exists.
///
/// Bulk workflow creation uses this to fall back to an update.
pub fn is_conflict_error(e: &anyhow::Error) -> bool {
    if let Some(SgError::Api(ApiError::Conflict(_))) = e.downcast_ref::<SgError>() {
        return true;
    }
    matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Conflict(_)))
}

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_PAYLOAD_ERROR: u8 = 3;
pub const EXIT_API_ERROR: u8 = 4;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    if let Some(sg_err) = e.downcast_ref::<SgError>() {
        return match sg_err {
            SgError::Config(_) => EXIT_CONFIG_ERROR,
            SgError::Patch(_) | SgError::Payload(_) => EXIT_PAYLOAD_ERROR,
            SgError::Api(_) => EXIT_API_ERROR,
        };
    }

    if e.downcast_ref::<PatchError>().is_some() || e.downcast_ref::<PayloadError>().is_some() {
        return EXIT_PAYLOAD_ERROR;
    }
    if e.downcast_ref::<ApiError>().is_some() {
        return EXIT_API_ERROR;
    }

    // Fallback string matching only for cases where specific types aren't available
    let msg = e.to_string().to_lowercase();
    if msg.contains("config") {
        return EXIT_CONFIG_ERROR;
    } else if msg.contains("api error") || msg.contains("network") {
        return EXIT_API_ERROR;
    }

    EXIT_ERROR
}

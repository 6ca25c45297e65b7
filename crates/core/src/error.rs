use miette::Diagnostic;
use thiserror::Error;

pub type FurResult<T> = Result<T, FurError>;

/// Error taxonomy for the furball codec subsystem.
///
/// Everything here is fatal to the current read or write; the only path
/// that deliberately degrades instead of failing is the top-level asset
/// list of the furball reader, which stops at the first broken asset and
/// keeps what was decoded before it.
#[derive(Debug, Error, Diagnostic)]
pub enum FurError {
    #[error("malformed furball data: {0}")]
    #[diagnostic(code("fur.malformed"))]
    Malformed(String),

    #[error("unsupported container format version {found} (supported {minimum} through {latest})")]
    #[diagnostic(
        code("fur.unsupported_version"),
        help("re-save the container with a tool that writes a supported format version")
    )]
    UnsupportedVersion { found: u8, minimum: u8, latest: u8 },

    #[error("type '{type_name}' is outside its format-version window: got {provided}, supported {minimum} through {maximum}")]
    #[diagnostic(code("fur.version_window"))]
    VersionIncompatible {
        type_name: String,
        /// Format version the codec was constructed with.
        provided: u8,
        /// Inclusive lower bound.
        minimum: u8,
        /// Inclusive upper bound; 0 means unbounded.
        maximum: u8,
    },

    #[error("unknown serializable type: {0}")]
    #[diagnostic(code("fur.unknown_type"))]
    UnknownType(String),

    #[error("validation failed: {0}")]
    #[diagnostic(code("fur.validation"))]
    Validation(String),

    #[error("codec misuse: {0}")]
    #[diagnostic(code("fur.usage"))]
    Usage(String),

    #[error("at node {path}: {source}")]
    #[diagnostic(code("fur.scene_path"))]
    ScenePath {
        path: String,
        #[source]
        source: Box<FurError>,
    },

    #[error("io error: {0}")]
    #[diagnostic(code("fur.io"))]
    Io(#[from] std::io::Error),
}

impl FurError {
    /// Prepends a scene node key to the error's path, starting one when the
    /// error has none yet. Recursive decoders call this at every level so a
    /// deep failure surfaces as a root-to-node path instead of a bare
    /// location.
    pub fn at_node(self, key: &str) -> FurError {
        match self {
            FurError::ScenePath { path, source } => FurError::ScenePath {
                path: format!("{key}/{path}"),
                source,
            },
            other => FurError::ScenePath {
                path: key.to_string(),
                source: Box::new(other),
            },
        }
    }
}

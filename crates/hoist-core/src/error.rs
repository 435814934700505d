use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Resolution ──
    #[error(
        "unknown deployment type '{0}'; expected one of: {names}",
        names = crate::DeploymentKind::names().join(", ")
    )]
    UnknownDeploymentType(String),

    #[error("unsupported {field} '{value}'")]
    UnsupportedRuntime { field: &'static str, value: String },

    #[error("a container image is required when the operating system is docker")]
    MissingContainerImage,

    #[error("registry '{registry}' requires both a username and HOIST_REGISTRY_PASSWORD")]
    IncompleteRegistryCredentials { registry: String },

    #[error("cannot resolve region '{0}'")]
    UnresolvableRegion(String),

    #[error("unknown pricing tier '{0}'")]
    UnknownPricingTier(String),

    #[error(
        "invalid configuration:\n{}",
        format_violations(violations)
    )]
    InvalidConfiguration { violations: Vec<Violation> },

    // ── Project discovery ──
    #[error("build artifact not found at {0}")]
    ArtifactMissing(PathBuf),

    #[error("no jar found in {0}; build the project first or set [project].artifact")]
    NoArtifact(PathBuf),

    #[error(
        "multiple jars found: {}; set [project].artifact to select one",
        names.join(", ")
    )]
    MultipleArtifacts { names: Vec<String> },

    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A single problem found while validating user configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

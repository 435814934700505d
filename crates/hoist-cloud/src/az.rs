/// Flags whose values may carry secrets and are masked in error output.
const SENSITIVE_FLAGS: &[&str] = &[
    "--body",
    "--connection-string",
    "--settings",
    "--registry-password",
    "--container-registry-password",
];

/// Resource-level codes ARM uses for a missing resource, plus the HTTP 404
/// reason `az rest` prints before the response body.
const NOT_FOUND_MARKERS: &[&str] = &[
    "(ResourceNotFound)",
    "(ResourceGroupNotFound)",
    "\"ResourceNotFound\"",
    "\"ResourceGroupNotFound\"",
    "Not Found(",
];

/// 404 codes that mean the request itself is wrong, not that the resource is absent.
const FATAL_NOT_FOUND_CODES: &[&str] = &["SubscriptionNotFound", "InvalidSubscriptionId"];

#[derive(Debug, thiserror::Error)]
pub enum AzError {
    #[error("Azure CLI (az) not found (install: https://learn.microsoft.com/cli/azure/install-azure-cli)")]
    NotFound { source: std::io::Error },

    #[error("az command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("az output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },
}

impl AzError {
    pub fn command_failed(args: &[String], stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            args: redact_args(args),
            stderr: stderr.into(),
        }
    }

    /// Whether the remote side answered "resource does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => {
                NOT_FOUND_MARKERS.iter().any(|marker| stderr.contains(marker))
                    && !FATAL_NOT_FOUND_CODES.iter().any(|code| stderr.contains(code))
            }
            Self::NotFound { .. } | Self::InvalidUtf8 { .. } => false,
        }
    }
}

/// Copy of `args` with the values of [`SENSITIVE_FLAGS`] masked.
pub fn redact_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("<redacted>".to_owned());
        } else {
            redacted.push(arg.clone());
        }
        mask_next = SENSITIVE_FLAGS.contains(&arg.as_str());
    }
    redacted
}

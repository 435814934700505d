use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Binding `type` as written in `function.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BindingKind {
    HttpTrigger,
    Http,
    TimerTrigger,
    QueueTrigger,
    Queue,
    BlobTrigger,
    Blob,
    EventHubTrigger,
    EventHub,
    ServiceBusTrigger,
    ServiceBus,
    CosmosDbTrigger,
    CosmosDb,
    Other(String),
}

impl BindingKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::HttpTrigger => "httpTrigger",
            Self::Http => "http",
            Self::TimerTrigger => "timerTrigger",
            Self::QueueTrigger => "queueTrigger",
            Self::Queue => "queue",
            Self::BlobTrigger => "blobTrigger",
            Self::Blob => "blob",
            Self::EventHubTrigger => "eventHubTrigger",
            Self::EventHub => "eventHub",
            Self::ServiceBusTrigger => "serviceBusTrigger",
            Self::ServiceBus => "serviceBus",
            Self::CosmosDbTrigger => "cosmosDBTrigger",
            Self::CosmosDb => "cosmosDB",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_trigger(&self) -> bool {
        self.as_str().ends_with("Trigger")
    }

    /// HTTP bindings are served by the host itself and need no extension.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::HttpTrigger | Self::Http)
    }
}

impl From<String> for BindingKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "httpTrigger" => Self::HttpTrigger,
            "http" => Self::Http,
            "timerTrigger" => Self::TimerTrigger,
            "queueTrigger" => Self::QueueTrigger,
            "queue" => Self::Queue,
            "blobTrigger" => Self::BlobTrigger,
            "blob" => Self::Blob,
            "eventHubTrigger" => Self::EventHubTrigger,
            "eventHub" => Self::EventHub,
            "serviceBusTrigger" => Self::ServiceBusTrigger,
            "serviceBus" => Self::ServiceBus,
            "cosmosDBTrigger" => Self::CosmosDbTrigger,
            "cosmosDB" => Self::CosmosDb,
            _ => Self::Other(raw),
        }
    }
}

impl From<BindingKind> for String {
    fn from(kind: BindingKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingDirection {
    In,
    Out,
    InOut,
}

/// One declarative input or output attached to a function.
///
/// Attributes beyond `type`, `direction` and `name` (e.g. `schedule`,
/// `authLevel`, `methods`) are kept verbatim and written in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: BindingKind,
    pub direction: BindingDirection,
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Binding {
    pub fn new(kind: BindingKind, direction: BindingDirection, name: &str) -> Self {
        Self {
            kind,
            direction,
            name: name.to_owned(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }
}

/// A trigger-bearing method found in the build artifact.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionEntryPoint {
    pub name: String,
    /// Fully qualified method, e.g. `com.example.Function.run`
    pub entry_point: String,
    #[serde(default, rename = "binding")]
    pub bindings: Vec<Binding>,
}

/// Contents of one `function.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfiguration {
    #[serde(skip)]
    pub name: String,
    pub script_file: String,
    pub entry_point: String,
    pub bindings: Vec<Binding>,
}

impl FunctionConfiguration {
    pub fn from_entry_point(entry: FunctionEntryPoint, script_file: &str) -> Self {
        Self {
            name: entry.name,
            script_file: script_file.to_owned(),
            entry_point: entry.entry_point,
            bindings: entry.bindings,
        }
    }

    /// Pretty-printed JSON with LF line endings and a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// `scriptFile` value for a function directory one level below the artifact.
pub fn script_file_for(artifact_file_name: &str) -> String {
    format!("../{artifact_file_name}")
}

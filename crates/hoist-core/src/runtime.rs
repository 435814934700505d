//! Runtime resolution: turns the loose `[runtime]` table into a
//! [`RuntimeDescriptor`] the provisioner can act on.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;

use crate::config::RuntimeConfig;
use crate::{Error, Result};

/// Hosting operating system of the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    #[default]
    Windows,
    Linux,
    Docker,
}

impl OperatingSystem {
    pub const ALL: [OperatingSystem; 3] = [Self::Windows, Self::Linux, Self::Docker];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Docker => "docker",
        }
    }

    /// Docker apps run on Linux workers but take their runtime from the image.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Docker)
    }

    /// Linux and Docker apps live on a "reserved" (Linux) plan.
    pub fn is_linux_host(self) -> bool {
        matches!(self, Self::Linux | Self::Docker)
    }
}

impl FromStr for OperatingSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "docker" => Ok(Self::Docker),
            _ => Err(Error::UnsupportedRuntime {
                field: "os",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JavaVersion {
    Java8,
    Java11,
    #[default]
    Java17,
    Java21,
}

impl JavaVersion {
    pub fn major(self) -> u32 {
        match self {
            Self::Java8 => 8,
            Self::Java11 => 11,
            Self::Java17 => 17,
            Self::Java21 => 21,
        }
    }

    /// Value used by Windows site config (`javaVersion`).
    pub fn windows_value(self) -> &'static str {
        match self {
            Self::Java8 => "1.8",
            Self::Java11 => "11",
            Self::Java17 => "17",
            Self::Java21 => "21",
        }
    }
}

impl FromStr for JavaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized
            .strip_prefix("java")
            // arch-lint: allow(no-silent-result-drop) reason="the java prefix is optional"
            .unwrap_or(&normalized)
            .trim_start_matches([' ', '-']);
        match normalized {
            "8" | "1.8" => Ok(Self::Java8),
            "11" => Ok(Self::Java11),
            "17" => Ok(Self::Java17),
            "21" => Ok(Self::Java21),
            _ => Err(Error::UnsupportedRuntime {
                field: "java_version",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Java {}", self.major())
    }
}

/// Web container hosting the jar/war (web-app flavor only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebContainer {
    JavaSe,
    Tomcat(String),
    JbossEap(String),
}

impl FromStr for WebContainer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, version) = match lower.split_once(' ') {
            Some((name, version)) => (name, version.trim()),
            None => (lower.as_str(), ""),
        };
        match (name, version) {
            ("javase" | "java", "" | "se") => Ok(Self::JavaSe),
            ("tomcat", v) if !v.is_empty() => Ok(Self::Tomcat(v.to_owned())),
            ("jbosseap", v) if !v.is_empty() => Ok(Self::JbossEap(v.to_owned())),
            _ => Err(Error::UnsupportedRuntime {
                field: "web_container",
                value: s.to_owned(),
            }),
        }
    }
}

impl WebContainer {
    /// `linuxFxVersion` for a web app, e.g. `JAVA|17-java17` or `TOMCAT|10.0-java17`.
    pub fn linux_fx_version(&self, version: JavaVersion) -> String {
        let major = version.major();
        let java = if major == 8 {
            "jre8".to_owned()
        } else {
            format!("java{major}")
        };
        match self {
            Self::JavaSe => format!("JAVA|{major}-{java}"),
            Self::Tomcat(v) => format!("TOMCAT|{v}-{java}"),
            Self::JbossEap(v) => format!("JBOSSEAP|{v}-{java}"),
        }
    }

    /// Value for the Windows `javaContainer` / `javaContainerVersion` pair.
    pub fn windows_container(&self) -> (&'static str, &str) {
        match self {
            Self::JavaSe => ("JAVA", "SE"),
            Self::Tomcat(v) => ("TOMCAT", v),
            Self::JbossEap(v) => ("JBOSSEAP", v),
        }
    }
}

/// Private registry credentials for a container image.
///
/// The password is held as a [`SecretString`] so it never shows up in
/// debug output or logs.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub server_url: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct ContainerImage {
    pub image: String,
    pub registry: Option<RegistryCredentials>,
}

#[derive(Debug, Clone)]
pub enum RuntimeStack {
    Java {
        version: JavaVersion,
        web_container: Option<WebContainer>,
    },
    Container(ContainerImage),
}

/// Canonical runtime of the app. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct RuntimeDescriptor {
    os: OperatingSystem,
    stack: RuntimeStack,
}

impl RuntimeDescriptor {
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    pub fn stack(&self) -> &RuntimeStack {
        &self.stack
    }

    pub fn java_version(&self) -> Option<JavaVersion> {
        match &self.stack {
            RuntimeStack::Java { version, .. } => Some(*version),
            RuntimeStack::Container(_) => None,
        }
    }

    pub fn container(&self) -> Option<&ContainerImage> {
        match &self.stack {
            RuntimeStack::Container(image) => Some(image),
            RuntimeStack::Java { .. } => None,
        }
    }
}

/// Resolve the `[runtime]` table into a [`RuntimeDescriptor`].
///
/// # Errors
///
/// - [`Error::UnsupportedRuntime`] for an unknown OS, Java version, or web container
/// - [`Error::MissingContainerImage`] when the OS is docker and no image is set
/// - [`Error::IncompleteRegistryCredentials`] when a private registry lacks credentials
pub fn resolve_runtime(config: &RuntimeConfig) -> Result<RuntimeDescriptor> {
    let os = match non_empty(config.os.as_deref()) {
        Some(raw) => raw.parse()?,
        None => OperatingSystem::default(),
    };

    let stack = if os.is_container() {
        RuntimeStack::Container(resolve_image(config)?)
    } else {
        let version = match non_empty(config.java_version.as_deref()) {
            Some(raw) => raw.parse()?,
            None => JavaVersion::default(),
        };
        let web_container = non_empty(config.web_container.as_deref())
            .map(str::parse)
            .transpose()?;
        RuntimeStack::Java {
            version,
            web_container,
        }
    };

    tracing::debug!(os = %os, ?stack, "resolved runtime");
    Ok(RuntimeDescriptor { os, stack })
}

fn resolve_image(config: &RuntimeConfig) -> Result<ContainerImage> {
    let image = non_empty(config.image.as_deref()).ok_or(Error::MissingContainerImage)?;

    let registry = match non_empty(config.registry_url.as_deref()) {
        None => None,
        Some(server_url) => {
            let username = non_empty(config.registry_username.as_deref());
            match (username, config.registry_password.clone()) {
                (Some(username), Some(password)) => Some(RegistryCredentials {
                    server_url: server_url.to_owned(),
                    username: username.to_owned(),
                    password,
                }),
                _ => {
                    return Err(Error::IncompleteRegistryCredentials {
                        registry: server_url.to_owned(),
                    });
                }
            }
        }
    };

    Ok(ContainerImage {
        image: image.to_owned(),
        registry,
    })
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

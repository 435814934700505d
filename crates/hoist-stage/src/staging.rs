//! Function staging: builds the directory layout the functions host expects.
//!
//! ```text
//! <staging>/
//!   host.json
//!   local.settings.json      (when present, never archived)
//!   <artifact>.jar
//!   lib/<dependency>.jar
//!   <FunctionName>/function.json
//! ```

use std::path::{Path, PathBuf};

use hoist_core::ProjectDescriptor;
use hoist_core::project::LOCAL_SETTINGS_JSON;

use crate::discovery::{DiscoveryError, EntryPointDiscovery};
use crate::extension::{
    ExtensionError, ExtensionInstaller, HOST_JSON, HostManifest, is_install_extension_needed,
};
use crate::function::{FunctionConfiguration, script_file_for};
use crate::validate::{ConfigurationValidator, ValidationError, validate_all};

pub const FUNCTION_JSON: &str = "function.json";
pub const LIB_DIR: &str = "lib";

/// The functions runtime provides its own annotation library.
const FUNCTION_LIBRARY_PREFIX: &str = "azure-functions-java-library";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// No entry points were discovered; nothing was written.
    NoFunctions,
    Staged {
        functions: Vec<String>,
        extensions_installed: bool,
    },
}

/// Turns discovered entry points into a staged function app.
pub struct FunctionMetadataGenerator<D, V, I> {
    discovery: D,
    validator: V,
    installer: I,
}

impl<D, V, I> FunctionMetadataGenerator<D, V, I>
where
    D: EntryPointDiscovery,
    V: ConfigurationValidator,
    I: ExtensionInstaller,
{
    pub fn new(discovery: D, validator: V, installer: I) -> Self {
        Self {
            discovery,
            validator,
            installer,
        }
    }

    /// Stage every discovered function into `staging_dir`.
    ///
    /// `staging_dir` must already exist (see [`prepare_staging_dir`]).
    /// A validation failure in any function aborts before anything is written.
    pub fn stage(
        &self,
        project: &ProjectDescriptor,
        staging_dir: &Path,
    ) -> Result<StageOutcome, StageError> {
        let entries = self
            .discovery
            .discover(&project.artifact)
            .map_err(|e| StageError::Discovery { source: e })?;
        if entries.is_empty() {
            tracing::info!("no functions found, nothing to stage");
            return Ok(StageOutcome::NoFunctions);
        }

        let script_file = script_file_for(&project.artifact_file_name());
        let configs: Vec<FunctionConfiguration> = entries
            .into_iter()
            .map(|entry| FunctionConfiguration::from_entry_point(entry, &script_file))
            .collect();

        let errors = validate_all(&self.validator, &configs);
        if !errors.is_empty() {
            return Err(StageError::Validation(errors));
        }

        copy_host_files(&project.base_dir, staging_dir)?;

        for config in &configs {
            write_function_json(staging_dir, config)?;
        }

        copy_dependencies(&project.dependencies, &staging_dir.join(LIB_DIR))?;
        copy_file(
            &project.artifact,
            &staging_dir.join(project.artifact_file_name()),
        )?;

        let host = HostManifest::load(&staging_dir.join(HOST_JSON))
            .map_err(|e| StageError::Extension { source: e })?;
        let bindings = configs
            .iter()
            .flat_map(|c| c.bindings.iter().map(|b| &b.kind));
        let extensions_installed = is_install_extension_needed(&host, bindings);
        if extensions_installed {
            self.installer
                .install(staging_dir, &project.base_dir)
                .map_err(|e| StageError::Extension { source: e })?;
        }

        let functions: Vec<String> = configs.into_iter().map(|c| c.name).collect();
        tracing::info!(
            staging = %staging_dir.display(),
            functions = functions.len(),
            extensions_installed,
            "functions staged"
        );
        Ok(StageOutcome::Staged {
            functions,
            extensions_installed,
        })
    }
}

/// Empty (or create) the staging directory.
pub fn prepare_staging_dir(staging_dir: &Path) -> Result<(), StageError> {
    if staging_dir.exists() {
        std::fs::remove_dir_all(staging_dir).map_err(|e| StageError::Cleanup {
            path: staging_dir.to_path_buf(),
            source: e,
        })?;
    }
    create_dir(staging_dir)
}

/// Stage a web app: the artifact is copied to the root as `app.jar` (or
/// `ROOT.war` for servlet containers).
pub fn stage_web_app(
    project: &ProjectDescriptor,
    staging_dir: &Path,
) -> Result<PathBuf, StageError> {
    let is_war = project
        .artifact
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("war"));
    let dest = staging_dir.join(if is_war { "ROOT.war" } else { "app.jar" });
    copy_file(&project.artifact, &dest)?;
    Ok(dest)
}

fn copy_host_files(base_dir: &Path, staging_dir: &Path) -> Result<(), StageError> {
    let host_json = base_dir.join(HOST_JSON);
    if !host_json.is_file() {
        return Err(StageError::MissingHostJson(host_json));
    }
    copy_file(&host_json, &staging_dir.join(HOST_JSON))?;

    let local_settings = base_dir.join(LOCAL_SETTINGS_JSON);
    if local_settings.is_file() {
        copy_file(&local_settings, &staging_dir.join(LOCAL_SETTINGS_JSON))?;
    } else {
        tracing::debug!(path = %local_settings.display(), "no local settings to copy");
    }
    Ok(())
}

fn write_function_json(
    staging_dir: &Path,
    config: &FunctionConfiguration,
) -> Result<(), StageError> {
    let dir = staging_dir.join(&config.name);
    create_dir(&dir)?;

    let json = config.to_json().map_err(|e| StageError::Serialize {
        function: config.name.clone(),
        source: e,
    })?;
    let path = dir.join(FUNCTION_JSON);
    std::fs::write(&path, json).map_err(|e| StageError::Write { path, source: e })
}

fn copy_dependencies(dependencies: &[PathBuf], lib_dir: &Path) -> Result<(), StageError> {
    create_dir(lib_dir)?;
    for dep in dependencies {
        let Some(name) = dep.file_name() else {
            continue;
        };
        if name.to_string_lossy().starts_with(FUNCTION_LIBRARY_PREFIX) {
            tracing::debug!(jar = %dep.display(), "skipping functions runtime library");
            continue;
        }
        copy_file(dep, &lib_dir.join(name))?;
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), StageError> {
    std::fs::copy(src, dst).map_err(|e| StageError::CopyFile {
        path: src.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), StageError> {
    std::fs::create_dir_all(path).map_err(|e| StageError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("entry point discovery failed")]
    Discovery { source: DiscoveryError },
    #[error(
        "invalid function configuration:\n{}",
        .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
    )]
    Validation(Vec<ValidationError>),
    #[error("host.json not found at {0}")]
    MissingHostJson(PathBuf),
    #[error("failed to clean up staging directory {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize function.json for {function}")]
    Serialize {
        function: String,
        source: serde_json::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("extension install step failed")]
    Extension { source: ExtensionError },
}

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// Developer-only settings file; staged for local runs, never published.
pub const LOCAL_SETTINGS_JSON: &str = "local.settings.json";

/// Build outputs handed over by the build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub base_dir: PathBuf,
    /// Primary artifact (the application jar)
    pub artifact: PathBuf,
    /// Dependency jars, sorted by file name
    pub dependencies: Vec<PathBuf>,
}

impl ProjectDescriptor {
    /// Resolve the project layout below `base_dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArtifactMissing`](crate::Error::ArtifactMissing) if a configured artifact does not exist
    /// - [`Error::NoArtifact`](crate::Error::NoArtifact) / [`Error::MultipleArtifacts`](crate::Error::MultipleArtifacts)
    ///   when the artifact must be guessed from `target/`
    pub fn discover(base_dir: &Path, config: &ProjectConfig) -> crate::Result<Self> {
        let artifact = match &config.artifact {
            Some(path) => {
                let path = base_dir.join(path);
                if !path.is_file() {
                    return Err(crate::Error::ArtifactMissing(path));
                }
                path
            }
            None => find_single_artifact(&base_dir.join("target"))?,
        };

        let dependencies_dir = base_dir.join(&config.dependencies);
        let dependencies = if dependencies_dir.is_dir() {
            list_jars(&dependencies_dir)?
        } else {
            tracing::debug!(dir = %dependencies_dir.display(), "no dependency directory");
            Vec::new()
        };

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            artifact,
            dependencies,
        })
    }

    /// File name of the primary artifact, e.g. `my-app-1.0.jar`.
    pub fn artifact_file_name(&self) -> String {
        self.artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            // arch-lint: allow(no-silent-result-drop) reason="artifact paths always end in a file name"
            .unwrap_or_default()
    }
}

fn find_single_artifact(target_dir: &Path) -> crate::Result<PathBuf> {
    if !target_dir.is_dir() {
        return Err(crate::Error::NoArtifact(target_dir.to_path_buf()));
    }

    let mut jars: Vec<PathBuf> = list_jars(target_dir)?
        .into_iter()
        .filter(|p| {
            // arch-lint: allow(no-silent-result-drop) reason="walked entries always have a file name"
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !name.ends_with("-sources.jar")
                && !name.ends_with("-javadoc.jar")
                && !name.ends_with("-tests.jar")
        })
        .collect();

    match jars.len() {
        0 => Err(crate::Error::NoArtifact(target_dir.to_path_buf())),
        1 => Ok(jars.remove(0)),
        _ => Err(crate::Error::MultipleArtifacts {
            names: jars
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

fn list_jars(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let read_err = |e| crate::Error::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut jars = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jar") {
            jars.push(path);
        }
    }
    jars.sort();
    Ok(jars)
}

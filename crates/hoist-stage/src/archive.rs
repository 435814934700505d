use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use hoist_core::deployment::archive_path_for;
use hoist_core::project::LOCAL_SETTINGS_JSON;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::{ExtendedFileOptions, FileOptions};

/// Files that never leave the developer machine.
const ARCHIVE_EXCLUDES: &[&str] = &[LOCAL_SETTINGS_JSON];

/// Zips the staging directory into `<staging_dir>.zip`.
///
/// Entries are relative to the staging root with `/` separators, in
/// file-name order. `local.settings.json` at the root is left out.
pub fn zip_staging(staging_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let archive_path = archive_path_for(staging_dir);

    if archive_path.exists() {
        std::fs::remove_file(&archive_path).map_err(|e| ArchiveError::Cleanup {
            path: archive_path.clone(),
            source: e,
        })?;
    }

    let file = File::create(&archive_path).map_err(|e| ArchiveError::Create {
        path: archive_path.clone(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);
    let options: FileOptions<'_, ExtendedFileOptions> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(staging_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::Walk {
            path: staging_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let rel_path = path
            .strip_prefix(staging_dir)
            .map_err(|_| ArchiveError::OutsideStaging(path.to_path_buf()))?;
        let rel_name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if rel_name.is_empty() || ARCHIVE_EXCLUDES.contains(&rel_name.as_str()) {
            continue;
        }

        if entry.file_type().is_dir() {
            zip.add_directory(rel_name, options.clone())
                .map_err(|e| ArchiveError::Zip {
                    path: archive_path.clone(),
                    source: e,
                })?;
            continue;
        }

        let mut src = File::open(path).map_err(|e| ArchiveError::CopyFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        zip.start_file(rel_name, options.clone())
            .map_err(|e| ArchiveError::Zip {
                path: archive_path.clone(),
                source: e,
            })?;
        io::copy(&mut src, &mut zip).map_err(|e| ArchiveError::CopyFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        entries += 1;
    }

    zip.finish().map_err(|e| ArchiveError::Zip {
        path: archive_path.clone(),
        source: e,
    })?;

    tracing::info!(archive = %archive_path.display(), files = entries, "staging directory archived");
    Ok(archive_path)
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to remove previous archive {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create archive {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("{0} is outside the staging directory")]
    OutsideStaging(PathBuf),
    #[error("failed to add {path} to archive")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write archive {path}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

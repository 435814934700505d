//! App settings reconciliation.
//!
//! The functions host refuses to start a Java worker unless
//! `FUNCTIONS_WORKER_RUNTIME` is `java`, so that key is forced. The host
//! version marker is only defaulted: users may pin another version.

use std::fmt;

use indexmap::IndexMap;

pub const FUNCTIONS_WORKER_RUNTIME: &str = "FUNCTIONS_WORKER_RUNTIME";
pub const JAVA_WORKER_RUNTIME: &str = "java";
pub const FUNCTIONS_EXTENSION_VERSION: &str = "FUNCTIONS_EXTENSION_VERSION";
pub const DEFAULT_EXTENSION_VERSION: &str = "~4";
/// Connection string of the storage account the functions host runs on.
pub const STORAGE_CONNECTION: &str = "AzureWebJobsStorage";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Always overwritten to a fixed value.
    Forced,
    /// Set only when the user did not provide it.
    Defaulted,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Setting {
    value: String,
    provenance: Provenance,
}

/// Ordered app settings with per-key provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettingsMap {
    entries: IndexMap<String, Setting>,
}

impl AppSettingsMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.value.as_str())
    }

    pub fn provenance(&self, key: &str) -> Option<Provenance> {
        self.entries.get(key).map(|s| s.provenance)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, s)| (k.as_str(), s.value.as_str()))
    }

    /// Insert or replace a user-provenance setting.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(
            key.into(),
            Setting {
                value: value.into(),
                provenance: Provenance::User,
            },
        );
    }

    fn set(&mut self, key: &str, value: &str, provenance: Provenance) {
        self.entries.insert(
            key.to_owned(),
            Setting {
                value: value.to_owned(),
                provenance,
            },
        );
    }
}

impl From<&IndexMap<String, String>> for AppSettingsMap {
    fn from(user: &IndexMap<String, String>) -> Self {
        let mut map = Self::default();
        for (k, v) in user {
            map.insert(k.clone(), v.clone());
        }
        map
    }
}

/// Observation recorded while merging. Never aborts the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeNote {
    Applied {
        key: &'static str,
        value: &'static str,
    },
    Overridden {
        key: &'static str,
        previous: String,
        value: &'static str,
    },
}

impl MergeNote {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Overridden { .. })
    }
}

impl fmt::Display for MergeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { key, value } => write!(f, "app setting {key} set to '{value}'"),
            Self::Overridden {
                key,
                previous,
                value,
            } => write!(
                f,
                "app setting {key} was '{previous}' and has been overwritten with '{value}'"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub settings: AppSettingsMap,
    pub notes: Vec<MergeNote>,
}

impl MergeOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &MergeNote> {
        self.notes.iter().filter(|n| n.is_warning())
    }
}

/// Reconciles user settings with the keys the runtime requires.
#[derive(Debug, Clone)]
pub struct AppSettingsMerger {
    forced: &'static [(&'static str, &'static str)],
    defaulted: &'static [(&'static str, &'static str)],
}

impl AppSettingsMerger {
    pub fn for_function_app() -> Self {
        Self {
            forced: &[(FUNCTIONS_WORKER_RUNTIME, JAVA_WORKER_RUNTIME)],
            defaulted: &[(FUNCTIONS_EXTENSION_VERSION, DEFAULT_EXTENSION_VERSION)],
        }
    }

    /// Web apps have no runtime-mandated settings.
    pub fn for_web_app() -> Self {
        Self {
            forced: &[],
            defaulted: &[],
        }
    }

    pub fn merge(&self, user: &IndexMap<String, String>) -> MergeOutcome {
        let mut settings = AppSettingsMap::from(user);
        let mut notes = Vec::new();

        for &(key, value) in self.forced {
            match settings.get(key) {
                None => notes.push(MergeNote::Applied { key, value }),
                Some(existing) if existing != value => notes.push(MergeNote::Overridden {
                    key,
                    previous: existing.to_owned(),
                    value,
                }),
                Some(_) => {}
            }
            settings.set(key, value, Provenance::Forced);
        }

        for &(key, value) in self.defaulted {
            if !settings.contains_key(key) {
                settings.set(key, value, Provenance::Defaulted);
                notes.push(MergeNote::Applied { key, value });
            }
        }

        for note in &notes {
            if note.is_warning() {
                tracing::warn!("{note}");
            } else {
                tracing::info!("{note}");
            }
        }

        MergeOutcome { settings, notes }
    }
}

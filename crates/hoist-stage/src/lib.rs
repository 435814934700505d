//! Function metadata generation, staging, and packaging for hoist.
//!
//! # Staging pipeline (function apps)
//!
//! ```text
//! FunctionMetadataGenerator::stage()
//!   1. Discover   ── EntryPointDiscovery (functions.toml)
//!   2. Configure  ── one FunctionConfiguration per entry point
//!   3. Validate   ── ConfigurationValidator, all-or-nothing
//!   4. Host files ── host.json + local.settings.json
//!   5. Write      ── <Function>/function.json
//!   6. Jars       ── lib/ dependencies + primary artifact
//!   7. Extensions ── func extensions install (unless bundled / HTTP-only)
//! ```
//!
//! [`archive::zip_staging`] then packs the directory for zip-based transports.

pub mod archive;
pub mod discovery;
pub mod extension;
pub mod function;
pub mod staging;
pub mod tooling;
pub mod validate;

pub use discovery::{DiscoveryError, EntryPointDiscovery, ManifestDiscovery};
pub use extension::{
    ExtensionError, ExtensionInstaller, HostManifest, is_install_extension_needed,
};
pub use function::{
    Binding, BindingDirection, BindingKind, FunctionConfiguration, FunctionEntryPoint,
};
pub use staging::{FunctionMetadataGenerator, StageError, StageOutcome, prepare_staging_dir};
pub use tooling::{FuncCli, JavaCheck, OnDemandFuncCli, ToolingError, check_local_java};
pub use validate::{ConfigurationValidator, DefaultValidator, ValidationError};

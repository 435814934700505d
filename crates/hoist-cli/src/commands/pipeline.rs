use std::path::{Path, PathBuf};

use hoist_core::{AppFlavor, DeployPlan, HoistConfig, ProjectDescriptor};
use hoist_stage::archive::zip_staging;
use hoist_stage::staging::stage_web_app;
use hoist_stage::{
    DefaultValidator, FunctionMetadataGenerator, ManifestDiscovery, OnDemandFuncCli,
    StageOutcome, prepare_staging_dir,
};

/// Configuration plus the plan resolved from it.
pub(crate) struct Loaded {
    pub config: HoistConfig,
    pub plan: DeployPlan,
}

/// What ended up in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Staged {
    Functions(Vec<String>),
    WebApp(PathBuf),
    /// The manifest listed no functions; the staging directory is empty.
    NoFunctions,
    /// Container deployments publish an image; nothing is staged.
    Image(String),
}

/// Load hoist.toml and resolve the deploy plan.
pub(crate) fn load(project_dir: &Path) -> anyhow::Result<Loaded> {
    let config = HoistConfig::load(project_dir)?;
    let plan = DeployPlan::resolve(&config, project_dir)?;
    Ok(Loaded { config, plan })
}

/// Rebuild the staging directory from the project's build outputs.
pub(crate) fn stage(project_dir: &Path, loaded: &Loaded) -> anyhow::Result<Staged> {
    let Loaded { config, plan } = loaded;
    if let Some(image) = plan.runtime.container() {
        return Ok(Staged::Image(image.image.clone()));
    }

    let project = ProjectDescriptor::discover(project_dir, &config.project)?;
    let staging_dir = &plan.deployment.staging_dir;
    prepare_staging_dir(staging_dir)?;

    match plan.target.flavor {
        AppFlavor::Function => {
            let generator = FunctionMetadataGenerator::new(
                ManifestDiscovery::new(project_dir.join(&config.project.functions_manifest)),
                DefaultValidator,
                OnDemandFuncCli,
            );
            Ok(match generator.stage(&project, staging_dir)? {
                StageOutcome::NoFunctions => Staged::NoFunctions,
                StageOutcome::Staged { functions, .. } => Staged::Functions(functions),
            })
        }
        AppFlavor::Web => Ok(Staged::WebApp(stage_web_app(&project, staging_dir)?)),
    }
}

/// Zip the staging directory when the chosen transport ships an archive.
pub(crate) fn package(plan: &DeployPlan) -> anyhow::Result<Option<PathBuf>> {
    if !plan.deployment.kind.needs_archive() {
        return Ok(None);
    }
    Ok(Some(zip_staging(&plan.deployment.staging_dir)?))
}

/// Print what was staged. Returns `false` when there is nothing to publish.
pub(crate) fn report_staged(staged: &Staged, staging_dir: &Path) -> bool {
    match staged {
        Staged::Functions(functions) => {
            println!(
                "Staged {} function(s) in {}:",
                functions.len(),
                staging_dir.display()
            );
            for name in functions {
                println!("  - {name}");
            }
            true
        }
        Staged::WebApp(artifact) => {
            println!("Staged {}", artifact.display());
            true
        }
        Staged::Image(image) => {
            println!("Container image {image} is published as is");
            true
        }
        Staged::NoFunctions => {
            println!("No functions found; nothing to publish.");
            false
        }
    }
}

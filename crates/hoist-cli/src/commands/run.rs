use std::path::Path;

use hoist_core::AppFlavor;
use hoist_stage::{FuncCli, JavaCheck, check_local_java};

use super::pipeline::{self, Staged};

pub fn run(project_dir: &Path) -> anyhow::Result<()> {
    let func = FuncCli::locate()?;
    let loaded = pipeline::load(project_dir)?;
    let plan = &loaded.plan;

    if plan.target.flavor != AppFlavor::Function {
        anyhow::bail!("`hoist run` starts the local functions host; it only applies to function apps");
    }

    if let Some(expected) = plan.runtime.java_version() {
        match check_local_java(expected) {
            JavaCheck::Matches => {}
            JavaCheck::Mismatch { local_major } => tracing::warn!(
                local = local_major,
                configured = expected.major(),
                "local JDK differs from the configured Java version"
            ),
            JavaCheck::Unavailable => tracing::warn!("no local JDK found on PATH"),
        }
    }

    let staged = pipeline::stage(project_dir, &loaded)?;
    if let Staged::Image(image) = &staged {
        anyhow::bail!("container apps run from their image ({image}); start it with docker instead");
    }
    if !pipeline::report_staged(&staged, &plan.deployment.staging_dir) {
        return Ok(());
    }

    println!("Starting functions host...");
    func.host_start(&plan.deployment.staging_dir)?;
    Ok(())
}

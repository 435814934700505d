use std::path::Path;

use super::pipeline;

pub fn package(project_dir: &Path) -> anyhow::Result<()> {
    let loaded = pipeline::load(project_dir)?;
    let staged = pipeline::stage(project_dir, &loaded)?;

    if !pipeline::report_staged(&staged, &loaded.plan.deployment.staging_dir) {
        return Ok(());
    }
    if matches!(staged, pipeline::Staged::Image(_)) {
        return Ok(());
    }

    match pipeline::package(&loaded.plan)? {
        Some(archive) => println!("Archive: {}", archive.display()),
        None => println!(
            "{} deployments upload the staging directory; no archive needed",
            loaded.plan.deployment.kind
        ),
    }
    Ok(())
}

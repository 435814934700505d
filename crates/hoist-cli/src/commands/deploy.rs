use std::path::Path;

use hoist_cloud::{
    ArtifactPublisher, AzCliCredentials, DeployContext, ProvisionPlan, ResourceProvisioner,
};

use super::pipeline;

/// Stage, provision, then publish.
///
/// Staging runs first so a broken project fails before anything is created in Azure.
pub fn deploy(project_dir: &Path) -> anyhow::Result<()> {
    let loaded = pipeline::load(project_dir)?;

    println!("Staging...");
    let staged = pipeline::stage(project_dir, &loaded)?;
    if !pipeline::report_staged(&staged, &loaded.plan.deployment.staging_dir) {
        return Ok(());
    }
    if let Some(archive) = pipeline::package(&loaded.plan)? {
        println!("Archive: {}", archive.display());
    }

    let context = DeployContext::new(loaded.plan, AzCliCredentials::new());
    let client = context.client()?;
    let plan = context.plan();

    println!("Provisioning {}...", plan.target.app_name);
    let report =
        ResourceProvisioner::new(client).orchestrate(ProvisionPlan::from_deploy_plan(plan))?;
    for outcome in &report.outcomes {
        println!("  {} ({})", outcome.step, outcome.change);
    }

    println!("Publishing via {}...", plan.deployment.kind);
    ArtifactPublisher::new(client).publish(&plan.target, &plan.runtime, &plan.deployment)?;

    println!();
    match report.app.url() {
        Some(url) => println!("Deployed: {url}"),
        None => println!("Deployed: {}", report.app.name),
    }
    Ok(())
}

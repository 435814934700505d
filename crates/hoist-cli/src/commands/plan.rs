use std::path::Path;

use hoist_cloud::ProvisionPlan;
use hoist_core::{OperatingSystem, Provenance, RuntimeDescriptor, RuntimeStack};

use super::pipeline;

/// Print the resolved plan. Nothing here contacts Azure.
pub fn plan(project_dir: &Path) -> anyhow::Result<()> {
    let loaded = pipeline::load(project_dir)?;
    let plan = &loaded.plan;
    let target = &plan.target;
    let tier = target.effective_pricing_tier();

    println!("App:            {} ({})", target.app_name, target.flavor);
    println!("Subscription:   {}", target.subscription_id);
    println!("Resource group: {}", target.resource_group);
    println!("Region:         {}", target.region);
    println!(
        "Hosting plan:   {} in {} ({}, {})",
        target.plan_name,
        target.plan_resource_group,
        tier.size(),
        tier.tier()
    );
    println!("Runtime:        {}", describe_runtime(&plan.runtime));
    println!("Deployment:     {}", plan.deployment.kind);
    println!(
        "Staging:        {}",
        plan.deployment.staging_dir.display()
    );

    println!();
    println!("Steps:");
    let provision = ProvisionPlan::from_deploy_plan(plan);
    for (i, step) in provision.steps().iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    println!("  {}. publish via {}", provision.steps().len() + 1, plan.deployment.kind);

    if !plan.app_settings.is_empty() {
        println!();
        println!("App settings:");
        for (name, _) in plan.app_settings.iter() {
            let origin = match plan.app_settings.provenance(name) {
                Some(Provenance::Forced) => " (forced)",
                Some(Provenance::Defaulted) => " (default)",
                Some(Provenance::User) | None => "",
            };
            println!("  {name}{origin}");
        }
    }
    Ok(())
}

fn describe_runtime(runtime: &RuntimeDescriptor) -> String {
    match runtime.stack() {
        RuntimeStack::Container(image) => format!("{}, image {}", runtime.os(), image.image),
        RuntimeStack::Java {
            version,
            web_container: Some(container),
        } if runtime.os() == OperatingSystem::Windows => {
            let (name, container_version) = container.windows_container();
            format!("{}, {version}, {name} {container_version}", runtime.os())
        }
        RuntimeStack::Java {
            version,
            web_container: Some(container),
        } => format!(
            "{}, {version}, {}",
            runtime.os(),
            container.linux_fx_version(*version)
        ),
        RuntimeStack::Java { version, .. } => format!("{}, {version}", runtime.os()),
    }
}

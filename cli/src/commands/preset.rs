use super::verify;
use crate::utils::prompt::Prompt;
use anyhow::{Context, Result};
use colored::*;
use policy_client::preset::{group_user_set, PresetBundle, PresetRunner, ProvisionSummary};
use policy_client::repositories::CreateOutcome;
use policy_client::PolicyAdmin;
use std::path::Path;

/// Load a bundle from disk, or the built-in one.
pub fn load_bundle(path: Option<&Path>) -> Result<PresetBundle> {
    match path {
        Some(path) => PresetBundle::from_file(path)
            .with_context(|| format!("Failed to load preset bundle {}", path.display())),
        None => PresetBundle::horaion().context("Built-in preset bundle is invalid"),
    }
}

/// Provision the whole bundle, then print what the service holds.
pub async fn execute(admin: &PolicyAdmin, bundle: &PresetBundle, format: &str) -> Result<bool> {
    let summary = PresetRunner::new(admin.client()).provision(bundle).await;
    print_summary(&bundle.name, &summary, format)?;
    if format != "json" {
        verify::execute(admin, format).await?;
    }
    Ok(summary.failed == 0)
}

/// Re-apply only the bundle's user attributes and user sets.
pub async fn execute_user_sets(
    admin: &PolicyAdmin,
    bundle: &PresetBundle,
    format: &str,
) -> Result<bool> {
    let summary = PresetRunner::new(admin.client())
        .provision_user_sets(bundle)
        .await;
    print_summary(&bundle.name, &summary, format)?;
    Ok(summary.failed == 0)
}

/// Interactively add a user set matching one `groups` value.
pub async fn add_user_set(admin: &PolicyAdmin) -> Result<bool> {
    let mut prompt = Prompt::new()?;

    let Some(key) = prompt.ask_key("User set key:") else {
        return Ok(false);
    };
    let Some(name) = prompt.ask_or("Display name", &key) else {
        return Ok(false);
    };
    let Some(group) = prompt.ask_required("Group value (matched against user.groups):") else {
        return Ok(false);
    };

    let set = group_user_set(&key, &name, &group);
    let outcome = admin.condition_sets().upsert_user_set(&set).await;
    match outcome {
        CreateOutcome::Created => println!("{} Created user set '{}'", "✓".green(), key),
        CreateOutcome::AlreadyExists => {
            println!("{} Updated conditions of user set '{}'", "✓".green(), key)
        }
        CreateOutcome::Failed => {
            println!("{} Could not create user set '{}' (see log)", "✗".red(), key)
        }
    }
    Ok(outcome.is_ok())
}

fn print_summary(name: &str, summary: &ProvisionSummary, format: &str) -> Result<()> {
    if format == "json" {
        let output = serde_json::json!({ "preset": name, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", format!("=== Preset '{}' ===", name).bold());
    println!("  {} created", summary.created.to_string().green());
    println!("  {} already present", summary.existing);
    if summary.failed > 0 {
        println!("  {} failed", summary.failed.to_string().red().bold());
    }
    println!();
    Ok(())
}

use super::verify::print_report_text;
use crate::utils::prompt::Prompt;
use anyhow::Result;
use colored::*;
use policy_client::reset::{ResetScope, ResetSummary};
use policy_client::PolicyAdmin;

pub fn describe(scope: ResetScope) -> &'static str {
    match scope {
        ResetScope::Full => {
            "set rules, condition sets, the default user attribute, roles, resources and the default tenant"
        }
        ResetScope::Abac => "set rules, condition sets and the default user attribute",
        ResetScope::Resources => "all resources",
        ResetScope::Roles => "all roles",
    }
}

/// Ask before destroying anything unless `assume_yes` is set.
pub fn confirm(scope: ResetScope, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let mut prompt = Prompt::new()?;
    Ok(prompt.confirm(&format!("This deletes {}. Continue?", describe(scope))))
}

/// Execute a reset, then print the remaining model
pub async fn execute(admin: &PolicyAdmin, scope: ResetScope, assume_yes: bool) -> Result<()> {
    if !confirm(scope, assume_yes)? {
        println!("{}", "Reset cancelled".yellow());
        return Ok(());
    }

    run(admin, scope).await;
    Ok(())
}

/// Reset without asking; used once the operator has already confirmed.
pub async fn run(admin: &PolicyAdmin, scope: ResetScope) -> ResetSummary {
    let summary = admin.reset(scope).await;
    print_summary(&summary);
    print_report_text(&admin.verify().await);
    summary
}

fn print_summary(summary: &ResetSummary) {
    println!("{}", "=== Reset Summary ===".bold());
    for stage in &summary.stages {
        let marker = if stage.failed > 0 {
            "✗".red()
        } else {
            "✓".green()
        };
        println!(
            "{} {:<16} deleted {:>3}  skipped {:>3}  failed {:>3}",
            marker,
            stage.stage.to_string(),
            stage.deleted,
            stage.skipped,
            stage.failed
        );
    }
    println!();
}

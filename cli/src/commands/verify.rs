use anyhow::Result;
use colored::*;
use policy_client::verify::{Section, VerifyReport};
use policy_client::PolicyAdmin;

/// Execute the verify command
pub async fn execute(admin: &PolicyAdmin, format: &str) -> Result<()> {
    let report = admin.verify().await;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_report_text(&report);
        }
    }

    Ok(())
}

/// Print the report in a formatted text output
pub fn print_report_text(report: &VerifyReport) {
    println!(
        "{}",
        format!(
            "=== Policy Model: {}/{} ===",
            report.project_id, report.env_id
        )
        .bold()
    );
    println!("Generated: {}", report.generated_at);

    if let Some(healthy) = report.pdp_healthy {
        let status = if healthy {
            "HEALTHY".green().bold()
        } else {
            "UNREACHABLE".red().bold()
        };
        println!("Decision point: {}", status);
    }
    println!();

    print_section("Resources", &report.resources, |r| {
        let actions = if r.actions.is_empty() {
            String::new()
        } else {
            format!("  actions: {}", r.actions.join(", "))
        };
        format!("{} ({}){}", r.key.bold(), r.name, actions)
    });

    print_section("Roles", &report.roles, |r| {
        let permissions = if r.permissions.is_empty() {
            String::new()
        } else {
            format!("  permissions: {}", r.permissions.join(", "))
        };
        format!("{} ({}){}", r.key.bold(), r.name, permissions)
    });

    print_section("User attributes", &report.user_attributes, |a| {
        format!("{} : {}", a.key.bold(), a.kind)
    });

    print_section("User sets", &report.user_sets, |s| {
        if s.is_flagged() {
            format!(
                "{} ({}) {}",
                s.key.bold(),
                s.name,
                format!(
                    "uses subject.{} - expected user.{}",
                    report.lint_attribute, report.lint_attribute
                )
                .red()
            )
        } else {
            format!("{} ({})", s.key.bold(), s.name)
        }
    });

    print_section("Resource sets", &report.resource_sets, |s| match &s.resource {
        Some(resource) => format!("{} ({}) on {}", s.key.bold(), s.name, resource),
        None => format!("{} ({})", s.key.bold(), s.name),
    });

    print_section("Set rules", &report.set_rules, |rule| rule.to_string());

    let flagged = report.flagged_user_sets();
    if flagged.is_empty() {
        println!("{}", "No condition scope problems found".green());
    } else {
        println!(
            "{} {}",
            "⚠ User sets with wrong condition scope:".yellow().bold(),
            flagged.join(", ")
        );
    }
}

fn print_section<T, F>(title: &str, section: &Section<T>, line: F)
where
    F: Fn(&T) -> String,
{
    match section {
        Section::Listed { items } => {
            println!("{} ({})", title.bold(), items.len());
            println!("{}", "─".repeat(50));
            if items.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for item in items {
                println!("  {} {}", "✓".green(), line(item));
            }
        }
        Section::Unavailable { message } => {
            println!("{}", title.bold());
            println!("{}", "─".repeat(50));
            println!(
                "  {} {}",
                "⚠".yellow(),
                format!("Could not list {}: {}", title.to_lowercase(), message).yellow()
            );
        }
    }
    println!();
}

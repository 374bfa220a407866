use anyhow::Result;
use colored::*;
use policy_client::PolicyAdmin;
use serde_json::json;

/// Execute the decision point health probe
pub async fn execute(admin: &PolicyAdmin, format: &str) -> Result<bool> {
    let healthy = admin.check_health().await;
    let endpoint = format!("{}/health", admin.settings().pdp_url);

    match format {
        "json" => {
            let status = json!({
                "status": if healthy { "healthy" } else { "offline" },
                "endpoint": endpoint,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        _ => {
            let status_display = if healthy {
                "HEALTHY".green().bold()
            } else {
                "OFFLINE".red().bold()
            };
            println!("Decision point: {} ({})", status_display, endpoint);
            if !healthy {
                println!(
                    "  {}",
                    "Policy checks will fail until the decision point is reachable".yellow()
                );
            }
        }
    }

    Ok(healthy)
}

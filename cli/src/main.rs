use anyhow::Result;
use clap::{ArgGroup, Parser};
use policy_cli::commands::{health, menu, reset, verify};
use policy_cli::utils::connection::ConnectionArgs;
use policy_cli::utils::logging::init_logging;
use policy_client::reset::ResetScope;
use policy_client::PolicyAdmin;
use tracing::debug;

/// policy-setup - inspect, reset and edit a remote authorization policy model
///
/// Without an action flag an interactive menu is opened.
#[derive(Parser)]
#[command(name = "policy-setup")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .args(["verify", "health", "reset", "reset_resources", "reset_roles", "reset_abac"])
        .multiple(false)
))]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print the current policy model and exit
    #[arg(long)]
    verify: bool,

    /// Probe the policy decision point and exit
    #[arg(long)]
    health: bool,

    /// Delete everything this tool manages
    #[arg(long)]
    reset: bool,

    /// Delete all resources except the built-in user resource
    #[arg(long)]
    reset_resources: bool,

    /// Delete all roles except admin and viewer
    #[arg(long)]
    reset_roles: bool,

    /// Delete set rules, condition sets and the groups attribute
    #[arg(long)]
    reset_abac: bool,

    /// Do not ask for confirmation before a reset
    #[arg(short, long)]
    yes: bool,

    /// Output format (json, text)
    #[arg(short, long, default_value = "text")]
    format: String,
}

impl Cli {
    fn reset_scope(&self) -> Option<ResetScope> {
        if self.reset {
            Some(ResetScope::Full)
        } else if self.reset_resources {
            Some(ResetScope::Resources)
        } else if self.reset_roles {
            Some(ResetScope::Roles)
        } else if self.reset_abac {
            Some(ResetScope::Abac)
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Credentials are checked before any request is made
    let settings = cli.connection.settings_or_exit();
    debug!(
        "Using {} (project {}, env {})",
        settings.api_url, settings.project_id, settings.env_id
    );
    let admin = PolicyAdmin::new(settings);

    if cli.verify {
        verify::execute(&admin, &cli.format).await?;
    } else if cli.health {
        health::execute(&admin, &cli.format).await?;
    } else if let Some(scope) = cli.reset_scope() {
        reset::execute(&admin, scope, cli.yes).await?;
    } else {
        menu::run(&admin).await?;
    }

    Ok(())
}

use anyhow::Result;
use clap::{ArgGroup, Parser};
use policy_cli::commands::{preset, verify};
use policy_cli::utils::connection::ConnectionArgs;
use policy_cli::utils::logging::init_logging;
use policy_client::PolicyAdmin;
use std::path::PathBuf;

/// policy-preset - provision a declarative policy bundle
///
/// Defaults to provisioning the whole bundle, then printing the model.
#[derive(Parser)]
#[command(name = "policy-preset")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["verify", "user_sets_only", "add_user_set"])
        .multiple(false)
))]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Only print the current policy model
    #[arg(long)]
    verify: bool,

    /// Only (re)apply the bundle's user attributes and user sets
    #[arg(long)]
    user_sets_only: bool,

    /// Interactively add a user set matching one group
    #[arg(long)]
    add_user_set: bool,

    /// YAML bundle to use instead of the built-in one
    #[arg(long, value_name = "PATH")]
    preset_file: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let admin = PolicyAdmin::new(cli.connection.settings_or_exit());

    if cli.verify {
        verify::execute(&admin, &cli.format).await?;
    } else if cli.add_user_set {
        preset::add_user_set(&admin).await?;
    } else {
        let bundle = preset::load_bundle(cli.preset_file.as_deref())?;
        if cli.user_sets_only {
            preset::execute_user_sets(&admin, &bundle, &cli.format).await?;
        } else {
            preset::execute(&admin, &bundle, &cli.format).await?;
        }
    }

    Ok(())
}

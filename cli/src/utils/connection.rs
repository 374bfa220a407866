use clap::Args;
use colored::*;
use policy_client::{ConfigError, Settings};

/// Connection overrides shared by both binaries.
///
/// Flags win over the `POLICY_*` environment variables, which win over
/// values read from `.env`.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the administrative API
    #[arg(long, global = true, env = "POLICY_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Base URL of the policy decision point
    #[arg(long, global = true, env = "POLICY_PDP_URL", value_name = "URL")]
    pub pdp_url: Option<String>,

    /// Project identifier
    #[arg(long = "project", global = true, env = "POLICY_PROJECT_ID", value_name = "ID")]
    pub project_id: Option<String>,

    /// Environment identifier
    #[arg(long = "env", global = true, env = "POLICY_ENV_ID", value_name = "ID")]
    pub env_id: Option<String>,
}

impl ConnectionArgs {
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let settings = Settings::from_env()?;
        Ok(self.apply(settings))
    }

    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(url) = &self.api_url {
            settings = settings.with_api_url(url.clone());
        }
        if let Some(url) = &self.pdp_url {
            settings = settings.with_pdp_url(url.clone());
        }
        if let Some(project) = &self.project_id {
            settings.project_id = project.clone();
        }
        if let Some(env_id) = &self.env_id {
            settings.env_id = env_id.clone();
        }
        settings
    }

    /// Load settings or terminate the process with remediation text.
    pub fn settings_or_exit(&self) -> Settings {
        match self.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                if matches!(e, ConfigError::MissingCredential) {
                    eprintln!(
                        "{}",
                        "An administrative API key is required before any operation can run"
                            .yellow()
                    );
                }
                std::process::exit(1);
            }
        }
    }
}

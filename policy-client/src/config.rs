use crate::error::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.permit.io/v2";
pub const DEFAULT_PDP_URL: &str = "http://localhost:7766";
pub const DEFAULT_PROJECT_ID: &str = "default";
pub const DEFAULT_ENV_ID: &str = "dev";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the policy administration service.
///
/// Built once at process start and shared by reference; nothing mutates it
/// afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub pdp_url: String,
    pub api_key: String,
    pub project_id: String,
    pub env_id: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Settings {
    /// Settings with defaults for everything except the endpoint and credential.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: trim_url(api_url.into()),
            pdp_url: DEFAULT_PDP_URL.to_string(),
            api_key: api_key.into(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            env_id: DEFAULT_ENV_ID.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
        }
    }

    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(dir) = env::current_dir() {
            let env_file = dir.join(".env");
            if env_file.exists() {
                dotenv::from_path(&env_file).ok();
            }
        }
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("POLICY_API_KEY").ok_or(ConfigError::MissingCredential)?;

        let mut settings = Self::new(
            get("POLICY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key.trim(),
        );

        if let Some(url) = get("POLICY_PDP_URL") {
            settings.pdp_url = trim_url(url);
        }
        if let Some(project) = get("POLICY_PROJECT_ID") {
            settings.project_id = project;
        }
        if let Some(env_id) = get("POLICY_ENV_ID") {
            settings.env_id = env_id;
        }
        if let Some(raw) = get("POLICY_API_TIMEOUT_SECS") {
            settings.request_timeout = parse_secs("POLICY_API_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = get("POLICY_PDP_TIMEOUT_SECS") {
            settings.health_timeout = parse_secs("POLICY_PDP_TIMEOUT_SECS", &raw)?;
        }

        Ok(settings)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = trim_url(url.into());
        self
    }

    pub fn with_pdp_url(mut self, url: impl Into<String>) -> Self {
        self.pdp_url = trim_url(url.into());
        self
    }

    pub fn with_scope(mut self, project_id: impl Into<String>, env_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self.env_id = env_id.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// `/schema/{project}/{env}` prefix.
    pub fn schema_path(&self) -> String {
        format!("/schema/{}/{}", self.project_id, self.env_id)
    }

    /// `/facts/{project}/{env}` prefix.
    pub fn facts_path(&self) -> String {
        format!("/facts/{}/{}", self.project_id, self.env_id)
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let err = Settings::from_vars(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));

        let err = Settings::from_vars(lookup(&[("POLICY_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(lookup(&[("POLICY_API_KEY", "secret")])).unwrap();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.pdp_url, DEFAULT_PDP_URL);
        assert_eq!(settings.project_id, "default");
        assert_eq!(settings.env_id, "dev");
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.health_timeout, Duration::from_secs(5));
        assert_eq!(settings.schema_path(), "/schema/default/dev");
        assert_eq!(settings.facts_path(), "/facts/default/dev");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_vars(lookup(&[
            ("POLICY_API_KEY", "secret"),
            ("POLICY_API_URL", "http://localhost:9000/v2/"),
            ("POLICY_PDP_URL", "http://pdp:7000/"),
            ("POLICY_PROJECT_ID", "horaion"),
            ("POLICY_ENV_ID", "staging"),
            ("POLICY_API_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(settings.api_url, "http://localhost:9000/v2");
        assert_eq!(settings.pdp_url, "http://pdp:7000");
        assert_eq!(settings.schema_path(), "/schema/horaion/staging");
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = Settings::from_vars(lookup(&[
            ("POLICY_API_KEY", "secret"),
            ("POLICY_PDP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

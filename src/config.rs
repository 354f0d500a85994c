use crate::api::constants::{self, PASSWORD_GRANT};
use crate::api::models::CredentialSet;
use crate::runner::ReportPolicy;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "HEALTHCHECK_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSettings,
    pub admin_api: AdminApiSettings,
    pub ods_api: OdsApiSettings,
}

/// Transport and run behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub ignores_certificate_errors: bool,
    pub max_retry_attempts: u32,
    pub retry_starting_delay_ms: u64,
    /// Randomize backoff delays between 0.5x and 1.5x
    pub retry_jitter: bool,
    pub timeout_secs: u64,
    pub instance_timeout_secs: Option<u64>,
    pub report_policy: ReportPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ignores_certificate_errors: false,
            max_retry_attempts: constants::retry::MAX_RETRY_ATTEMPTS,
            retry_starting_delay_ms: constants::retry::STARTING_DELAY_MS,
            retry_jitter: false,
            timeout_secs: constants::retry::REQUEST_TIMEOUT_SECS,
            instance_timeout_secs: None,
            report_policy: ReportPolicy::default(),
        }
    }
}

impl AppSettings {
    pub fn instance_timeout(&self) -> Option<Duration> {
        self.instance_timeout_secs.map(Duration::from_secs)
    }
}

/// Connection data for the admin directory service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminApiSettings {
    pub access_token_url: String,
    pub tenants_url: String,
    pub instances_url: String,
    pub health_check_url: String,
    pub username: String,
    pub client_id: String,
    pub client_secret: String,
    pub password: String,
    pub grant_type: String,
    pub scope: String,
}

impl AdminApiSettings {
    /// Names of required settings that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        let required = [
            ("access_token_url", &self.access_token_url),
            ("tenants_url", &self.tenants_url),
            ("instances_url", &self.instances_url),
            ("health_check_url", &self.health_check_url),
            ("client_id", &self.client_id),
            ("grant_type", &self.grant_type),
            ("scope", &self.scope),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }

        if self.grant_type.eq_ignore_ascii_case(PASSWORD_GRANT) {
            if self.username.trim().is_empty() {
                missing.push("username");
            }
            if self.password.is_empty() {
                missing.push("password");
            }
        } else if self.client_secret.is_empty() {
            missing.push("client_secret");
        }

        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn credentials(&self) -> CredentialSet {
        CredentialSet::Form {
            token_url: self.access_token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            grant_type: self.grant_type.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Resource endpoints probed on every instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OdsApiSettings {
    pub endpoints: Vec<String>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("instance-healthcheck")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".instance-healthcheck")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location), then apply environment
    /// overrides. A missing default file yields defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::get_config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    info!(
                        "Config file {:?} doesn't exist, using defaults and environment",
                        default_path
                    );
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!(
            "Loaded config with {} monitored endpoints",
            config.ods_api.endpoints.len()
        );
        Ok(config)
    }

    /// Apply `HEALTHCHECK_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let admin = &mut self.admin_api;
        let strings = [
            ("ADMIN_API_ACCESS_TOKEN_URL", &mut admin.access_token_url),
            ("ADMIN_API_TENANTS_URL", &mut admin.tenants_url),
            ("ADMIN_API_INSTANCES_URL", &mut admin.instances_url),
            ("ADMIN_API_HEALTH_CHECK_URL", &mut admin.health_check_url),
            ("ADMIN_API_USERNAME", &mut admin.username),
            ("ADMIN_API_CLIENT_ID", &mut admin.client_id),
            ("ADMIN_API_CLIENT_SECRET", &mut admin.client_secret),
            ("ADMIN_API_PASSWORD", &mut admin.password),
            ("ADMIN_API_GRANT_TYPE", &mut admin.grant_type),
            ("ADMIN_API_SCOPE", &mut admin.scope),
        ];
        for (name, field) in strings {
            if let Some(value) = var(name) {
                debug!("Overriding {} from environment", name);
                *field = value;
            }
        }

        if let Some(value) = var("ODS_API_ENDPOINTS") {
            self.ods_api.endpoints = value
                .split(',')
                .map(str::trim)
                .filter(|endpoint| !endpoint.is_empty())
                .map(str::to_string)
                .collect();
        }

        let app = &mut self.app;
        if let Some(value) = var("APP_IGNORES_CERTIFICATE_ERRORS") {
            app.ignores_certificate_errors = parse_override("APP_IGNORES_CERTIFICATE_ERRORS", &value)?;
        }
        if let Some(value) = var("APP_MAX_RETRY_ATTEMPTS") {
            app.max_retry_attempts = parse_override("APP_MAX_RETRY_ATTEMPTS", &value)?;
        }
        if let Some(value) = var("APP_RETRY_STARTING_DELAY_MS") {
            app.retry_starting_delay_ms = parse_override("APP_RETRY_STARTING_DELAY_MS", &value)?;
        }
        if let Some(value) = var("APP_RETRY_JITTER") {
            app.retry_jitter = parse_override("APP_RETRY_JITTER", &value)?;
        }
        if let Some(value) = var("APP_TIMEOUT_SECS") {
            app.timeout_secs = parse_override("APP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = var("APP_INSTANCE_TIMEOUT_SECS") {
            // Empty clears a timeout set in the file
            app.instance_timeout_secs = match value.trim() {
                "" => None,
                _ => Some(parse_override("APP_INSTANCE_TIMEOUT_SECS", &value)?),
            };
        }
        if let Some(value) = var("APP_REPORT_POLICY") {
            app.report_policy = parse_override("APP_REPORT_POLICY", &value)?;
        }

        Ok(())
    }
}

fn parse_override<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}{}: {}", ENV_PREFIX, name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid_settings() -> AdminApiSettings {
        AdminApiSettings {
            access_token_url: "http://www.myserver.com/token".to_string(),
            tenants_url: "http://www.myserver.com/adminconsole/tenants".to_string(),
            instances_url: "http://www.myserver.com/adminconsole/instances".to_string(),
            health_check_url: "http://www.myserver.com/adminconsole/healthcheck".to_string(),
            username: "SomeUserName".to_string(),
            client_id: "SomeClientId".to_string(),
            client_secret: "SomeSecret".to_string(),
            password: "SomePassword".to_string(),
            grant_type: "client_credentials".to_string(),
            scope: "SomeScope".to_string(),
        }
    }

    #[test]
    fn test_complete_settings_are_valid() {
        assert!(valid_settings().is_valid());
    }

    #[test]
    fn test_each_required_field() {
        let fields = [
            "access_token_url",
            "tenants_url",
            "instances_url",
            "health_check_url",
            "client_id",
            "grant_type",
            "scope",
            "client_secret",
        ];

        for field in fields {
            let mut settings = valid_settings();
            let value = match field {
                "access_token_url" => &mut settings.access_token_url,
                "tenants_url" => &mut settings.tenants_url,
                "instances_url" => &mut settings.instances_url,
                "health_check_url" => &mut settings.health_check_url,
                "client_id" => &mut settings.client_id,
                "grant_type" => &mut settings.grant_type,
                "scope" => &mut settings.scope,
                _ => &mut settings.client_secret,
            };
            value.clear();
            assert_eq!(settings.missing_fields(), vec![field], "clearing {}", field);
        }
    }

    #[test]
    fn test_password_grant_requirements() {
        let mut settings = valid_settings();
        settings.grant_type = "password".to_string();
        settings.client_secret.clear();
        assert!(settings.is_valid());

        settings.username.clear();
        assert_eq!(settings.missing_fields(), vec!["username"]);

        let mut settings = valid_settings();
        settings.grant_type = "password".to_string();
        settings.password.clear();
        assert_eq!(settings.missing_fields(), vec!["password"]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[app]
max_retry_attempts = 5
instance_timeout_secs = 60
report_policy = "always"

[admin_api]
access_token_url = "http://host/token"
client_id = "client"

[ods_api]
endpoints = ["students", "schools"]
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.app.max_retry_attempts, 5);
        assert_eq!(config.app.instance_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.app.report_policy, ReportPolicy::Always);
        assert_eq!(config.app.timeout_secs, 500);
        assert_eq!(config.admin_api.access_token_url, "http://host/token");
        assert_eq!(config.ods_api.endpoints, vec!["students", "schools"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<String, String> = [
            ("HEALTHCHECK_ADMIN_API_CLIENT_SECRET", "from-env"),
            ("HEALTHCHECK_ODS_API_ENDPOINTS", "students, schools,,staffs"),
            ("HEALTHCHECK_APP_MAX_RETRY_ATTEMPTS", "7"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).cloned()).unwrap();

        assert_eq!(config.admin_api.client_secret, "from-env");
        assert_eq!(config.ods_api.endpoints, vec!["students", "schools", "staffs"]);
        assert_eq!(config.app.max_retry_attempts, 7);
    }

    #[test]
    fn test_remaining_app_overrides() {
        let env: HashMap<String, String> = [
            ("HEALTHCHECK_APP_RETRY_STARTING_DELAY_MS", "25"),
            ("HEALTHCHECK_APP_RETRY_JITTER", "true"),
            ("HEALTHCHECK_APP_INSTANCE_TIMEOUT_SECS", "90"),
            ("HEALTHCHECK_APP_REPORT_POLICY", "always"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).cloned()).unwrap();

        assert_eq!(config.app.retry_starting_delay_ms, 25);
        assert!(config.app.retry_jitter);
        assert_eq!(config.app.instance_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.app.report_policy, ReportPolicy::Always);

        config
            .apply_overrides(|key| (key == "HEALTHCHECK_APP_INSTANCE_TIMEOUT_SECS").then(String::new))
            .unwrap();
        assert_eq!(config.app.instance_timeout(), None);

        let result = config.apply_overrides(|key| {
            (key == "HEALTHCHECK_APP_REPORT_POLICY").then(|| "sometimes".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "HEALTHCHECK_APP_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }
}

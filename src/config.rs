use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::{ensure, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HooklineConfig {
    /// Secret configured on the GitHub webhook, used to check `X-Hub-Signature-256`.
    ///
    /// Leaving it out (or keeping the sample placeholder) disables signature checks, which is
    /// only acceptable for local development.
    pub webhook_secret: Option<String>,
    /// PostgreSQL connection string. Events are kept in memory when this is absent.
    pub database_url: Option<String>,
    /// Number of events served by `/api/events`.
    pub events_limit: usize,
    /// Upper bound on any single store operation, in seconds.
    pub store_timeout_secs: u64,
    /// Largest delivery body accepted, in bytes. GitHub sends up to 25 MB.
    pub max_payload_bytes: u64,
}

impl Default for HooklineConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            database_url: None,
            events_limit: 10,
            store_timeout_secs: 5,
            max_payload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl HooklineConfig {
    /// Reads the YAML configuration at `path`, or returns the defaults if there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let config_file = File::open(path)
                    .with_context(|| format!("couldn't open {}:", path.display()))?;
                serde_yaml::from_reader(BufReader::new(config_file))
                    .context("couldn't parse config file")?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Values given on the command line or through the environment win over the file.
    pub fn with_overrides(
        mut self,
        webhook_secret: Option<String>,
        database_url: Option<String>,
    ) -> Self {
        if webhook_secret.is_some() {
            self.webhook_secret = webhook_secret;
        }
        if database_url.is_some() {
            self.database_url = database_url;
        }
        self
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.events_limit > 0, "events_limit must be at least 1");
        ensure!(
            self.store_timeout_secs > 0,
            "store_timeout_secs must be at least 1"
        );
        ensure!(
            self.max_payload_bytes > 0,
            "max_payload_bytes must be at least 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: HooklineConfig = serde_yaml::from_str(
            r#"
webhook_secret: hunter2
database_url: postgres://hookline@localhost/hookline
events_limit: 25
store_timeout_secs: 2
max_payload_bytes: 1048576
"#,
        )
        .unwrap();

        assert_eq!(config.webhook_secret.as_deref(), Some("hunter2"));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://hookline@localhost/hookline")
        );
        assert_eq!(config.events_limit, 25);
        assert_eq!(config.store_timeout(), Duration::from_secs(2));
        assert_eq!(config.max_payload_bytes, 1024 * 1024);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: HooklineConfig = serde_yaml::from_str("webhook_secret: hunter2").unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.events_limit, 10);
        assert_eq!(config.store_timeout_secs, 5);
        assert_eq!(config.max_payload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<HooklineConfig>("mongo_uri: mongodb://localhost").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = HooklineConfig {
            webhook_secret: Some("from-file".to_string()),
            database_url: Some("postgres://file".to_string()),
            ..HooklineConfig::default()
        };

        let config = config.with_overrides(Some("from-env".to_string()), None);
        assert_eq!(config.webhook_secret.as_deref(), Some("from-env"));
        assert_eq!(config.database_url.as_deref(), Some("postgres://file"));
    }

    #[test]
    fn test_validation() {
        assert!(HooklineConfig::default().validate().is_ok());

        let config = HooklineConfig {
            events_limit: 0,
            ..HooklineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HooklineConfig {
            max_payload_bytes: 0,
            ..HooklineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_file() {
        let config = HooklineConfig::load(None).unwrap();
        assert_eq!(config.events_limit, 10);
        assert!(HooklineConfig::load(Some(Path::new("/nonexistent/hookline.yml"))).is_err());
    }
}

mod env;
mod types;


pub use types::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!("config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the proxy cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.backend.base_url.trim();
        if base.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let parsed = url::Url::parse(base)
            .with_context(|| format!("backend.base_url is not a valid URL: {base}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "backend.base_url must use http or https, got {}",
                parsed.scheme()
            );
        }
        if self.backend.timeout_secs == 0 {
            bail!("backend.timeout_secs must be greater than 0");
        }
        if self.backend.deep_timeout_secs == 0 {
            bail!("backend.deep_timeout_secs must be greater than 0");
        }
        if self.backend.connect_timeout_secs == 0 {
            bail!("backend.connect_timeout_secs must be greater than 0");
        }
        if self.backend.max_response_bytes == 0 {
            bail!("backend.max_response_bytes must be greater than 0");
        }
        if self.server.max_body_size == 0 {
            bail!("server.max_body_size must be greater than 0");
        }
        Ok(())
    }
}

impl BackendConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn deep_timeout(&self) -> Duration {
        Duration::from_secs(self.deep_timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

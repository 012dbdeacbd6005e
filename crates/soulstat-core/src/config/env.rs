use std::str::FromStr;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_server();
        self.apply_env_overrides_backend();

        if let Ok(v) = std::env::var("SOULSTAT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("SOULSTAT_OTEL_EXPORTER") {
            self.observability.exporter = v;
        }
        if let Ok(v) = std::env::var("SOULSTAT_OTEL_ENDPOINT") {
            self.observability.endpoint = v;
        }
    }

    fn apply_env_overrides_server(&mut self) {
        if let Ok(v) = std::env::var("SOULSTAT_SERVER_BIND") {
            self.server.bind = v;
        }
        if let Some(port) = parse_env("SOULSTAT_SERVER_PORT") {
            self.server.port = port;
        }
        if let Some(rate) = parse_env("SOULSTAT_RATE_LIMIT") {
            self.server.rate_limit = rate;
        }
        if let Some(size) = parse_env("SOULSTAT_MAX_BODY_SIZE") {
            self.server.max_body_size = size;
        }
        if let Ok(v) = std::env::var("SOULSTAT_ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    fn apply_env_overrides_backend(&mut self) {
        // BACKEND_URL is what existing deployments already set
        if let Ok(v) = std::env::var("BACKEND_URL") {
            self.backend.base_url = v;
        }
        if let Ok(v) = std::env::var("SOULSTAT_BACKEND_URL") {
            self.backend.base_url = v;
        }
        if let Some(secs) = parse_env("SOULSTAT_BACKEND_TIMEOUT") {
            self.backend.timeout_secs = secs;
        }
        if let Some(secs) = parse_env("SOULSTAT_DEEP_TIMEOUT") {
            self.backend.deep_timeout_secs = secs;
        }
        if let Some(secs) = parse_env("SOULSTAT_CONNECT_TIMEOUT") {
            self.backend.connect_timeout_secs = secs;
        }
        if let Some(bytes) = parse_env("SOULSTAT_MAX_RESPONSE_BYTES") {
            self.backend.max_response_bytes = bytes;
        }
    }
}

/// Parsed value of `name`; unset yields `None`, unparseable warns and yields `None`.
fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    if let Ok(value) = raw.trim().parse() {
        Some(value)
    } else {
        tracing::warn!("ignoring invalid {name} value: {raw}");
        None
    }
}

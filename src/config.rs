use serde::{Deserialize, Serialize};
use std::{net::IpAddr, path::Path};

/// Routes served by the demo server; the metrics endpoint must not shadow them
pub const DEMO_ROUTES: [&str; 4] = ["/", "/group", "/oversized", "/health"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Per-request console settings, passed to the middleware as state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggerConfig {
    /// Attach the caller's `file:line:column` to each row
    pub backtraces: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { backtraces: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

/// Load configuration: defaults, then the TOML file at `path` (optional), then
/// `CHROMELOGGER__*` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let defaults = Config::default();

    let config = config::Config::builder()
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", i64::from(defaults.server.port))?
        .set_default("logger.backtraces", defaults.logger.backtraces)?
        .set_default("metrics.enabled", defaults.metrics.enabled)?
        .set_default("metrics.endpoint", defaults.metrics.endpoint)?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("CHROMELOGGER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.parse::<IpAddr>().is_err() {
        anyhow::bail!("Server host '{}' is not a valid IP address", cfg.server.host);
    }

    if cfg.server.port == 0 {
        anyhow::bail!("Server port must be non-zero");
    }

    if cfg.metrics.enabled {
        if !cfg.metrics.endpoint.starts_with('/') {
            anyhow::bail!(
                "Metrics endpoint '{}' must start with '/'",
                cfg.metrics.endpoint
            );
        }
        if DEMO_ROUTES.contains(&cfg.metrics.endpoint.as_str()) {
            anyhow::bail!(
                "Metrics endpoint '{}' collides with a demo route",
                cfg.metrics.endpoint
            );
        }
    }

    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, error, warn};

use crate::config::settings::ClientConfig;

/// Load client config from a YAML file
pub async fn file_to_config(path: &Path) -> Result<ClientConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&content)
}

/// Parse YAML, expanding `${VAR}` / `${VAR:default}` from the environment first.
pub fn parse_config(content: &str) -> Result<ClientConfig> {
    let expanded = expand_env_vars(content)?;
    let config: ClientConfig = serde_yaml::from_str(&expanded)
        .inspect_err(|e| error!("parse config error: {}", e))
        .context("Invalid config format")?;

    debug!("validation config ...");
    validate(&config);
    Ok(config)
}

fn validate(config: &ClientConfig) {
    if config.credentials.api_key.is_empty() || config.credentials.api_secret.is_empty() {
        warn!("api_key or api_secret is empty, authorization requests will be rejected");
    }
    if config.carrier.trim().is_empty() {
        warn!("carrier is blank, tracking requests will use USPS");
    }
    if config.request_timeout_ms == Some(0) {
        warn!("request_timeout_ms is 0, every request will time out");
    }
}

fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    });
    Ok(expanded.into_owned())
}

use std::collections::HashMap;
use std::env;

use anyhow::Result;

use crate::args;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_BIND: &str = "127.0.0.1:4221";

/// Settings for serving a route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Host that absolute URLs are generated for
    pub host: String,
    /// Prefix applied to every generated path
    pub base_path: Option<String>,
    /// Address the server listens on
    pub bind: String,
}

impl RouterConfig {
    pub fn new(host: impl Into<String>, base_path: Option<String>) -> Self {
        RouterConfig {
            host: host.into(),
            base_path,
            bind: DEFAULT_BIND.to_string(),
        }
    }

    fn from_options(options: &HashMap<String, String>) -> Self {
        let lookup = |long: &str, short: &str| {
            options
                .get(long)
                .or_else(|| options.get(short))
                .cloned()
        };

        RouterConfig {
            host: lookup("host", "h").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            base_path: lookup("base-path", "b").filter(|p| !p.is_empty()),
            bind: lookup("bind", "a").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, None)
    }
}

/// Build a [`RouterConfig`] from an argument list (program name included).
pub fn parse_config(args: &[String]) -> Result<RouterConfig> {
    let options = args::parse_args(args)?;
    Ok(RouterConfig::from_options(&options))
}

/// Parse the process's command-line arguments.
pub fn parse_env_args() -> Result<RouterConfig> {
    let args: Vec<String> = env::args().collect();
    parse_config(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = parse_config(&args(&["program"])).unwrap();
        assert_eq!(config, RouterConfig::default());
        assert_eq!(config.bind, "127.0.0.1:4221");
    }

    #[test]
    fn test_long_options() {
        let config = parse_config(&args(&[
            "program",
            "--host",
            "example.com",
            "--base-path=/app",
            "--bind",
            "0.0.0.0:8080",
        ]))
        .unwrap();

        assert_eq!(config.host, "example.com");
        assert_eq!(config.base_path, Some("/app".to_string()));
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_short_options() {
        let config = parse_config(&args(&["program", "-h", "example.com", "-b", "/app"])).unwrap();
        assert_eq!(config.host, "example.com");
        assert_eq!(config.base_path, Some("/app".to_string()));
    }

    #[test]
    fn test_empty_base_path_is_none() {
        let config = parse_config(&args(&["program", "--base-path="])).unwrap();
        assert_eq!(config.base_path, None);
    }

    #[test]
    fn test_missing_value_is_an_error() {
        assert!(parse_config(&args(&["program", "--host"])).is_err());
    }
}

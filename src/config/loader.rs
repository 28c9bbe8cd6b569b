//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the upstream credential.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML document into a config without validating it.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment values onto a parsed config.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.upstream.api_key = key;
    }
}

/// Load, overlay the environment, and validate.
///
/// Without a path the built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            base_url = "http://127.0.0.1:9000"
            response_timeout_secs = 30

            [security]
            access_token = "local-secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.upstream.model, "deepseek-chat");
        assert_eq!(config.upstream.high_water_mark_bytes, 1024 * 1024);
        assert_eq!(config.models.public_model, "gpt-4o");
        assert_eq!(config.security.access_token.as_deref(), Some("local-secret"));
        assert!(config.listener.tls.is_none());
    }

    #[test]
    fn tls_listener_section() {
        let config = parse_config(
            r#"
            [listener.tls]
            cert_path = "cert.pem"
            key_path = "key.pem"
            "#,
        )
        .unwrap();

        let tls = config.listener.tls.unwrap();
        assert_eq!(tls.bind_address, "0.0.0.0:8443");
        assert_eq!(tls.cert_path, "cert.pem");
    }

    #[test]
    fn environment_credential_wins() {
        let mut config = parse_config("[upstream]\napi_key = \"from-file\"").unwrap();

        apply_env_overrides(&mut config, |name| {
            (name == API_KEY_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(config.upstream.api_key, "from-env");

        apply_env_overrides(&mut config, |_| Some("  ".to_string()));
        assert_eq!(config.upstream.api_key, "from-env");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(parse_config("[upstream"), Err(ConfigError::Parse(_))));
    }
}

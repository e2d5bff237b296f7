//! Configuration loader
//!
//! Loads sessionward configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. A `.env` file in the working directory is merged into the environment
//! 2. Attempts to load from environment variables
//! 3. If required variables are missing, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON and TOML)
//! 5. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `SESSIONWARD_OAUTH_CLIENT_ID` (required)
//! - `SESSIONWARD_OAUTH_TOKEN_URL` (required)
//! - `SESSIONWARD_OAUTH_CLIENT_SECRET`
//! - `SESSIONWARD_OAUTH_REVOCATION_URL`
//! - `SESSIONWARD_USE_ID_TOKEN_FOR_HTTP_AUTHENTICATION`: true/false
//! - `SESSIONWARD_REFRESH_EXPIRY_CLOCK_SKEW_IN_MINUTES`
//! - `SESSIONWARD_USER_IDENTIFIER_CLAIM_NAME`
//! - `SESSIONWARD_HTTP_REFRESH_TIMEOUT_SECS`
//! - `SESSIONWARD_HTTP_DISPATCH_TIMEOUT_SECS`
//! - `SESSIONWARD_LOG_LEVEL`
//! - `SESSIONWARD_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./sessionward.toml` or `./sessionward.json`
//! 2. `./config.toml` or `./config.json`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sessionward_domain::{
    AuthSettings, HttpSettings, LogFormat, LoggingConfig, OAuthSettings, Result,
    SessionwardConfig, SessionwardError,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["sessionward.toml", "sessionward.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `SessionwardError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<SessionwardConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Client id and token URL are required; everything else falls back to
/// defaults.
///
/// # Errors
/// Returns `SessionwardError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<SessionwardConfig> {
    let defaults = SessionwardConfig::default();

    let oauth = OAuthSettings {
        client_id: env_var("SESSIONWARD_OAUTH_CLIENT_ID")?,
        client_secret: env_opt("SESSIONWARD_OAUTH_CLIENT_SECRET"),
        token_url: env_var("SESSIONWARD_OAUTH_TOKEN_URL")?,
        revocation_url: env_opt("SESSIONWARD_OAUTH_REVOCATION_URL"),
    };

    let auth = AuthSettings {
        use_id_token_for_http_authentication: env_bool(
            "SESSIONWARD_USE_ID_TOKEN_FOR_HTTP_AUTHENTICATION",
            defaults.auth.use_id_token_for_http_authentication,
        ),
        refresh_expiry_clock_skew_in_minutes: env_parse(
            "SESSIONWARD_REFRESH_EXPIRY_CLOCK_SKEW_IN_MINUTES",
            defaults.auth.refresh_expiry_clock_skew_in_minutes,
        )?,
        user_identifier_claim_name: env_opt("SESSIONWARD_USER_IDENTIFIER_CLAIM_NAME")
            .unwrap_or(defaults.auth.user_identifier_claim_name),
    };

    let http = HttpSettings {
        refresh_timeout_secs: env_parse(
            "SESSIONWARD_HTTP_REFRESH_TIMEOUT_SECS",
            defaults.http.refresh_timeout_secs,
        )?,
        dispatch_timeout_secs: env_parse(
            "SESSIONWARD_HTTP_DISPATCH_TIMEOUT_SECS",
            defaults.http.dispatch_timeout_secs,
        )?,
    };

    let format = match env_opt("SESSIONWARD_LOG_FORMAT") {
        Some(raw) => parse_log_format(&raw)?,
        None => defaults.logging.format,
    };
    let logging = LoggingConfig {
        level: env_opt("SESSIONWARD_LOG_LEVEL").unwrap_or(defaults.logging.level),
        format,
    };

    Ok(SessionwardConfig { auth, oauth, http, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the usual locations for a config file.
///
/// # Errors
/// Returns `SessionwardError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<SessionwardConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SessionwardError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => discover_config_path().ok_or_else(|| {
            SessionwardError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SessionwardError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `SessionwardError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<SessionwardConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SessionwardError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SessionwardError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SessionwardError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the working directory, then the executable's directory
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn discover_config_path() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SessionwardError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SessionwardError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(SessionwardError::Config(format!("Unsupported log format: {other}"))),
    }
}

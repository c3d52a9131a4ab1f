//! Application configuration: TOML file overlaid with `EDUSYNC__*` env vars.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use anyhow::{Context, Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};

use crate::issuer::DEFAULT_LOGIN_PATH;
use crate::routes::RoutePaths;
use crate::session::DEFAULT_SESSION_KEY;

pub const APP_NAME: &str = "edusync";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub issuer: IssuerConfig,
    pub session: SessionConfig,
    pub routes: RoutesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Credential issuer and resource API location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Base URL shared by the login endpoint and the resource API.
    pub base_url: String,
    pub login_path: String,
    pub timeout_secs: u64,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            timeout_secs: 30,
        }
    }
}

impl IssuerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the persisted session; defaults to the XDG state dir.
    pub state_dir: Option<String>,
    /// Store key, also the file stem of the persisted record.
    pub key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub login_path: String,
    pub student_home: String,
    pub admin_home: String,
    pub admin_prefix: String,
    /// Offer a guard-bounced destination once after the next login.
    pub remember_destination: bool,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        let paths = RoutePaths::default();
        Self {
            login_path: paths.login_path,
            student_home: paths.student_home,
            admin_home: paths.admin_home,
            admin_prefix: paths.admin_prefix,
            remember_destination: true,
        }
    }
}

impl RoutesConfig {
    pub fn paths(&self) -> RoutePaths {
        RoutePaths {
            login_path: self.login_path.clone(),
            student_home: self.student_home.clone(),
            admin_home: self.admin_home.clone(),
            admin_prefix: self.admin_prefix.clone(),
        }
    }
}

impl AppConfig {
    /// Directory for the session store, expanded.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match self.session.state_dir {
            Some(ref dir) => expand_str_path(dir),
            None => default_state_dir(),
        }
    }
}

/// Load the config at `path`, writing the defaults first when it is missing.
pub fn load_or_init_config(path: &Path, dry_run: bool) -> Result<AppConfig> {
    if !path.exists() {
        if dry_run {
            info!("dry-run: would create default config at {}", path.display());
        } else {
            write_default_config(path)?;
        }
    }
    load_config(path)
}

/// Load the config at `path` (optional) with environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let env_prefix = env_prefix();
    let built = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix(env_prefix.as_str()).separator("__"))
        .build()
        .with_context(|| format!("reading config {}", path.display()))?;

    let mut config: AppConfig = built
        .try_deserialize()
        .with_context(|| format!("parsing config {}", path.display()))?;

    if let Some(ref dir) = config.session.state_dir {
        let expanded = expand_str_path(dir)?;
        config.session.state_dir = Some(expanded.display().to_string());
    }

    Ok(config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = default_config_header(path);
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn default_config_header(path: &Path) -> String {
    let mut buffer = String::new();
    buffer.push_str("# Configuration for ");
    buffer.push_str(APP_NAME);
    buffer.push('\n');
    buffer.push_str("# File: ");
    buffer.push_str(&path.display().to_string());
    buffer.push('\n');
    buffer.push('\n');
    buffer
}

pub fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

/// Resolve the config file: an explicit path (file or directory) or the default.
pub fn resolve_config_file(override_path: Option<PathBuf>) -> Result<PathBuf> {
    let config_file = match override_path {
        Some(path) => {
            let expanded = expand_path(path)?;
            if expanded.is_dir() {
                expanded.join("config.toml")
            } else {
                expanded
            }
        }
        None => default_config_dir()?.join("config.toml"),
    };

    if config_file.parent().is_none() {
        return Err(anyhow!("invalid config file path: {config_file:?}"));
    }
    Ok(config_file)
}

pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(dir);
        path.push(APP_NAME);
        return Ok(path);
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

pub fn default_state_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::state_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("state").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine state directory"))
}

pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_or_init_config(&path, false).unwrap();

        assert!(path.exists());
        assert_eq!(config.routes.paths(), RoutePaths::default());
        assert!(config.routes.remember_destination);
        assert_eq!(config.session.key, DEFAULT_SESSION_KEY);

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("# Configuration for edusync"));
        assert!(body.contains("[issuer]"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_or_init_config(&path, true).unwrap();

        assert!(!path.exists());
        assert_eq!(config.issuer.login_path, DEFAULT_LOGIN_PATH);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[issuer]
base_url = "https://lms.example.edu"
timeout_secs = 5

[routes]
admin_prefix = "/staff"
admin_home = "/staff/home"
remember_destination = false
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.issuer.base_url, "https://lms.example.edu");
        assert_eq!(config.issuer.timeout(), Duration::from_secs(5));
        assert_eq!(config.issuer.login_path, DEFAULT_LOGIN_PATH);
        let paths = config.routes.paths();
        assert_eq!(paths.admin_prefix, "/staff");
        assert_eq!(paths.admin_home, "/staff/home");
        assert_eq!(paths.login_path, "/login");
        assert!(!config.routes.remember_destination);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_state_dir_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let state = dir.path().join("state");
        fs::write(
            &path,
            format!("[session]\nstate_dir = \"{}\"\n", state.display()),
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.state_dir().unwrap(), state);
    }

    #[test]
    fn test_resolve_config_file_accepts_directory() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_config_file(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(resolved, dir.path().join("config.toml"));
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix(), "EDUSYNC");
    }
}

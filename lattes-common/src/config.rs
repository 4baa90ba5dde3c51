//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file never prevents startup; it is logged
//! and the compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "LATTES_ROOT_FOLDER";

/// SQLite database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "lattes.db";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Upload body limit; curriculum exports with long production lists run to several MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
}

/// Values supplied on the command line (or via clap `env` fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Merge overrides, environment, TOML file and defaults
    pub fn resolve(overrides: ConfigOverrides, toml: Option<&TomlConfig>) -> Self {
        let root_folder =
            resolve_root_folder(overrides.root_folder.as_deref(), ROOT_FOLDER_ENV, toml);

        let host = overrides
            .host
            .or_else(|| toml.and_then(|t| t.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = overrides
            .port
            .or_else(|| toml.and_then(|t| t.port))
            .unwrap_or(DEFAULT_PORT);

        let max_upload_bytes = toml
            .and_then(|t| t.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            root_folder,
            host,
            port,
            max_upload_bytes,
        }
    }

    /// Path of the SQLite database for this configuration
    pub fn database_path(&self) -> PathBuf {
        database_path(&self.root_folder)
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Root folder resolution following the priority order in the module docs
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: Option<&TomlConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = toml.and_then(|t| t.root_folder.clone()) {
        return root_folder;
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Database file inside `root_folder`
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the platform config file if one exists
///
/// Returns `None` when no file is found or it cannot be parsed.
pub fn load_config_file() -> Option<TomlConfig> {
    let path = find_config_file()?;
    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config file {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            None
        }
    }
}

/// Locate the config file for the platform
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("lattes").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/lattes/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lattes
        dirs::data_local_dir()
            .map(|d| d.join("lattes"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lattes"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lattes
        dirs::data_dir()
            .map(|d| d.join("lattes"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lattes"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lattes
        dirs::data_local_dir()
            .map(|d| d.join("lattes"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lattes"))
    } else {
        PathBuf::from("./lattes_data")
    }
}

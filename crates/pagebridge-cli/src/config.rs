//! Dev server configuration.
//!
//! Emulator options merge from three sources, lowest priority first:
//! defaults, `pagebridge.config.json`, `PAGEBRIDGE_*` environment
//! variables. Server-side settings (ports, directories, the emulator
//! binary) come from CLI arguments.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use pagebridge_core::BridgeOptions;

use crate::cli::DevArgs;
use crate::error::{ConfigError, Result};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "pagebridge.config.json";

/// Complete configuration for the `dev` command.
#[derive(Debug)]
pub struct DevConfig {
    /// Options forwarded to the functions emulator
    pub options: BridgeOptions,

    /// Directory scanned for handler files
    pub functions_dir: PathBuf,

    /// Static assets directory
    pub static_dir: PathBuf,

    /// Listener already bound for the dev server. Bound at configuration
    /// time and handed to the server, so the chosen port cannot be taken
    /// by another process in between.
    pub listener: std::net::TcpListener,

    /// Dev server socket address
    pub addr: SocketAddr,

    /// Emulator binary to spawn
    pub emulator: String,
}

impl DevConfig {
    /// Build the dev configuration from CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file is invalid, option validation
    /// fails, or no port near the requested one is free.
    pub fn from_args(args: &DevArgs) -> Result<Self> {
        let options = load_options(args.config.as_deref())?;
        options.validate()?;

        if !args.functions_dir.is_dir() {
            crate::ui::warning(&format!(
                "Functions directory not found: {} (no routes will be installed)",
                args.functions_dir.display()
            ));
        }

        let listener = bind_available_port(args.port)?;
        let addr = listener.local_addr()?;

        Ok(Self {
            options,
            functions_dir: args.functions_dir.clone(),
            static_dir: args.static_dir.clone(),
            listener,
            addr,
            emulator: args.emulator.clone(),
        })
    }

    /// Get the dev server URL as a string.
    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Load emulator options from defaults, config file, and environment.
///
/// A config path passed explicitly must exist; the default
/// `pagebridge.config.json` is optional.
pub fn load_options(config_path: Option<&Path>) -> Result<BridgeOptions> {
    let mut figment = Figment::new().merge(Serialized::defaults(BridgeOptions::default()));

    let config_file = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path.to_path_buf())
        }
        None => {
            let default_path = Path::new(CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        }
    };

    let config_display = config_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if let Some(path) = config_file {
        figment = figment.merge(Json::file(path));
    }

    // PAGEBRIDGE_LOG_LEVEL, PAGEBRIDGE_COMPATIBILITY_DATE, ...
    figment = figment.merge(Env::prefixed("PAGEBRIDGE_"));

    figment.extract().map_err(|e| {
        ConfigError::Invalid {
            path: config_display,
            error: e.to_string(),
        }
        .into()
    })
}

/// Bind the dev server listener on the requested loopback port, searching
/// up to ten ports ahead when it is busy. The listener stays bound until
/// the server takes it over.
fn bind_available_port(requested_port: u16) -> Result<std::net::TcpListener> {
    use std::net::TcpListener;

    if let Ok(listener) = TcpListener::bind(("127.0.0.1", requested_port)) {
        return Ok(listener);
    }

    for offset in 1..=10 {
        let port = requested_port.saturating_add(offset);
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            crate::ui::warning(&format!(
                "Port {} is busy, using port {} instead",
                requested_port, port
            ));
            return Ok(listener);
        }
    }

    Err(ConfigError::InvalidValue {
        field: "port".to_string(),
        value: requested_port.to_string(),
        hint: format!(
            "Ports {}-{} are all in use. Try a different port range.",
            requested_port,
            requested_port.saturating_add(10)
        ),
    }
    .into())
}

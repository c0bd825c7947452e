use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::{ErrorKind, Result};

pub static CONFIG_FILE: &str = "storyboard.toml";

/// Name of the environment variable selecting the listening port.
pub static PORT_VAR: &str = "PORT";

/// Upload ceiling applied when nothing else is configured, 10 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Ceiling for each text part of an upload form, 64 KiB.
pub const DEFAULT_MAX_TEXT_SIZE: usize = 64 * 1024;

/// Application configuration.
///
/// # Sensible defaults
///
/// `Config::default()` gives a working setup: the catalog document is kept
/// at `data/catalog.json`, uploaded images under `uploads/` and the landing
/// page is served from `public/`. Single values can be changed using the
/// *struct update syntax*.
///
/// ```ignore
/// let cfg = Config {
///     storage: Storage {
///         document: "/tmp/catalog.json".to_string(),
///         ..Default::default()
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Address on which to serve the application. Defaults to
    /// `0.0.0.0:3000`. The port part can be overridden with the `PORT`
    /// environment variable.
    pub address: SocketAddr,

    pub storage: Storage,
    pub assets: Assets,
    pub upload: Upload,
    pub auth: Auth,
    pub tracing: Tracing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            storage: Storage::default(),
            assets: Assets::default(),
            upload: Upload::default(),
            auth: Auth::default(),
            tracing: Tracing::default(),
        }
    }
}

impl Config {
    /// Applies the port override if the `PORT` variable is present.
    pub fn with_port_from_env(self) -> Result<Self> {
        self.with_port(std::env::var(PORT_VAR).ok().as_deref())
    }

    fn with_port(mut self, port: Option<&str>) -> Result<Self> {
        if let Some(port) = port {
            let port = port.trim().parse::<u16>().map_err(|e| {
                ErrorKind::ConfigError(config::ConfigError::Message(format!(
                    "invalid {PORT_VAR} value '{port}': {e}"
                )))
            })?;
            self.address.set_port(port);
        }
        Ok(self)
    }
}

/// Loads application config from toml file at default location.
///
/// Missing config files are not an error, defaults are used instead.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from the toml file at `path`.
///
/// For example for `path` == `conf/storyboard.toml` we will load both
/// `conf/storyboard.toml` and `conf/secret.storyboard.toml`, then apply
/// `STORYBOARD__*` environment overrides, e.g.
/// `STORYBOARD__STORAGE__BLOBS=/srv/uploads`. Both files are optional.
pub fn load_from<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    load_with(path.as_ref(), false)
}

/// Same as [`load_from`], except that a missing file at `path` is an error.
/// The secret file stays optional.
pub fn load_required<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    load_with(path.as_ref(), true)
}

fn load_with<T: DeserializeOwned>(path: &Path, required: bool) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(required))
        .add_source(config::File::from(secret_path(path)).required(false))
        .add_source(
            config::Environment::with_prefix("STORYBOARD")
                .try_parsing(true)
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Secret file living next to the config file, `secret.<file name>`.
fn secret_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    path.with_file_name(format!("secret.{file_name}"))
}

/// Where the catalog document and the uploaded images live.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Storage {
    /// Path to the JSON document holding the whole catalog.
    pub document: String,
    /// Directory holding one file per uploaded image.
    pub blobs: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            document: "data/catalog.json".to_string(),
            blobs: "uploads".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Assets {
    /// Flag for serving the static landing page directory.
    pub serve: bool,
    /// Path to the static assets directory, relative to current working
    /// directory. `index.html` in this directory is the landing page.
    pub path: String,
}

impl Default for Assets {
    fn default() -> Self {
        Self {
            serve: true,
            path: "public".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Upload {
    /// Maximum accepted image size in bytes.
    pub max_size: usize,
    /// Maximum size of the title and of the description, in bytes.
    pub max_text_size: usize,
    /// Public path prefix under which the blob directory is served.
    pub url_prefix: String,
}

impl Default for Upload {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
            max_text_size: DEFAULT_MAX_TEXT_SIZE,
            url_prefix: "/uploads".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Plaintext password accepted by the login route.
    pub password: String,
    /// Argon2 PHC string. Takes precedence over `password` when set.
    pub password_hash: Option<String>,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            password: "admin".to_string(),
            password_hash: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
        }
    }
}

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    error::{Error, Result},
    env_subst::substitute_env,
    schema::RegnumConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["regnum.toml", "regnum.yaml", "regnum.yml", "regnum.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RegnumConfig> {
    debug!(path = %path.display(), "loading config");
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./regnum.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/regnum/regnum.{toml,yaml,yml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/regnum/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "regnum").map(|d| d.config_dir().to_path_buf())
}

/// Parse raw config text, picking the format from the file extension.
pub fn parse_config(raw: &str, path: &Path) -> Result<RegnumConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

//! Configuration loading, validation and env substitution for the command client.
//!
//! Config files: `regnum.toml`, `regnum.yaml`, or `regnum.json`
//! Searched in `./` then `~/.config/regnum/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, find_config_file, load_config, parse_config},
    schema::{CommandsConfig, RegnumConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};

use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    regnum_config::{RegnumConfig, Severity, ValidationResult},
    tracing::debug,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the config from `explicit` if given, otherwise discover it.
/// Returns the file that was used, if any. A file that exists but does not
/// parse is an error, never a silent fallback to defaults.
pub fn load(explicit: Option<&Path>) -> Result<(RegnumConfig, Option<PathBuf>)> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(regnum_config::find_config_file);
    load_found(path)
}

fn load_found(path: Option<PathBuf>) -> Result<(RegnumConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let config = regnum_config::load_config(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Ok((config, Some(path)))
        },
        None => {
            debug!("no config file found, using defaults");
            Ok((RegnumConfig::default(), None))
        },
    }
}

/// Print diagnostics to stderr. Info lines are shown only when `verbose`.
pub fn report(result: &ValidationResult, verbose: bool) {
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    if shown > 0 {
        eprintln!();
    }
}

/// `regnum check-config`
pub fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let (config, path) = load(explicit)?;
    match &path {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let result = regnum_config::validate(&config);
    report(&result, verbose);

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

//! Plain-text help output for commands.

use std::{fmt::Write, sync::Arc};

use crate::command::Command;

/// The invocation path of `command` including its parents, e.g.
/// `!about version`.
#[must_use]
pub fn usage_base(prefix: &str, command: &Command) -> String {
    let mut chain = vec![command.primary_alias().to_string()];
    let mut current = command.parent();
    while let Some(parent) = current {
        chain.push(parent.primary_alias().to_string());
        current = parent.parent();
    }
    chain.reverse();
    format!("{prefix}{}", chain.join(" "))
}

fn with_usage(base: &str, usage: &str) -> String {
    if usage.trim().is_empty() {
        base.to_string()
    } else {
        format!("{base} {usage}")
    }
}

/// Render the help text for `command` as seen from `prefix`.
#[must_use]
pub fn format_command(prefix: &str, command: &Command) -> String {
    let base = usage_base(prefix, command);
    let mut out = String::new();

    let _ = writeln!(out, "**{}** - Help", command.name());
    if !command.description().trim().is_empty() {
        let _ = writeln!(out, "{}", command.description());
    }

    let aliases: Vec<String> = command.aliases().iter().map(|a| format!("`{a}`")).collect();
    let _ = writeln!(out, "Aliases: {}", aliases.join(", "));

    match command.parent() {
        Some(parent) => {
            let _ = writeln!(out, "Type: SubCommand (parent: {})", parent.name());
        },
        None => {
            let _ = writeln!(out, "Type: Command");
        },
    }

    let _ = writeln!(out, "Permission: {}", command.permission());
    let _ = writeln!(out, "Usage: {}", with_usage(&base, command.usage()));
    if !command.example_usage().trim().is_empty() {
        let _ = writeln!(out, "Example: {}", with_usage(&base, command.example_usage()));
    }

    if command.has_subcommands() {
        let _ = writeln!(out, "Subcommands:");
        for sub in command.subcommands().commands() {
            let line = with_usage(&format!("{base} {}", sub.primary_alias()), sub.usage());
            let _ = writeln!(out, "  {line} - {}", sub.description());
        }
    }

    out.trim_end().to_string()
}

/// One line per command: invocation and description. Used for listings.
#[must_use]
pub fn format_overview(prefix: &str, commands: &[Arc<Command>]) -> String {
    commands
        .iter()
        .map(|c| format!("{prefix}{} - {}", c.primary_alias(), c.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

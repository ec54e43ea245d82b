use std::sync::Arc;

use crate::{command::Command, registry::AliasRegistry};

/// A command matched from a token list, with the tokens left over for it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: Arc<Command>,
    pub args: Vec<String>,
}

/// Walk `tokens` down the alias tree rooted at `registry`.
///
/// The first token must name a command in `registry`. While the matched
/// command has subcommands and tokens remain, the next token is tried in
/// its namespace; the deepest match wins and keeps the remaining tokens as
/// arguments. A token that names no subcommand stays an argument of the
/// command matched so far.
#[must_use]
pub fn resolve<S: AsRef<str>>(tokens: &[S], registry: &AliasRegistry) -> Option<Resolution> {
    let (first, rest) = tokens.split_first()?;
    let command = registry.resolve(first.as_ref())?;

    if !rest.is_empty()
        && command.has_subcommands()
        && let Some(deeper) = resolve(rest, command.subcommands())
    {
        return Some(deeper);
    }

    Some(Resolution {
        command,
        args: rest.iter().map(|t| t.as_ref().to_owned()).collect(),
    })
}

use crate::config::Configuration;

/// Find the prefix `text` was invoked with.
///
/// Precedence, first match wins:
/// 1. The default prefix, when the guild has no override or
///    `always_default_prefix` is set.
/// 2. The guild's override.
/// 3. The bot mention, when `accept_mention_prefix` is set.
///
/// An empty guild override counts as no override.
#[must_use]
pub fn resolve_prefix<'a>(
    text: &str,
    guild_prefix: Option<&'a str>,
    mention: Option<&'a str>,
    config: &'a Configuration,
) -> Option<&'a str> {
    let guild_prefix = guild_prefix.filter(|p| !p.is_empty());
    let default = config.default_prefix.as_str();

    if (guild_prefix.is_none() || config.always_default_prefix) && text.starts_with(default) {
        return Some(default);
    }

    if let Some(custom) = guild_prefix
        && text.starts_with(custom)
    {
        return Some(custom);
    }

    if config.accept_mention_prefix
        && let Some(mention) = mention.filter(|m| !m.is_empty())
        && text.starts_with(mention)
    {
        return Some(mention);
    }

    None
}

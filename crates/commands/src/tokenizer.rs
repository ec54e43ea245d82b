/// Drop the matched prefix and split the rest on whitespace.
///
/// Runs of whitespace count as one separator; the result never contains
/// empty tokens. A message that is only the prefix yields no tokens.
#[must_use]
pub fn tokenize(text: &str, prefix: &str) -> Vec<String> {
    text.get(prefix.len()..)
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

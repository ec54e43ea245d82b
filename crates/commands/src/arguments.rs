use std::{ops::Index, slice};

/// The tokens that followed the resolved command, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(Vec<String>);

impl Arguments {
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Tokens `start..end`, clamped to the available range.
    #[must_use]
    pub fn range(&self, start: usize, end: usize) -> &[String] {
        let end = end.min(self.0.len());
        let start = start.min(end);
        &self.0[start..end]
    }

    /// All tokens joined with single spaces.
    #[must_use]
    pub fn join(&self) -> String {
        self.0.join(" ")
    }

    /// Tokens from `start` on, joined with single spaces. Empty when
    /// `start` is past the end.
    #[must_use]
    pub fn join_from(&self, start: usize) -> String {
        self.range(start, self.0.len()).join(" ")
    }
}

impl From<Vec<String>> for Arguments {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl Index<usize> for Arguments {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl IntoIterator for Arguments {
    type IntoIter = std::vec::IntoIter<String>;
    type Item = String;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type IntoIter = slice::Iter<'a, String>;
    type Item = &'a String;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Arguments {
        Arguments::new(tokens.iter().map(|t| (*t).to_string()).collect())
    }

    #[test]
    fn positional_access() {
        let a = args(&["kick", "@bob", "spamming", "links"]);
        assert_eq!(a.len(), 4);
        assert_eq!(a.get(1), Some("@bob"));
        assert_eq!(a.get(9), None);
        assert_eq!(&a[0], "kick");
    }

    #[test]
    fn joins() {
        let a = args(&["kick", "@bob", "spamming", "links"]);
        assert_eq!(a.join(), "kick @bob spamming links");
        assert_eq!(a.join_from(2), "spamming links");
        assert_eq!(a.join_from(10), "");
    }

    #[test]
    fn range_is_clamped() {
        let a = args(&["a", "b", "c"]);
        assert_eq!(a.range(1, 2), ["b".to_string()]);
        assert_eq!(a.range(2, 99).len(), 1);
        assert!(a.range(5, 1).is_empty());
    }
}

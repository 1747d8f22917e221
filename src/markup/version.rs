//! Protocol version carried on every telegram root.

use super::MarkupNode;
use std::fmt;

/// `major.minor` protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Version written by this crate
    pub const CURRENT: Version = Version::new(1, 1);

    /// First version that tags string properties with a format
    pub const STRING_FORMAT: Version = Version::new(1, 1);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `"1"` or `"1.2"`
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().splitn(2, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(minor) => minor.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }

    /// Version attribute of a telegram root, or `fallback` when absent
    pub fn of_node(node: &MarkupNode, fallback: Version) -> Version {
        node.attr("version")
            .and_then(Version::parse)
            .unwrap_or(fallback)
    }

    pub fn supports_string_format(self) -> bool {
        self >= Self::STRING_FORMAT
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Version::parse("1.1"), Some(Version::new(1, 1)));
        assert_eq!(Version::parse("2"), Some(Version::new(2, 0)));
        assert_eq!(Version::parse("x.1"), None);
        assert_eq!(Version::parse(""), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Version::new(1, 0) < Version::new(1, 1));
        assert!(Version::new(2, 0) > Version::new(1, 9));
        assert!(!Version::new(1, 0).supports_string_format());
        assert!(Version::CURRENT.supports_string_format());
    }

    #[test]
    fn test_of_node() {
        let node = MarkupNode::new("T").with_attr("version", "1.0");
        assert_eq!(Version::of_node(&node, Version::CURRENT), Version::new(1, 0));
        let bare = MarkupNode::new("T");
        assert_eq!(Version::of_node(&bare, Version::CURRENT), Version::CURRENT);
    }
}

use std::fmt;

/// A globally unique textual name for an entity, most commonly an attribute
/// (§3 Attribute.ident, e.g. `"person/name"`).
#[cfg_attr(any(test, feature = "testing"), derive(proptest_derive::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(pub String);

/// Prefix reserved for the system bootstrap (I6). User claims may not
/// assert an ident starting with this.
pub const RESERVED_PREFIX: &str = "sys/";

impl Ident {
    pub fn new(s: impl Into<String>) -> Self {
        Ident(s.into())
    }

    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(RESERVED_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident(s.to_string())
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Ident(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_prefix_is_detected() {
        assert!(Ident::new("sys/db/ident").is_reserved());
        assert!(!Ident::new("person/name").is_reserved());
    }
}

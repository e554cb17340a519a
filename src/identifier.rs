use crate::error::{AccretionError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::fmt;

/// A namespaced identifier like `minecraft:diamond` or `accretion:item/ruby`.
///
/// Namespaces and paths are restricted to the host's lowercase charset;
/// anything else is rejected at parse time rather than surfacing later as an
/// unresolvable asset path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    namespace: SmolStr,
    path: SmolStr,
}

fn valid_namespace(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
}

fn valid_path(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | '/')
        })
}

impl Identifier {
    /// Build an identifier from explicit namespace and path parts.
    pub fn of(namespace: &str, path: &str) -> Result<Self> {
        if !valid_namespace(namespace) || !valid_path(path) {
            return Err(AccretionError::InvalidIdentifier(format!(
                "{}:{}",
                namespace, path
            )));
        }
        Ok(Identifier {
            namespace: namespace.into(),
            path: path.into(),
        })
    }

    /// Parse a `namespace:path` string. A bare path gets `default_namespace`.
    pub fn parse(s: &str, default_namespace: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((ns, path)) => Identifier::of(ns, path),
            None => Identifier::of(default_namespace, s),
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Identifier with the same namespace but a different path.
    pub fn with_path(&self, path: &str) -> Result<Self> {
        Identifier::of(self.namespace.as_str(), path)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.split_once(':') {
            Some((ns, path)) => {
                Identifier::of(ns, path).map_err(|_| serde::de::Error::custom("bad identifier"))
            }
            None => Err(serde::de::Error::custom("identifier missing namespace")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Identifier;

    #[test]
    fn test_parse_with_namespace() {
        let id = Identifier::parse("minecraft:gold_nugget", "accretion").unwrap();
        assert_eq!(id.namespace(), "minecraft");
        assert_eq!(id.path(), "gold_nugget");
        assert_eq!(id.to_string(), "minecraft:gold_nugget");
    }

    #[test]
    fn test_parse_bare_path_uses_default() {
        let id = Identifier::parse("ruby_sword", "accretion").unwrap();
        assert_eq!(id.namespace(), "accretion");
        assert_eq!(id.path(), "ruby_sword");
    }

    #[test]
    fn test_rejects_invalid_chars() {
        assert!(Identifier::parse("Bad:Name", "accretion").is_err());
        assert!(Identifier::of("ns", "").is_err());
        assert!(Identifier::of("", "path").is_err());
    }

    #[test]
    fn test_path_may_contain_slashes() {
        let id = Identifier::of("accretion", "item/ruby").unwrap();
        assert_eq!(id.path(), "item/ruby");
    }
}

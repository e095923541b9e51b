use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Describes what kind of physical resource a caller needs.
///
/// A spec carries a logical name plus an ordered set of key/value
/// parameters (credentials, isolation level, locale and the like). The
/// pool compares specs through `ResourceAllocator::matches`, so the
/// allocator decides which parameters are significant; equality here is
/// only the trivial default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    name: String,
    params: BTreeMap<String, String>,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter, replacing any previous value for the key.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_param_replaces_existing_values() {
        let spec = ResourceSpec::new("db")
            .with_param("user", "alice")
            .with_param("user", "bob");
        assert_eq!(spec.param("user"), Some("bob"));
        assert_eq!(spec.params().count(), 1);
    }

    #[test]
    fn test_specs_compare_structurally() {
        let a = ResourceSpec::new("db").with_param("user", "alice");
        let b = ResourceSpec::new("db").with_param("user", "alice");
        assert_eq!(a, b);
        assert_ne!(a, ResourceSpec::new("db"));
        assert_eq!(a.name(), "db");
    }
}

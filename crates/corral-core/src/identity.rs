use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a pool within a `PoolManager`.
///
/// A pool is named, optionally scoped to an application and a module
/// within it. Two pools are the same pool iff their identities compare
/// equal; the identity is cheap to clone and hashable so it can key
/// registry maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolIdentity {
    name: String,
    application: Option<String>,
    module: Option<String>,
}

impl PoolIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application: None,
            module: None,
        }
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl fmt::Display for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(app) = &self.application {
            write!(f, "{app}/")?;
        }
        if let Some(module) = &self.module {
            write!(f, "{module}/")?;
        }
        f.write_str(&self.name)
    }
}

impl From<&str> for PoolIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PoolIdentity {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_orders_application_module_name() {
        let id = PoolIdentity::new("orders")
            .with_application("shop")
            .with_module("checkout");
        assert_eq!(id.to_string(), "shop/checkout/orders");

        let id = PoolIdentity::new("orders").with_application("shop");
        assert_eq!(id.to_string(), "shop/orders");

        assert_eq!(PoolIdentity::new("orders").to_string(), "orders");
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(PoolIdentity::new("orders"), PoolIdentity::from("orders"));
        assert_ne!(
            PoolIdentity::new("orders"),
            PoolIdentity::new("orders").with_application("shop")
        );
    }
}

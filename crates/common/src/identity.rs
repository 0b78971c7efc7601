//! Method identities and the namespace prefix rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural key of a method: owner type, method name and parameter types.
///
/// Two identities are equal when all three parts are equal. Identities are
/// immutable once created; every registry and index in the engine is keyed by them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodIdentity {
    /// Fully qualified owner type, e.g. `com.acme.shop.web.UserController`.
    pub owner: String,
    /// Simple method name, e.g. `register`.
    pub method: String,
    /// Parameter type signature, in declaration order.
    #[serde(default)]
    pub params: Vec<String>,
}

impl MethodIdentity {
    pub fn new<I, S>(owner: impl Into<String>, method: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owner: owner.into(),
            method: method.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// The package that contains the owner type (everything before the last `.`).
    ///
    /// # Example
    /// ```
    /// # use common::MethodIdentity;
    /// let id = MethodIdentity::new("com.acme.shop.User", "getEmail", Vec::<String>::new());
    /// assert_eq!(id.package(), "com.acme.shop");
    /// ```
    pub fn package(&self) -> &str {
        self.owner.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    /// First `depth` segments of the owner package. See [`namespace_prefix`].
    pub fn namespace_prefix(&self, depth: usize) -> String {
        namespace_prefix(self.package(), depth)
    }
}

impl fmt::Display for MethodIdentity {
    /// Renders `Owner#method(ParamA, ParamB)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}({})", self.owner, self.method, self.params.join(", "))
    }
}

/// Returns the first `depth` dot-separated segments of a package name.
///
/// Packages shorter than `depth` are returned whole.
///
/// # Example
/// ```
/// # use common::namespace_prefix;
/// assert_eq!(namespace_prefix("com.acme.shop.web.api", 4), "com.acme.shop.web");
/// assert_eq!(namespace_prefix("com.acme", 4), "com.acme");
/// ```
pub fn namespace_prefix(package: &str, depth: usize) -> String {
    package
        .split('.')
        .filter(|seg| !seg.is_empty())
        .take(depth)
        .collect::<Vec<_>>()
        .join(".")
}

//! Identity claims carried inside a signed token.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Extension data attached to a token. Ordered so serialization is canonical.
pub type ExtensionMap = BTreeMap<String, ExtensionValue>;

/// Deepest map nesting accepted in extension data, counting the top-level map.
///
/// Kept well below the JSON parser's recursion limit so anything that can be
/// signed can also be read back.
pub const MAX_EXTENSION_DEPTH: usize = 32;

/// The value shapes allowed in extension data.
///
/// Arrays and nulls are not representable. Floats must be finite and maps may
/// nest at most [`MAX_EXTENSION_DEPTH`] levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Map(ExtensionMap),
}

impl ExtensionValue {
    /// Whether this value (and every nested value) can be signed.
    pub fn is_canonical(&self) -> bool {
        self.is_canonical_at(0)
    }

    /// `depth` is the number of maps already enclosing this value.
    fn is_canonical_at(&self, depth: usize) -> bool {
        match self {
            ExtensionValue::Float(f) => f.is_finite(),
            ExtensionValue::Map(map) => {
                depth < MAX_EXTENSION_DEPTH && map.values().all(|v| v.is_canonical_at(depth + 1))
            }
            _ => true,
        }
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        ExtensionValue::Bool(value)
    }
}

impl From<i64> for ExtensionValue {
    fn from(value: i64) -> Self {
        ExtensionValue::Integer(value)
    }
}

impl From<f64> for ExtensionValue {
    fn from(value: f64) -> Self {
        ExtensionValue::Float(value)
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::String(value.to_string())
    }
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        ExtensionValue::String(value)
    }
}

impl From<ExtensionMap> for ExtensionValue {
    fn from(value: ExtensionMap) -> Self {
        ExtensionValue::Map(value)
    }
}

/// Claim members that must be present for a payload to count as claims.
pub(crate) const REQUIRED_MEMBERS: [&str; 3] = ["sub", "iss", "exp"];

/// Identity claims. Immutable once built; read through accessors.
///
/// Serialized member order follows field order, which keeps the signed form
/// stable for a given set of claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "name", default)]
    display_name: String,
    #[serde(rename = "iss")]
    issuer: String,
    #[serde(rename = "exp")]
    expires_at: i64,
    #[serde(rename = "iat", default)]
    issued_at: i64,
    #[serde(rename = "ext", default, skip_serializing_if = "Option::is_none")]
    extensions: Option<ExtensionMap>,
}

impl Claims {
    /// Build claims issued at `issued_at` (unix seconds) that expire after
    /// `lifetime`.
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        issuer: impl Into<String>,
        issued_at: i64,
        lifetime: Duration,
        extensions: Option<ExtensionMap>,
    ) -> Self {
        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            issuer: issuer.into(),
            expires_at: issued_at.saturating_add(lifetime_secs),
            issued_at,
            extensions,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Expiry as unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Issue time as unix seconds.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn extensions(&self) -> Option<&ExtensionMap> {
        self.extensions.as_ref()
    }

    /// A claim set is expired from its `exp` second onwards.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Whether all extension values can be signed. The extension map itself
    /// is the first level of nesting.
    pub fn is_canonical(&self) -> bool {
        self.extensions
            .as_ref()
            .map(|ext| ext.values().all(|v| v.is_canonical_at(1)))
            .unwrap_or(true)
    }
}

/// Extension data nested `levels` maps deep, counting the outermost map.
#[cfg(test)]
pub(crate) fn nested_extensions(levels: usize) -> ExtensionMap {
    let mut map = ExtensionMap::new();
    map.insert("leaf".to_string(), 1i64.into());
    for _ in 1..levels {
        let mut outer = ExtensionMap::new();
        outer.insert("inner".to_string(), map.into());
        map = outer;
    }
    map
}

//! Scheme bindings: which custom scheme serves which directory, and how.

use crate::error::{ProtocolError, ProtocolErrorExt};
use fxhash::FxHashMap;
use serde::Deserialize;
use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Schemes the webview handles natively; binding one of them would shadow real origins.
const RESERVED_SCHEMES: &[&str] =
    &["about", "blob", "data", "file", "ftp", "http", "https", "javascript", "ws", "wss"];

/// How request paths map onto the bound directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// `<root>/<host>/<path>`, returned as-is. A missing file is a hard `NotFound`.
    Direct,
    /// `<root>/<path>` with directory-index and `index.html` fallback for unknown routes.
    #[default]
    Spa,
}

/// A validated, lower-cased URL scheme identifier (RFC 3986 `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemeName(String);

impl SchemeName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SchemeName {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim().to_ascii_lowercase();

        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid {
            return Err(ProtocolError::registration(format!("Invalid scheme name '{raw}'")));
        }
        if RESERVED_SCHEMES.contains(&name.as_str()) {
            return Err(ProtocolError::registration(format!(
                "Scheme '{name}' is reserved by the webview"
            )));
        }

        Ok(Self(name))
    }
}

impl TryFrom<&str> for SchemeName {
    type Error = ProtocolError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl Borrow<str> for SchemeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Association between a scheme and the directory it is allowed to expose.
///
/// The root is canonicalized on construction, so it is absolute, free of `..`, and
/// symlink-resolved for the rest of the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeBinding {
    scheme: SchemeName,
    root: PathBuf,
    policy: ResolutionPolicy,
}

impl SchemeBinding {
    /// Validates the scheme and binds it to `root`.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] if the scheme is malformed or reserved, or if `root` is
    /// relative, missing, or not a directory.
    pub fn new(
        scheme: &str,
        root: impl AsRef<Path>,
        policy: ResolutionPolicy,
    ) -> Result<Self, ProtocolError> {
        let scheme: SchemeName = scheme.parse()?;
        let root = root.as_ref();

        if !root.is_absolute() {
            return Err(ProtocolError::registration(format!(
                "Root directory for '{scheme}' must be absolute: {}",
                root.display()
            )));
        }

        let canonical = match std::fs::canonicalize(root) {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProtocolError::registration(format!(
                    "Root directory for '{scheme}' does not exist: {}",
                    root.display()
                )));
            },
            Err(e) => {
                return Err(e).context(format!("Failed to resolve root {}", root.display()));
            },
        };

        if !canonical.is_dir() {
            return Err(ProtocolError::registration(format!(
                "Root for '{scheme}' is not a directory: {}",
                canonical.display()
            )));
        }

        debug!(%scheme, root = %canonical.display(), ?policy, "Created scheme binding");
        Ok(Self { scheme, root: canonical, policy })
    }

    #[must_use]
    pub const fn scheme(&self) -> &SchemeName {
        &self.scheme
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn policy(&self) -> ResolutionPolicy {
        self.policy
    }
}

/// Immutable `scheme → binding` map, cheap to clone into request handlers.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    inner: Arc<FxHashMap<SchemeName, SchemeBinding>>,
}

impl BindingTable {
    /// # Errors
    /// [`ProtocolError::Registration`] when two bindings claim the same scheme.
    pub fn new(bindings: impl IntoIterator<Item = SchemeBinding>) -> Result<Self, ProtocolError> {
        let mut map = FxHashMap::default();

        for binding in bindings {
            let scheme = binding.scheme.clone();
            if map.insert(scheme.clone(), binding).is_some() {
                return Err(ProtocolError::registration(format!("Duplicate scheme '{scheme}'")));
            }
        }

        Ok(Self { inner: Arc::new(map) })
    }

    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&SchemeBinding> {
        self.inner.get(scheme)
    }

    /// Bindings ordered by scheme name.
    #[must_use]
    pub fn sorted(&self) -> Vec<&SchemeBinding> {
        let mut bindings: Vec<_> = self.inner.values().collect();
        bindings.sort_by(|a, b| a.scheme.cmp(&b.scheme));
        bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

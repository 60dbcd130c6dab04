//! Maps a request onto a containment-checked filesystem path.
//!
//! Two policies share one containment check:
//! * **Direct**: `<root>/<host>/<path>`, returned without touching the disk.
//! * **SPA**: `<root>/<path>`, then a `stat` decides between the file itself, the directory's
//!   `index.html`, or the root `index.html` when nothing exists at that route.

use crate::error::{ProtocolError, ProtocolErrorExt};
use crate::fs::{EntryKind, FileSystem, Stat};
use crate::path::{contained_join, decode_request_path};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// The document served for directories and unknown SPA routes.
pub const INDEX_DOCUMENT: &str = "index.html";

/// The parts of an inbound URL the resolver consumes. Built once per request; never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    scheme: String,
    host: String,
    path: String,
}

impl ResolutionRequest {
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self { scheme: scheme.into(), host: host.into(), path: path.into() }
    }

    /// Extracts scheme, host and path from `<scheme>://<host>/<path>`. Query and fragment are
    /// ignored.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidUrl`] when the URL cannot be parsed.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let url = Url::parse(raw).context(format!("Unparseable request URL '{raw}'"))?;
        Ok(Self {
            scheme: url.scheme().to_owned(),
            host: url.host_str().unwrap_or_default().to_owned(),
            path: url.path().to_owned(),
        })
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Why a resolved path was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// The request named this file (or, for the direct policy, this path) exactly.
    File,
    /// The request named a directory; its `index.html` is served.
    DirectoryIndex,
    /// Nothing exists at the route; the root `index.html` (app shell) is served.
    FallbackIndex,
}

/// A concrete path inside the bound root, tagged with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    path: PathBuf,
    kind: ResourceKind,
}

impl ResolvedResource {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// Direct mapping: `<root>/<host>/<path>`. Existence is not checked here and there is no fallback.
///
/// # Errors
/// [`ProtocolError::Forbidden`] if the normalized path leaves `root`.
pub fn resolve_direct(
    root: &Path,
    host: &str,
    path: &str,
) -> Result<ResolvedResource, ProtocolError> {
    let host = decode_request_path(host)?;
    let path = decode_request_path(path)?;
    let resource = contained_join(root, &[&*host, &*path])?;

    debug!(resource = %resource.display(), "Resolved direct resource");
    Ok(ResolvedResource { path: resource, kind: ResourceKind::File })
}

/// SPA mapping with directory-index and app-shell fallback.
///
/// # Errors
/// * [`ProtocolError::Forbidden`] if the normalized path leaves `root` (no `stat` is issued).
/// * [`ProtocolError::Resolution`] if the path exists but is neither file nor directory.
/// * [`ProtocolError::Io`] for any `stat` failure other than "not found", unchanged.
pub async fn resolve_spa<F>(fs: &F, root: &Path, path: &str) -> Result<ResolvedResource, ProtocolError>
where
    F: FileSystem,
{
    let path = decode_request_path(path)?;
    let resource = contained_join(root, &[&*path])?;

    let resolved = match fs.stat(&resource).await {
        Stat::Found(EntryKind::File) => ResolvedResource { path: resource, kind: ResourceKind::File },
        Stat::Found(EntryKind::Directory) => ResolvedResource {
            path: resource.join(INDEX_DOCUMENT),
            kind: ResourceKind::DirectoryIndex,
        },
        Stat::NotFound => ResolvedResource {
            path: root.join(INDEX_DOCUMENT),
            kind: ResourceKind::FallbackIndex,
        },
        Stat::Found(EntryKind::Other) => {
            return Err(ProtocolError::Resolution {
                message: resource.display().to_string().into(),
                context: Some("Neither a regular file nor a directory".into()),
            });
        },
        Stat::Failed(source) => {
            return Err(source).context(format!("Failed to stat {}", resource.display()));
        },
    };

    debug!(resource = %resolved.path.display(), kind = ?resolved.kind, "Resolved SPA resource");
    Ok(resolved)
}

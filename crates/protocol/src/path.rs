//! Lexical path handling: decoding, normalization, and the containment check.
//!
//! Everything here is pure. The containment check runs before any `stat`/`open`, so it cannot
//! rely on the target existing and never touches the filesystem.

use crate::error::ProtocolError;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Percent-decodes a URL path. Decoding happens before normalization, so encoded separators
/// and dot segments are subject to the same containment rules as literal ones.
///
/// # Errors
/// [`ProtocolError::Forbidden`] for paths that are not UTF-8 once decoded or contain NUL.
pub fn decode_request_path(raw: &str) -> Result<Cow<'_, str>, ProtocolError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| ProtocolError::forbidden(format!("Undecodable request path '{raw}'")))?;

    if decoded.contains('\0') {
        return Err(ProtocolError::forbidden(format!("NUL byte in request path '{raw}'")));
    }

    Ok(decoded)
}

/// Collapses `.` and `..` and drops redundant separators without consulting the filesystem.
///
/// `..` at the root of an absolute path stays at the root; leading `..` of a relative path is
/// preserved.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                Some(Component::CurDir | Component::ParentDir) | None => out.push(".."),
            },
            other => out.push(other),
        }
    }

    out
}

/// `true` if `candidate` is `root` itself or lies beneath it, compared component by component.
#[must_use]
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Joins request segments onto `root`, normalizes, and enforces containment.
///
/// Each part is split on `/` and `\`; every resulting segment must be a plain name, `.` or
/// `..`. Anything that would re-anchor the path (a drive prefix, a root) is rejected.
///
/// # Errors
/// [`ProtocolError::Forbidden`] if a segment re-anchors the path or the normalized result is
/// not `root` or a descendant of it.
pub fn contained_join(root: &Path, parts: &[&str]) -> Result<PathBuf, ProtocolError> {
    let mut joined = root.to_path_buf();

    for part in parts {
        for segment in part.split(['/', '\\']).filter(|s| !s.is_empty()) {
            let mut components = Path::new(segment).components();
            let plain = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_) | Component::CurDir | Component::ParentDir), None)
            );
            if !plain {
                warn!(segment, "Rejected root-overriding path segment");
                return Err(ProtocolError::forbidden(format!(
                    "Segment '{segment}' overrides the bound root"
                )));
            }
            joined.push(segment);
        }
    }

    let normalized = lexical_normalize(&joined);

    if !is_contained(root, &normalized) {
        warn!(resource = %normalized.display(), root = %root.display(), "Blocked path traversal");
        return Err(ProtocolError::forbidden(normalized.display().to_string()));
    }

    Ok(normalized)
}

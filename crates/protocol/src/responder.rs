use crate::error::{ProtocolError, ProtocolErrorExt};
use crate::fs::FileSystem;
use crate::resolver::ResolvedResource;
use mime_guess::Mime;
use std::io;
use std::path::Path;
use tracing::debug;

/// Bytes plus an optional inferred MIME type. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    pub bytes: Vec<u8>,
    /// `None` when the extension is unknown; the transport picks its own default.
    pub content_type: Option<Mime>,
}

/// Content type from the file name's extension.
#[must_use]
pub fn content_type_for(path: &Path) -> Option<Mime> {
    mime_guess::from_path(path).first()
}

/// Reads the resolved file in one call.
///
/// # Errors
/// * [`ProtocolError::NotFound`] if the file is absent even after fallback rules.
/// * [`ProtocolError::Io`] for every other read failure.
pub async fn respond<F>(fs: &F, resolved: &ResolvedResource) -> Result<ResponsePayload, ProtocolError>
where
    F: FileSystem,
{
    let path = resolved.path();

    let bytes = match fs.read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ProtocolError::NotFound {
                message: path.display().to_string().into(),
                context: Some(format!("{:?} resource", resolved.kind()).into()),
            });
        },
        Err(e) => return Err(e).context(format!("Failed to read {}", path.display())),
    };

    let content_type = content_type_for(path);
    debug!(
        resource = %path.display(),
        size = bytes.len(),
        content_type = content_type.as_ref().map_or("<none>", Mime::essence_str),
        "Read resource"
    );

    Ok(ResponsePayload { bytes, content_type })
}

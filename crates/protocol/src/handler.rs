//! Request pipeline: scheme lookup → resolve → confine → respond.

use crate::binding::{BindingTable, ResolutionPolicy, SchemeBinding};
use crate::error::{ProtocolError, ProtocolErrorExt};
use crate::fs::{FileSystem, TokioFs};
use crate::path::is_contained;
use crate::registrar::Registrar;
use crate::resolver::{ResolutionRequest, ResolvedResource, resolve_direct, resolve_spa};
use crate::responder::{ResponsePayload, respond};
use serde::Deserialize;
use std::io;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

/// How strictly a resolved path is held inside its root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confinement {
    /// Only the lexical check; symlinks inside the bundle are followed wherever they point.
    Lexical,
    /// The lexical check, then the resolved path is canonicalized and must stay under the
    /// canonical root. Catches symlinks that leave the bundle.
    #[default]
    Physical,
}

#[derive(Debug)]
pub struct HandlerInner<F> {
    bindings: BindingTable,
    fs: F,
    confinement: Confinement,
}

/// Serves requests for every bound scheme. Cheap to clone; clones share the binding table.
///
/// ```rust
/// use schemefs_protocol::{BindingTable, ProtocolHandler, Registrar, ResolutionPolicy, SchemeBinding};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), schemefs_protocol::ProtocolError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// # std::fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();
/// let binding = SchemeBinding::new("app", tmp.path(), ResolutionPolicy::Spa)?;
/// let registrar = Registrar::new();
/// registrar.register(BindingTable::new([binding])?)?;
/// let handler = ProtocolHandler::from_registrar(&registrar)?;
///
/// // Unknown routes fall back to the app shell.
/// let payload = handler.handle("app://bundle/settings/profile").await?;
/// assert_eq!(payload.bytes, b"<html></html>");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProtocolHandler<F = TokioFs> {
    inner: Arc<HandlerInner<F>>,
}

impl<F> Clone for ProtocolHandler<F> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<F> Deref for ProtocolHandler<F> {
    type Target = HandlerInner<F>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ProtocolHandler<TokioFs> {
    /// Handler over the real filesystem with [`Confinement::Physical`].
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] unless `registrar` is in
    /// [`Phase::Registered`](crate::Phase::Registered).
    pub fn from_registrar(registrar: &Registrar) -> Result<Self, ProtocolError> {
        Self::from_registrar_with(registrar, TokioFs, Confinement::default())
    }
}

impl<F: FileSystem> ProtocolHandler<F> {
    /// Handler over the registrar's binding table. Traffic can only start once schemes are
    /// registered, and a registered registrar refuses any further registration.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] unless `registrar` is in
    /// [`Phase::Registered`](crate::Phase::Registered).
    pub fn from_registrar_with(
        registrar: &Registrar,
        fs: F,
        confinement: Confinement,
    ) -> Result<Self, ProtocolError> {
        let bindings = registrar
            .bindings()
            .context("Request handlers need registered schemes")?;
        Ok(Self { inner: Arc::new(HandlerInner { bindings, fs, confinement }) })
    }

    #[must_use]
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Parses `url` and serves it.
    ///
    /// # Errors
    /// Any [`ProtocolError`]; see [`serve`](Self::serve).
    pub async fn handle(&self, url: &str) -> Result<ResponsePayload, ProtocolError> {
        let request = ResolutionRequest::parse(url)?;
        self.serve(&request).await
    }

    /// Resolves and reads one request.
    ///
    /// # Errors
    /// * [`ProtocolError::UnknownScheme`] if the scheme has no binding.
    /// * [`ProtocolError::Forbidden`] for containment violations; nothing is read.
    /// * [`ProtocolError::NotFound`], [`ProtocolError::Resolution`], [`ProtocolError::Io`] from
    ///   resolution and reading.
    pub async fn serve(&self, request: &ResolutionRequest) -> Result<ResponsePayload, ProtocolError> {
        let resolved = self.resolve(request).await?;
        respond(&self.fs, &resolved).await
    }

    /// Resolves a request without reading it, applying the configured confinement.
    ///
    /// # Errors
    /// See [`serve`](Self::serve).
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<ResolvedResource, ProtocolError> {
        let binding = self.binding(request.scheme())?;

        let resolved = match binding.policy() {
            ResolutionPolicy::Direct => resolve_direct(binding.root(), request.host(), request.path()),
            ResolutionPolicy::Spa => resolve_spa(&self.fs, binding.root(), request.path()).await,
        }?;

        if self.confinement == Confinement::Physical {
            self.confine(binding, &resolved).await?;
        }

        debug!(scheme = %binding.scheme(), path = request.path(), kind = ?resolved.kind(), "Request resolved");
        Ok(resolved)
    }

    fn binding(&self, scheme: &str) -> Result<&SchemeBinding, ProtocolError> {
        let scheme = scheme.to_ascii_lowercase();
        self.bindings.get(&scheme).ok_or_else(|| ProtocolError::UnknownScheme {
            message: scheme.into(),
            context: None,
        })
    }

    async fn confine(
        &self,
        binding: &SchemeBinding,
        resolved: &ResolvedResource,
    ) -> Result<(), ProtocolError> {
        let physical = match self.fs.canonicalize(resolved.path()).await {
            Ok(physical) => physical,
            // Nothing to follow; the read reports `NotFound`.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).context(format!("Failed to canonicalize {}", resolved.path().display()));
            },
        };

        if is_contained(binding.root(), &physical) {
            return Ok(());
        }

        warn!(
            scheme = %binding.scheme(),
            resource = %resolved.path().display(),
            target = %physical.display(),
            "Blocked symlink escaping the bound root"
        );
        Err(ProtocolError::Forbidden {
            message: resolved.path().display().to_string().into(),
            context: Some("Resolves outside the bound root".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::Phase;
    use tempfile::tempdir;

    fn table(root: &std::path::Path) -> BindingTable {
        BindingTable::new([SchemeBinding::new("app", root, ResolutionPolicy::Spa).unwrap()]).unwrap()
    }

    #[test]
    fn handlers_require_registered_schemes() {
        let tmp = tempdir().unwrap();
        let registrar = Registrar::new();

        let early = ProtocolHandler::from_registrar(&registrar);
        assert!(matches!(early, Err(ProtocolError::Registration { .. })));
        assert_eq!(registrar.phase(), Phase::Unregistered);

        registrar.register(table(tmp.path())).unwrap();
        assert!(ProtocolHandler::from_registrar(&registrar).is_ok());

        registrar.close().unwrap();
        let late = ProtocolHandler::from_registrar_with(&registrar, TokioFs, Confinement::Lexical);
        assert!(matches!(late, Err(ProtocolError::Registration { .. })));
    }

    #[tokio::test]
    async fn registration_after_traffic_fails() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), b"<html></html>").unwrap();
        let registrar = Registrar::new();
        registrar.register(table(tmp.path())).unwrap();

        let handler = ProtocolHandler::from_registrar(&registrar).unwrap();
        assert!(handler.handle("app://bundle/").await.is_ok());

        let again = registrar.register(table(tmp.path()));
        assert!(matches!(again, Err(ProtocolError::Registration { .. })));
    }
}

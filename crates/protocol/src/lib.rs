//! Serves local bundle directories to an embedded webview over custom URL schemes.
//! Every request is resolved onto a path that provably stays inside the directory bound to its
//! scheme; anything else is refused before the filesystem is touched.
//!
//! # Core Features
//!
//! - **Containment**: Percent-decoding, lexical normalization and a component-wise prefix check
//!   run before any `stat` or read. Optional physical confinement also catches symlinks that
//!   leave the bundle.
//! - **Two Resolution Policies**: `Direct` maps `<scheme>://<host>/<path>` to `<root>/<host>/<path>`;
//!   `Spa` serves `<root>/<path>` with directory-index and `index.html` fallback for client routes.
//! - **One-shot Registration**: [`Registrar`] declares privileged schemes exactly once, before
//!   any window exists, and owns the immutable [`BindingTable`] afterwards.
//! - **Content Typing**: MIME types are inferred from file extensions; unknown extensions are
//!   left untyped for the transport to default.
//!
//! # Architectural Overview
//!
//! 1.  **[`BindingTable`]**: Validated `scheme → (root, policy)` map.
//! 2.  **[`Registrar`]**: Phase-guarded `Unregistered → Registered → Closed` lifecycle.
//! 3.  **[`ProtocolHandler`]**: Thread-safe handle that resolves, confines and reads a request.
//! 4.  **[`FileSystem`]**: The async I/O seam; [`TokioFs`] in production.
//!
//! # Examples
//!
//! ```rust
//! use schemefs_protocol::{
//!     BindingTable, ProtocolError, ProtocolHandler, Registrar, ResolutionPolicy, SchemeBinding,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ProtocolError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # std::fs::create_dir(tmp.path().join("assets")).unwrap();
//!     # std::fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();
//!     # std::fs::write(tmp.path().join("assets/a.js"), "let a = 1;").unwrap();
//!     let registrar = Registrar::new();
//!     let table = BindingTable::new([SchemeBinding::new("app", tmp.path(), ResolutionPolicy::Spa)?])?;
//!     registrar.register(table)?;
//!
//!     let handler = ProtocolHandler::from_registrar(&registrar)?;
//!     let script = handler.handle("app://bundle/assets/a.js").await?;
//!     assert!(script.content_type.is_some());
//!
//!     // Traversal never reaches the disk.
//!     let escape = handler.handle("app://bundle/..%2F..%2Fetc%2Fpasswd").await;
//!     assert!(matches!(escape, Err(ProtocolError::Forbidden { .. })));
//!
//!     registrar.close()
//! }
//! ```

mod binding;
pub mod config;
mod error;
mod fs;
mod handler;
mod path;
mod registrar;
mod resolver;
mod responder;

pub use binding::{BindingTable, ResolutionPolicy, SchemeBinding, SchemeName};
pub use error::{ProtocolError, ProtocolErrorExt};
pub use fs::{EntryKind, FileSystem, Stat, TokioFs};
pub use handler::{Confinement, HandlerInner, ProtocolHandler};
pub use path::{contained_join, decode_request_path, is_contained, lexical_normalize};
pub use registrar::{
    Phase, Registrar, SchemePrivileges, SchemeRegistration, register_schemes,
};
pub use resolver::{
    INDEX_DOCUMENT, ResolutionRequest, ResolvedResource, ResourceKind, resolve_direct,
    resolve_spa,
};
pub use responder::{ResponsePayload, content_type_for, respond};

//! # Macros
//!
//! Procedural macros shared by the workspace crates.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into the workspace's standard error type.
///
/// # Features
///
/// * **Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context**: Generates a companion `<Name>Ext` trait so any `Result` holding this error,
///   or holding one of the wrapped source errors, can be annotated with `.context(...)`.
/// * **Conversions**: Implements `From<Source>` for every variant that wraps a source error,
///   so upstream failures propagate with `?`.
/// * **Formatting**: Emits a module-local `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. The macro applies to enums only.
/// 2. Every variant uses named fields.
/// 3. A variant with a `source` field (or a field marked `#[source]`/`#[from]`) must also carry
///    `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use schemefs_derive::scheme_error;
/// use std::borrow::Cow;
///
/// #[scheme_error]
/// pub enum ProtocolError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Forbidden{}: {message}", format_context(.context))]
///     Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &std::path::Path) -> Result<Vec<u8>, ProtocolError> {
///     std::fs::read(path).context("Reading bundle file")
/// }
/// ```
#[proc_macro_attribute]
pub fn scheme_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

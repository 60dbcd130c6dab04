use std::borrow::Cow;

/// Failures surfaced to the transport layer. Nothing here is retried.
#[schemefs_derive::scheme_error]
pub enum ProtocolError {
    /// The request normalizes to a path outside the bound root. Raised before any I/O.
    #[error("Forbidden file system resource{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The resolved path does not exist, after every fallback rule was applied.
    #[error("Resource not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The resolved path exists but cannot be served (special file, unusable entry).
    #[error("Failed to resolve file system resource{}: {message}", format_context(.context))]
    Resolution { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Scheme registration was invoked incorrectly or a binding is invalid.
    #[error("Scheme registration error{}: {message}", format_context(.context))]
    Registration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The request names a scheme that has no binding.
    #[error("Unknown scheme{}: {message}", format_context(.context))]
    UnknownScheme { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid request URL{}: {source}", format_context(.context))]
    InvalidUrl { source: url::ParseError, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Configuration error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

impl ProtocolError {
    pub(crate) fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub(crate) fn registration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Registration { message: message.into(), context: None }
    }
}

//! Bridges webview custom-protocol requests to [`ProtocolHandler`].

use dioxus::desktop::wry::http::header::CONTENT_TYPE;
use dioxus::desktop::wry::http::{HeaderValue, Request, Response, StatusCode, Uri};
use schemefs_protocol::{
    FileSystem, ProtocolError, ProtocolHandler, ResolutionRequest, ResponsePayload, SchemeName,
};
use std::borrow::Cow;
use tokio::runtime::Handle;
use tracing::{debug, error};

pub type ProtocolResponse = Response<Cow<'static, [u8]>>;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// The request the core sees.
///
/// Some webviews rewrite `<scheme>://<host>/<path>` to `http://<scheme>.<host>/<path>` before it
/// reaches the handler. The scheme therefore comes from the registration, and a `<scheme>.`
/// prefix on the host of a rewritten URI is stripped so direct bindings see the original host.
#[must_use]
pub fn resolution_request(scheme: &SchemeName, uri: &Uri) -> ResolutionRequest {
    let host = uri.host().unwrap_or_default();
    let rewritten = !uri.scheme_str().is_some_and(|s| s.eq_ignore_ascii_case(scheme.as_str()));

    let host = if rewritten {
        host.strip_prefix(scheme.as_str()).and_then(|h| h.strip_prefix('.')).unwrap_or(host)
    } else {
        host
    };

    ResolutionRequest::new(scheme.as_str(), host, uri.path())
}

#[must_use]
pub fn status_for(err: &ProtocolError) -> StatusCode {
    match err {
        ProtocolError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ProtocolError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps the outcome of one request onto an HTTP response. `Content-Type` is only set when a
/// type was inferred; error bodies are plain text.
#[must_use]
pub fn into_response(result: Result<ResponsePayload, ProtocolError>) -> ProtocolResponse {
    match result {
        Ok(ResponsePayload { bytes, content_type }) => {
            let mut response = Response::new(Cow::Owned(bytes));
            if let Some(value) = content_type.and_then(|m| HeaderValue::from_str(m.as_ref()).ok()) {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            response
        },
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                error!(error = %err, "Protocol request failed");
            } else {
                debug!(error = %err, %status, "Protocol request refused");
            }

            let mut response = Response::new(Cow::Owned(err.to_string().into_bytes()));
            *response.status_mut() = status;
            response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT));
            response
        },
    }
}

/// Serves one request on the worker runtime and hands the response to `respond`.
///
/// The UI thread only spawns; resolution and reads run on `runtime`.
pub fn dispatch<F, R>(
    runtime: &Handle,
    handler: ProtocolHandler<F>,
    scheme: &SchemeName,
    request: &Request<Vec<u8>>,
    respond: R,
) where
    F: FileSystem + 'static,
    R: FnOnce(ProtocolResponse) + Send + 'static,
{
    let request = resolution_request(scheme, request.uri());
    runtime.spawn(async move {
        let result = handler.serve(&request).await;
        respond(into_response(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemefs_protocol::{BindingTable, Registrar, ResolutionPolicy, SchemeBinding};
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn errors_map_to_status_codes() {
        let forbidden = ProtocolError::Forbidden { message: "x".into(), context: None };
        let missing = ProtocolError::NotFound { message: "x".into(), context: None };
        let special = ProtocolError::Resolution { message: "x".into(), context: None };
        let unknown = ProtocolError::UnknownScheme { message: "x".into(), context: None };

        assert_eq!(status_for(&forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&special), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&unknown), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_responses_are_plain_text() {
        let response = into_response(Err(ProtocolError::NotFound {
            message: "/app/missing.js".into(),
            context: None,
        }));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], PLAIN_TEXT);
        assert!(String::from_utf8_lossy(response.body()).contains("/app/missing.js"));
    }

    #[test]
    fn untyped_payloads_carry_no_content_type() {
        let response = into_response(Ok(ResponsePayload { bytes: b"raw".to_vec(), content_type: None }));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response.body().as_ref(), b"raw");
    }

    #[test]
    fn request_uses_registered_scheme_and_raw_path() {
        let scheme: SchemeName = "app".parse().unwrap();
        let uri: Uri = "app://bundle/assets/a%20b.js?v=2".parse().unwrap();
        let request = resolution_request(&scheme, &uri);
        assert_eq!(request.scheme(), "app");
        assert_eq!(request.host(), "bundle");
        assert_eq!(request.path(), "/assets/a%20b.js");
    }

    #[test]
    fn rewritten_uris_keep_the_original_host() {
        let scheme: SchemeName = "app".parse().unwrap();

        let uri: Uri = "http://app.app1/main.js".parse().unwrap();
        let request = resolution_request(&scheme, &uri);
        assert_eq!(request.scheme(), "app");
        assert_eq!(request.host(), "app1");
        assert_eq!(request.path(), "/main.js");

        // Only the registered scheme's prefix is stripped.
        let other: Uri = "https://cdn.example/lib.js".parse().unwrap();
        assert_eq!(resolution_request(&scheme, &other).host(), "cdn.example");

        // Hosts that merely start with the scheme name are left alone.
        let native: Uri = "app://app.bundle/".parse().unwrap();
        assert_eq!(resolution_request(&scheme, &native).host(), "app.bundle");
    }

    #[test]
    fn dispatch_serves_on_the_worker_runtime() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), b"<html></html>").unwrap();
        let binding = SchemeBinding::new("app", tmp.path(), ResolutionPolicy::Spa).unwrap();
        let scheme = binding.scheme().clone();
        let registrar = Registrar::new();
        registrar.register(BindingTable::new([binding]).unwrap()).unwrap();
        let handler = ProtocolHandler::from_registrar(&registrar).unwrap();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (tx, rx) = mpsc::channel();

        let request = Request::builder().uri("app://bundle/settings").body(Vec::new()).unwrap();
        dispatch(runtime.handle(), handler, &scheme, &request, move |response| {
            tx.send(response).unwrap();
        });

        let response = rx.recv().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(response.body().as_ref(), b"<html></html>");
    }
}

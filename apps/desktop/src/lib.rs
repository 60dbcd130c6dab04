pub mod config;
pub mod protocol;

use dioxus::desktop::tao::event::Event;
use dioxus::desktop::{Config, WindowBuilder};
use dioxus::prelude::*;
use schemefs_protocol::{FileSystem, ProtocolHandler, Registrar, SchemeRegistration};
use tokio::runtime::Handle;
use tracing::{info, warn};

pub use config::{DesktopConfig, WindowConfig};

/// URL loaded into the window's full-size frame.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryUrl(String);

#[derive(Debug)]
pub struct DesktopApp {
    title: String,
    width: f64,
    height: f64,
}

impl From<&WindowConfig> for DesktopApp {
    fn from(window: &WindowConfig) -> Self {
        Self { title: window.title.clone(), width: window.width, height: window.height }
    }
}

impl DesktopApp {
    /// Opens the window at `entry` with one asynchronous protocol handler per registered scheme.
    ///
    /// Requests are served on `runtime`; the UI thread never touches the filesystem. The global
    /// [`Registrar`] is closed when the event loop shuts down.
    pub fn launch<F>(
        self,
        entry: String,
        registrations: &[SchemeRegistration],
        handler: &ProtocolHandler<F>,
        runtime: &Handle,
    ) where
        F: FileSystem + 'static,
    {
        let window = WindowBuilder::new().with_title(&self.title).with_inner_size(
            dioxus::desktop::LogicalSize { width: self.width, height: self.height },
        );

        let mut cfg = Config::default()
            .with_window(window)
            .with_custom_head(
                r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#.into(),
            )
            .with_custom_event_handler(|event, _| {
                if matches!(event, Event::LoopDestroyed)
                    && let Err(err) = Registrar::global().close()
                {
                    warn!(error = %err, "Registrar was not open at shutdown");
                }
            });

        for registration in registrations {
            let scheme = registration.scheme.clone();
            let handler = handler.clone();
            let runtime = runtime.clone();
            cfg = cfg.with_asynchronous_custom_protocol(
                registration.scheme.to_string(),
                move |_webview, request, responder| {
                    protocol::dispatch(&runtime, handler.clone(), &scheme, &request, move |response| {
                        responder.respond(response);
                    });
                },
            );
        }

        info!(%entry, schemes = registrations.len(), "Launching desktop window");
        LaunchBuilder::desktop()
            .with_cfg(cfg)
            .with_context_provider(move || Box::new(EntryUrl(entry.clone())))
            .launch(Shell);
    }
}

#[component]
fn Shell() -> Element {
    let EntryUrl(entry) = use_context::<EntryUrl>();

    rsx! {
        iframe {
            src: "{entry}",
            style: "position: fixed; inset: 0; width: 100%; height: 100%; border: 0;",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_settings_come_from_config() {
        let window = WindowConfig { title: "Bundle".to_owned(), width: 640.0, height: 480.0 };
        let app = DesktopApp::from(&window);

        assert_eq!(app.title, "Bundle");
        assert!((app.width - 640.0).abs() < f64::EPSILON);
        assert!((app.height - 480.0).abs() < f64::EPSILON);
    }
}

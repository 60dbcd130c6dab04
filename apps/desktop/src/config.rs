use schemefs_protocol::SchemeRegistration;
use schemefs_protocol::config::ProtocolConfig;
use schemefs_runtime::WorkerConfig;
use serde::Deserialize;

/// Host placeholder used when the entry URL is derived from the first registered scheme.
pub const DEFAULT_ENTRY_HOST: &str = "bundle";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "SchemeFS Desktop".to_owned(), width: 1200.0, height: 800.0 }
    }
}

/// Everything `schemefs-desktop` reads from its configuration file.
///
/// ```toml
/// entry = "app://bundle/"
/// workers = 2
///
/// [window]
/// title = "Docs"
///
/// [protocol]
/// confinement = "physical"
///
/// [[protocol.bindings]]
/// scheme = "app"
/// root = "dist"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// URL the window opens; defaults to the root of the first registered scheme.
    pub entry: Option<String>,
    /// Protocol worker threads; defaults to half the available parallelism.
    pub workers: Option<usize>,
    pub window: WindowConfig,
    pub protocol: ProtocolConfig,
}

impl DesktopConfig {
    #[must_use]
    pub fn worker_config(&self) -> WorkerConfig {
        let config = WorkerConfig::default();
        match self.workers {
            Some(threads) => config.with_worker_threads(threads),
            None => config,
        }
    }

    /// The configured entry URL, or `<first scheme>://bundle/`.
    #[must_use]
    pub fn entry_url(&self, registrations: &[SchemeRegistration]) -> Option<String> {
        self.entry.clone().or_else(|| {
            registrations.first().map(|r| format!("{}://{DEFAULT_ENTRY_HOST}/", r.scheme))
        })
    }
}

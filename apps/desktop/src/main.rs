use anyhow::{Context, anyhow};
use schemefs_desktop::{DesktopApp, DesktopConfig};
use schemefs_logger::Logger;
use schemefs_protocol::config::load_config;
use schemefs_protocol::{ProtocolHandler, Registrar, TokioFs};
use schemefs_runtime::build_worker_runtime;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "schemefs.toml";

fn main() -> anyhow::Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).console(true).init()?;

    let config_path = std::env::args_os().nth(1).map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config_path = std::path::absolute(&config_path)
        .with_context(|| format!("Cannot resolve {}", config_path.display()))?;
    let cfg: DesktopConfig =
        load_config(&config_path).context("Critical: Configuration is malformed")?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("/"));

    // Privileged schemes must be declared before any window exists.
    let table = cfg.protocol.binding_table(base_dir).context("Critical: Invalid scheme binding")?;
    let registrar = Registrar::global();
    let registrations = registrar.register(table).context("Critical: Scheme registration failed")?;

    let runtime = build_worker_runtime(&cfg.worker_config())?;
    let handler = ProtocolHandler::from_registrar_with(registrar, TokioFs, cfg.protocol.confinement)?;
    let entry = cfg.entry_url(&registrations).ok_or_else(|| anyhow!("No entry URL to open"))?;

    DesktopApp::from(&cfg.window).launch(entry, &registrations, &handler, runtime.handle());

    Ok(())
}

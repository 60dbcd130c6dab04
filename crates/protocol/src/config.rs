//! Layered configuration: a TOML/YAML/JSON file, then `SCHEMEFS__*` environment overrides.

use crate::binding::{BindingTable, ResolutionPolicy, SchemeBinding};
use crate::error::{ProtocolError, ProtocolErrorExt};
use crate::handler::Confinement;
use config::{Config, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix for environment overrides, e.g. `SCHEMEFS__PROTOCOL__CONFINEMENT=lexical`.
pub const ENV_PREFIX: &str = "SCHEMEFS";

/// One `[[bindings]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindingConfig {
    pub scheme: String,
    /// Relative roots are resolved against the directory of the config file.
    pub root: PathBuf,
    #[serde(default)]
    pub policy: ResolutionPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub bindings: Vec<BindingConfig>,
    pub confinement: Confinement,
}

impl ProtocolConfig {
    /// Validates every binding and builds the table.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] for invalid schemes, missing roots, or duplicates.
    pub fn binding_table(&self, base_dir: &Path) -> Result<BindingTable, ProtocolError> {
        let bindings = self
            .bindings
            .iter()
            .map(|b| {
                let root = if b.root.is_absolute() { b.root.clone() } else { base_dir.join(&b.root) };
                SchemeBinding::new(&b.scheme, root, b.policy)
            })
            .collect::<Result<Vec<_>, _>>()?;

        BindingTable::new(bindings)
    }
}

/// Loads `T` from `path` (extension picks the format) with environment overrides on top.
///
/// Nested keys use double underscores: `SCHEMEFS__WINDOW__TITLE` maps to `window.title`.
///
/// # Errors
/// [`ProtocolError::Config`] if the file is missing or does not match `T`.
///
/// # Example
/// ```rust,no_run
/// use schemefs_protocol::config::{ProtocolConfig, load_config};
///
/// let cfg: ProtocolConfig = load_config("schemefs.toml").unwrap_or_default();
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ProtocolError>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();

    let builder = Config::builder().add_source(File::from(path).required(true)).add_source(
        Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
    );

    info!("Loading config from {}", path.display());

    let config = builder
        .build()
        .context(format!("Failed to build config from {}", path.display()))?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

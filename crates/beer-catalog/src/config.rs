//! Configuration types for beer catalog client construction.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config as HierarchicalConfig, Environment, File};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::endpoints::DEFAULT_BASE_URL;
use crate::error::CatalogClientError;

/// Prefix of environment variables overriding configuration values,
/// e.g. `BEER_CATALOG_BASE_URL`.
pub const BEER_CATALOG_ENV_PREFIX: &str = "BEER_CATALOG";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for beer catalog client construction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerClientConfig {
    /// Origin of the beer service, without the `/api/v1` prefix.
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub base_url: String,
    /// Additional headers to include in requests.
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// User agent sent with every request, reqwest's default if unset.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Time allowed to establish a connection, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    /// Time allowed for a whole request, in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for BeerClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl BeerClientConfig {
    /// Configuration for the given origin with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load the configuration from defaults, an optional TOML file
    /// and `BEER_CATALOG_*` environment variables, in increasing priority.
    pub fn load(config_file: Option<&Path>) -> Result<Self, CatalogClientError> {
        let mut builder = HierarchicalConfig::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("connect_timeout", DEFAULT_CONNECT_TIMEOUT.as_secs())?
            .set_default("timeout", DEFAULT_TIMEOUT.as_secs())?;

        if let Some(path) = config_file {
            debug!(path = %path.display(), "reading beer catalog configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(BEER_CATALOG_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<BeerClientConfig>()?;

        debug!(base_url = %config.base_url, "loaded beer catalog configuration");
        Ok(config)
    }
}

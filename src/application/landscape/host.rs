use super::cockpit::{SystemViewAdapter, ViewRequest};
use super::interface::{CockpitSource, InventorySearch};
use super::resolver::EntityResolver;
use super::search::{FlexiSearchTool, SearchRequest};
use crate::application::catalog::{COCKPIT_VIEW_TOOL, FLEXI_SEARCH_TOOL, ToolCatalog};
use crate::config::BackendConfig;
use crate::domain::ToolFailure;
use crate::infrastructure::backend::{BackendError, CockpitClient, FlexiClient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Environment variable enabling the raw payload dump when the config has none.
pub const DEBUG_DUMP_ENV: &str = "LANDSCAPE_DEBUG_DUMP_DIR";

/// Executes catalog tools against the landscape backends.
#[derive(Clone)]
pub struct LandscapeToolHost {
    catalog: ToolCatalog,
    view: SystemViewAdapter,
    search: FlexiSearchTool,
}

impl LandscapeToolHost {
    pub fn new(search: Arc<dyn InventorySearch>, cockpit: Arc<dyn CockpitSource>) -> Self {
        let resolver = EntityResolver::new(Arc::clone(&search));
        Self {
            catalog: ToolCatalog::landscape(),
            view: SystemViewAdapter::new(resolver, cockpit),
            search: FlexiSearchTool::new(search),
        }
    }

    /// Builds the host with HTTP clients for the configured backends.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let search = FlexiClient::new(
            &config.search_base_url,
            config.search_timeout_secs,
            config.accept_invalid_certs,
        )?;
        let cockpit = CockpitClient::new(
            &config.cockpit_base_url,
            config.cockpit_timeout_secs,
            config.accept_invalid_certs,
        )?;
        let dump_dir = config
            .debug_dump_dir
            .clone()
            .or_else(|| std::env::var_os(DEBUG_DUMP_ENV).map(PathBuf::from));
        Ok(Self::new(Arc::new(search), Arc::new(cockpit)).with_dump_dir(dump_dir))
    }

    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.view = self.view.with_dump_dir(dir);
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Validates `arguments` against the descriptor and runs the tool. Adapter
    /// failures come back as `Ok` error envelopes.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolFailure> {
        let descriptor = self
            .catalog
            .get(name)
            .ok_or_else(|| ToolFailure::execution(format!("Unknown tool '{name}'")))?;
        let arguments = descriptor.validate(&arguments).map_err(|err| {
            ToolFailure::execution(format!("Invalid arguments for '{}': {err}", descriptor.name))
        })?;
        debug!(tool = descriptor.name, "dispatching tool");

        match descriptor.name {
            COCKPIT_VIEW_TOOL => {
                let request: ViewRequest = decode(descriptor.name, Value::Object(arguments))?;
                Ok(self.view.get_system_view(&request).await)
            }
            FLEXI_SEARCH_TOOL => {
                let request: SearchRequest = decode(descriptor.name, Value::Object(arguments))?;
                self.search.run(&request).await
            }
            other => Err(ToolFailure::execution(format!(
                "Tool '{other}' has no handler"
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolFailure> {
    serde_json::from_value(arguments)
        .map_err(|err| ToolFailure::execution(format!("Invalid arguments for '{tool}': {err}")))
}

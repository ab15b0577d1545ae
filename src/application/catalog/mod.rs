//! Tool catalog: the fixed set of descriptors offered to the model.

mod definitions;
mod descriptor;

pub use definitions::{COCKPIT_VIEW_TOOL, FLEXI_SEARCH_TOOL, landscape_tools};
pub use descriptor::{ArgumentError, ParamType, ParameterSpec, ToolDescriptor};

use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(pos, tool)| (tool.name.to_lowercase(), pos))
            .collect();
        Self { tools, index }
    }

    /// Catalog shipped with this deployment.
    pub fn landscape() -> Self {
        Self::new(landscape_tools())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index
            .get(&name.to_lowercase())
            .map(|pos| &self.tools[*pos])
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|tool| tool.name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn function_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDescriptor::function_schema).collect()
    }

    /// Compact listing embedded in instructions for structured decisions.
    pub fn describe(&self) -> String {
        let mut lines = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            let schema = serde_json::to_string(&tool.input_schema()).unwrap_or_default();
            lines.push(format!(
                "- {}: {} Input schema: {}",
                tool.name, tool.description, schema
            ));
        }
        lines.join("\n")
    }
}

use super::error::backend_kind;
use super::interface::{InventorySearch, OutputFormat, SearchResponse};
use super::payload::EntryShape;
use crate::domain::ToolFailure;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

const FILTER_SEPARATOR: char = '|';

/// Arguments of the inventory search tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchRequest {
    pub fields: Vec<String>,
    #[serde(default)]
    pub filters: Option<Vec<String>>,
    #[serde(default)]
    pub otype: Option<String>,
}

impl SearchRequest {
    pub fn format(&self) -> Result<OutputFormat, ToolFailure> {
        match self.otype.as_deref() {
            None => Ok(OutputFormat::Json),
            Some(raw) => OutputFormat::parse(raw).ok_or_else(|| {
                ToolFailure::execution(format!("unsupported output format '{raw}'"))
            }),
        }
    }

    /// Comma-joined fields followed by filters. Filters are combined with AND
    /// by the backend; there is no OR encoding.
    pub fn query(&self) -> Result<String, ToolFailure> {
        let fields: Vec<&str> = self
            .fields
            .iter()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
            .collect();
        if fields.is_empty() {
            return Err(ToolFailure::execution("at least one field is required"));
        }

        let mut parts: Vec<&str> = fields;
        for filter in self.filters.iter().flatten() {
            let filter = filter.trim();
            match filter.split_once(FILTER_SEPARATOR) {
                Some((field, value)) if !field.trim().is_empty() && !value.trim().is_empty() => {
                    parts.push(filter)
                }
                _ => {
                    return Err(ToolFailure::execution(format!(
                        "invalid filter '{filter}', expected 'field|value'"
                    )));
                }
            }
        }
        Ok(parts.join(","))
    }
}

/// The `search_system_flexi` tool.
#[derive(Clone)]
pub struct FlexiSearchTool {
    search: Arc<dyn InventorySearch>,
}

impl FlexiSearchTool {
    pub fn new(search: Arc<dyn InventorySearch>) -> Self {
        Self { search }
    }

    pub async fn run(&self, request: &SearchRequest) -> Result<Value, ToolFailure> {
        let format = request.format()?;
        let query = request.query()?;
        info!(query = query.as_str(), otype = %format, "running flexi search");

        let response = self
            .search
            .search(&query, format)
            .await
            .map_err(|err| ToolFailure {
                kind: backend_kind(&err),
                message: format!("Flexi search failed: {err}"),
            })?;

        Ok(match response {
            SearchResponse::Json(body) => {
                let shape = EntryShape::detect(body);
                if shape.is_recognized() {
                    debug!(count = shape.entries().len(), "flexi entries");
                }
                shape.into_value()
            }
            SearchResponse::Text(text) => json!({ "format": format.as_str(), "text": text }),
        })
    }
}

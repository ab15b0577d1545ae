use crate::infrastructure::backend::BackendError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Output formats accepted by the inventory search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "xml" => Some(OutputFormat::Xml),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by the inventory search backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    Json(Value),
    Text(String),
}

/// Inventory search backend (Flexi report).
#[async_trait]
pub trait InventorySearch: Send + Sync {
    async fn search(&self, query: &str, format: OutputFormat)
    -> Result<SearchResponse, BackendError>;
}

/// Cockpit detail backend.
#[async_trait]
pub trait CockpitSource: Send + Sync {
    async fn fetch(&self, objectid: &str, systype: &str) -> Result<Value, BackendError>;
}

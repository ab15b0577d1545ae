use crate::domain::ErrorKind;
use crate::infrastructure::backend::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No system found for SID '{sid}'")]
    NotFound { sid: String },
    #[error("All systems for SID '{sid}' are canceled")]
    AllCanceled { sid: String },
    #[error("Resolver returned no objectid for SID '{sid}'")]
    MissingObjectId { sid: String },
    #[error("Inventory search failed for SID '{sid}': {source}")]
    Upstream {
        sid: String,
        #[source]
        source: BackendError,
    },
}

impl ResolveError {
    pub fn sid(&self) -> &str {
        match self {
            ResolveError::NotFound { sid }
            | ResolveError::AllCanceled { sid }
            | ResolveError::MissingObjectId { sid }
            | ResolveError::Upstream { sid, .. } => sid,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NotFound { .. } => ErrorKind::NotFound,
            ResolveError::AllCanceled { .. } => ErrorKind::AllCanceled,
            ResolveError::MissingObjectId { .. } => ErrorKind::ToolExecution,
            ResolveError::Upstream { source, .. } => backend_kind(source),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("cockpit payload is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },
}

pub(crate) fn backend_kind(error: &BackendError) -> ErrorKind {
    if error.is_protocol() {
        ErrorKind::UpstreamProtocol
    } else {
        ErrorKind::ToolExecution
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

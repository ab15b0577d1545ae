use super::DEFAULT_SYSTEM_TYPE;
use super::error::{NormalizeError, ResolveError, backend_kind};
use super::interface::CockpitSource;
use super::normalizer::normalize;
use super::resolver::{EntityResolver, ResolvedEntity};
use crate::domain::ErrorKind;
use crate::infrastructure::backend::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info, warn};

const PAYLOAD_PREVIEW_LIMIT: usize = 800;

/// Arguments of the SID overview tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub sid: String,
    #[serde(default)]
    pub systype: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStep {
    Resolve,
    Fetch,
    Normalize,
}

/// Failure of one adapter step, rendered as the tool's error envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewFailure {
    pub error: String,
    pub step: ViewStep,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_preview: Option<String>,
}

impl ViewFailure {
    fn resolve(err: &ResolveError) -> Self {
        Self {
            error: format!(
                "Failed to resolve object id from SID '{}': {err}",
                err.sid()
            ),
            step: ViewStep::Resolve,
            kind: err.kind(),
            payload_preview: None,
        }
    }

    fn fetch(objectid: &str, err: &BackendError) -> Self {
        Self {
            error: format!("Failed to fetch cockpit for objectid {objectid}: {err}"),
            step: ViewStep::Fetch,
            kind: backend_kind(err),
            payload_preview: None,
        }
    }

    fn not_an_object(raw: &Value) -> Self {
        let text = match raw {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            error: "Cockpit payload is not a JSON object".to_string(),
            step: ViewStep::Fetch,
            kind: ErrorKind::UpstreamProtocol,
            payload_preview: Some(text.chars().take(PAYLOAD_PREVIEW_LIMIT).collect()),
        }
    }

    fn normalize(err: &NormalizeError) -> Self {
        Self {
            error: format!("Failed to normalize cockpit payload: {err}"),
            step: ViewStep::Normalize,
            kind: ErrorKind::ToolExecution,
            payload_preview: None,
        }
    }

    pub fn to_envelope(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "error": self.error }))
    }
}

/// SID overview tool: resolve, fetch and normalize. Every call recomputes
/// all three steps.
#[derive(Clone)]
pub struct SystemViewAdapter {
    resolver: EntityResolver,
    cockpit: Arc<dyn CockpitSource>,
    dump_dir: Option<PathBuf>,
}

impl SystemViewAdapter {
    pub fn new(resolver: EntityResolver, cockpit: Arc<dyn CockpitSource>) -> Self {
        Self {
            resolver,
            cockpit,
            dump_dir: None,
        }
    }

    /// Writes each raw cockpit payload into `dir` for inspection.
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// Returns the view, or the error envelope when any step fails.
    pub async fn get_system_view(&self, request: &ViewRequest) -> Value {
        match self.view(request).await {
            Ok(view) => view,
            Err(failure) => failure.to_envelope(),
        }
    }

    pub async fn view(&self, request: &ViewRequest) -> Result<Value, ViewFailure> {
        let started = Instant::now();
        let sid = request.sid.trim();
        let hint = request.systype.as_deref();
        info!(sid, systype = ?hint, sections = ?request.sections, "starting system view");

        let step_started = Instant::now();
        let resolved = self.resolver.resolve(sid, hint).await.map_err(|err| {
            error!(sid, step = "resolve", %err, "resolve failed");
            ViewFailure::resolve(&err)
        })?;
        info!(
            sid,
            objectid = resolved.objectid.as_str(),
            step = "resolve",
            elapsed_ms = step_started.elapsed().as_millis() as u64,
            "resolved SID"
        );

        let systype = fetch_system_type(hint, &resolved);
        let step_started = Instant::now();
        let raw = self
            .cockpit
            .fetch(&resolved.objectid, systype)
            .await
            .map_err(|err| {
                error!(sid, objectid = resolved.objectid.as_str(), step = "fetch", %err, "fetch failed");
                ViewFailure::fetch(&resolved.objectid, &err)
            })?;
        info!(
            sid,
            objectid = resolved.objectid.as_str(),
            systype,
            step = "fetch",
            elapsed_ms = step_started.elapsed().as_millis() as u64,
            "fetched cockpit payload"
        );

        if let Some(dir) = &self.dump_dir {
            dump_payload(dir, sid, &resolved.objectid, &raw).await;
        }

        if !raw.is_object() {
            let failure = ViewFailure::not_an_object(&raw);
            error!(sid, step = "fetch", preview = ?failure.payload_preview, "cockpit payload is not a JSON object");
            return Err(failure);
        }

        let step_started = Instant::now();
        let view = normalize(&raw, request.sections.as_deref()).map_err(|err| {
            error!(sid, step = "normalize", %err, "normalize failed");
            ViewFailure::normalize(&err)
        })?;
        debug!(
            sid,
            step = "normalize",
            sections = ?view.section_names().collect::<Vec<_>>(),
            elapsed_ms = step_started.elapsed().as_millis() as u64,
            "normalized cockpit view"
        );

        let mut output = view.into_map();
        output.insert(
            "_resolved".to_string(),
            serde_json::to_value(&resolved).unwrap_or(Value::Null),
        );
        info!(
            sid,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completed system view"
        );
        Ok(Value::Object(output))
    }
}

/// Resolved type first. The hint only fills in for records without a type,
/// since the resolver drops a hint that matched no record.
fn fetch_system_type<'a>(hint: Option<&'a str>, resolved: &'a ResolvedEntity) -> &'a str {
    resolved
        .systemtype
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| hint.map(str::trim).filter(|value| !value.is_empty()))
        .unwrap_or(DEFAULT_SYSTEM_TYPE)
}

async fn dump_payload(dir: &Path, sid: &str, objectid: &str, raw: &Value) {
    let path = dir.join(format!("cockpit_debug_{sid}_{objectid}.json"));
    let body = match raw {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    let result = match fs::create_dir_all(dir).await {
        Ok(()) => fs::write(&path, body).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => info!(path = %path.display(), "saved raw cockpit payload"),
        Err(err) => warn!(path = %path.display(), %err, "failed to save debug payload"),
    }
}

use super::error::ResolveError;
use super::fields::{FieldRecord, RecordField};
use super::interface::{InventorySearch, OutputFormat, SearchResponse};
use super::payload::EntryShape;
use crate::infrastructure::backend::BackendError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const RESOLVE_FIELDS: [&str; 5] = ["id", "sid", "systemtype", "landscape", "status"];
const RETIRED_STATUSES: [&str; 2] = ["canceled", "cancelled"];

/// Canonical record a SID resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub objectid: String,
    pub sid: String,
    pub systemtype: Option<String>,
    pub landscape: Option<String>,
    pub status: String,
}

/// Query variants from most to least specific. Field support differs between
/// backend versions, so narrower queries are tried later.
pub fn query_variants(sid: &str) -> Vec<String> {
    let filter = format!("sid|{sid}");
    vec![
        format!("{},{filter}", RESOLVE_FIELDS.join(",")),
        format!("id,{filter}"),
        filter,
    ]
}

fn is_retired(status: Option<&str>) -> bool {
    status.is_some_and(|status| {
        RETIRED_STATUSES
            .iter()
            .any(|retired| status.eq_ignore_ascii_case(retired))
    })
}

/// Resolves SIDs to cockpit object ids through the inventory search.
#[derive(Clone)]
pub struct EntityResolver {
    search: Arc<dyn InventorySearch>,
}

impl EntityResolver {
    pub fn new(search: Arc<dyn InventorySearch>) -> Self {
        Self { search }
    }

    pub async fn resolve(
        &self,
        sid: &str,
        systype_hint: Option<&str>,
    ) -> Result<ResolvedEntity, ResolveError> {
        let records = self.candidates(sid).await?;
        select(sid, records, systype_hint)
    }

    /// First non-empty record set across the query variants.
    async fn candidates(&self, sid: &str) -> Result<Vec<FieldRecord>, ResolveError> {
        let mut last_error: Option<BackendError> = None;
        let mut answered = false;

        for query in query_variants(sid) {
            let response = match self.search.search(&query, OutputFormat::Json).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(sid, query = query.as_str(), %err, "resolver query failed");
                    last_error = Some(err);
                    continue;
                }
            };
            answered = true;

            let shape = match response {
                SearchResponse::Json(body) => EntryShape::detect(body),
                SearchResponse::Text(_) => continue,
            };
            if !shape.is_recognized() {
                debug!(sid, query = query.as_str(), "unrecognized search response shape");
            }
            let records: Vec<FieldRecord> = shape
                .entries()
                .iter()
                .filter_map(FieldRecord::from_entry)
                .collect();
            if !records.is_empty() {
                debug!(sid, query = query.as_str(), count = records.len(), "resolver candidates");
                return Ok(records);
            }
        }

        match last_error {
            Some(source) if !answered => Err(ResolveError::Upstream {
                sid: sid.to_string(),
                source,
            }),
            _ => Err(ResolveError::NotFound {
                sid: sid.to_string(),
            }),
        }
    }
}

/// Applies the type hint and the retired-status filter, then picks the first
/// remaining record.
pub fn select(
    sid: &str,
    records: Vec<FieldRecord>,
    systype_hint: Option<&str>,
) -> Result<ResolvedEntity, ResolveError> {
    if records.is_empty() {
        return Err(ResolveError::NotFound {
            sid: sid.to_string(),
        });
    }

    let mut candidates = records;
    if let Some(hint) = systype_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
        let matching: Vec<FieldRecord> = candidates
            .iter()
            .filter(|record| {
                record
                    .get(RecordField::SystemType)
                    .is_some_and(|systype| systype.eq_ignore_ascii_case(hint))
            })
            .cloned()
            .collect();
        if matching.is_empty() {
            debug!(sid, hint, "system type hint matches no record, ignoring it");
        } else {
            candidates = matching;
        }
    }

    let best = candidates
        .into_iter()
        .find(|record| !is_retired(record.get(RecordField::Status)))
        .ok_or_else(|| ResolveError::AllCanceled {
            sid: sid.to_string(),
        })?;

    let objectid = best
        .get(RecordField::Id)
        .ok_or_else(|| ResolveError::MissingObjectId {
            sid: sid.to_string(),
        })?;

    Ok(ResolvedEntity {
        objectid: objectid.to_string(),
        sid: best.get(RecordField::Sid).unwrap_or(sid).to_string(),
        systemtype: best.get(RecordField::SystemType).map(str::to_string),
        landscape: best.get(RecordField::Landscape).map(str::to_string),
        status: best
            .get(RecordField::Status)
            .unwrap_or_default()
            .to_string(),
    })
}

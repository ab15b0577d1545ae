//! System landscape tools: SID resolution, cockpit view normalization and the
//! inventory search.

mod cockpit;
mod error;
mod fields;
mod host;
mod interface;
mod normalizer;
mod payload;
mod resolver;
mod search;

pub use cockpit::{SystemViewAdapter, ViewFailure, ViewRequest, ViewStep};
pub use error::{NormalizeError, ResolveError};
pub use fields::{FieldRecord, RecordField};
pub use host::{DEBUG_DUMP_ENV, LandscapeToolHost};
pub use interface::{CockpitSource, InventorySearch, OutputFormat, SearchResponse};
pub use normalizer::{NormalizedView, Section, normalize, selected_sections};
pub use payload::EntryShape;
pub use resolver::{EntityResolver, ResolvedEntity, query_variants};
pub use search::{FlexiSearchTool, SearchRequest};

/// System type used for cockpit fetches when neither the caller nor the
/// resolved record supplies one.
pub const DEFAULT_SYSTEM_TYPE: &str = "ABAPSystem";

pub const SYSTEM_TYPES: &[&str] = &[DEFAULT_SYSTEM_TYPE];

pub const SECTION_NAMES: &[&str] = &[
    "system_details",
    "availability",
    "program_landscape",
    "Clients",
    "Software_Components",
];

pub const OUTPUT_FORMATS: &[&str] = &["json", "xml", "csv"];

//! Tool definitions offered for every turn of this deployment.

use super::descriptor::{ParamType, ParameterSpec, ToolDescriptor};
use crate::application::landscape::{OUTPUT_FORMATS, SECTION_NAMES, SYSTEM_TYPES};

pub const COCKPIT_VIEW_TOOL: &str = "cockpit_get_view_by_sid";
pub const FLEXI_SEARCH_TOOL: &str = "search_system_flexi";

pub fn landscape_tools() -> Vec<ToolDescriptor> {
    vec![flexi_search(), cockpit_view()]
}

fn flexi_search() -> ToolDescriptor {
    ToolDescriptor {
        name: FLEXI_SEARCH_TOOL,
        description: "Query the Flexi report API to search system landscape data. Select which \
                      fields to retrieve and apply filters to narrow results. Each filter uses \
                      the pattern 'field|value'; multiple filters are combined with AND.",
        parameters: vec![
            ParameterSpec::required(
                "fields",
                ParamType::Array(Box::new(ParamType::String)),
                "Field names to include in the result. Supports dot notation and aliases via \
                 'field as Alias', e.g. ['SID', 'systemType', 'status', 'customer.name'].",
            ),
            ParameterSpec::optional(
                "filters",
                ParamType::Array(Box::new(ParamType::String)),
                "Filters in 'field|value' format, e.g. ['status|Parked', 'systemType|DEV']. \
                 Do not include SID filters when querying multiple systems.",
            ),
            ParameterSpec::optional("otype", ParamType::String, "Output format (default: json).")
                .one_of(OUTPUT_FORMATS),
        ],
        strict: true,
    }
}

fn cockpit_view() -> ToolDescriptor {
    ToolDescriptor {
        name: COCKPIT_VIEW_TOOL,
        description: "Resolve a SID to its object id and return a summarized system cockpit \
                      view (system details, availability, program/landscape, clients, software \
                      components). Use this when the user asks for an overview of a single \
                      system, e.g. 'Show ERX overview'.",
        parameters: vec![
            ParameterSpec::required("sid", ParamType::String, "System SID, e.g. 'ERX' or 'ADL'."),
            ParameterSpec::optional(
                "systype",
                ParamType::String,
                "Optional system type hint to disambiguate the SID.",
            )
            .one_of(SYSTEM_TYPES),
            ParameterSpec::optional(
                "sections",
                ParamType::Array(Box::new(ParamType::String)),
                "Optional: which sections to include. If omitted, all.",
            )
            .one_of(SECTION_NAMES),
        ],
        strict: true,
    }
}

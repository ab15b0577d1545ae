use super::error::{NormalizeError, json_type_name};
use serde_json::{Map, Value, json};

const MAIN_INFO: &str = "Main System Info";
const ASSIGNED_PROGRAMS: &str = "Assigned Programs";

/// Sections a normalized cockpit view may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    SystemDetails,
    Availability,
    ProgramLandscape,
    Clients,
    SoftwareComponents,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::SystemDetails,
        Section::Availability,
        Section::ProgramLandscape,
        Section::Clients,
        Section::SoftwareComponents,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::SystemDetails => "system_details",
            Section::Availability => "availability",
            Section::ProgramLandscape => "program_landscape",
            Section::Clients => "Clients",
            Section::SoftwareComponents => "Software_Components",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.name() == name)
    }

    fn build(self, raw: &Map<String, Value>) -> Value {
        match self {
            Section::SystemDetails => system_details(raw),
            Section::Availability => availability(raw),
            Section::ProgramLandscape => program_landscape(raw),
            Section::Clients => json!({ "clients": field(raw, "Clients") }),
            Section::SoftwareComponents => {
                json!({ "software_components": field(raw, "Software Components") })
            }
        }
    }
}

/// Section-keyed summary of one cockpit payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedView {
    sections: Map<String, Value>,
}

impl NormalizedView {
    pub fn get(&self, section: Section) -> Option<&Value> {
        self.sections.get(section.name())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.sections
    }
}

/// Requested sections intersected with the known set, in canonical order.
/// An absent or empty selector means every section.
pub fn selected_sections(selector: Option<&[String]>) -> Vec<Section> {
    match selector {
        Some(names) if !names.is_empty() => Section::ALL
            .into_iter()
            .filter(|section| names.iter().any(|name| name == section.name()))
            .collect(),
        _ => Section::ALL.to_vec(),
    }
}

/// Projects a raw cockpit payload into the stable section layout. Missing raw
/// keys come out as `null`.
pub fn normalize(raw: &Value, selector: Option<&[String]>) -> Result<NormalizedView, NormalizeError> {
    let raw = raw.as_object().ok_or(NormalizeError::NotAnObject {
        found: json_type_name(raw),
    })?;
    let sections = selected_sections(selector)
        .into_iter()
        .map(|section| (section.name().to_string(), section.build(raw)))
        .collect();
    Ok(NormalizedView { sections })
}

fn field(object: &Map<String, Value>, key: &str) -> Value {
    object.get(key).cloned().unwrap_or(Value::Null)
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    })
}

fn sub_object<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    raw.get(key).and_then(Value::as_object)
}

fn system_details(raw: &Map<String, Value>) -> Value {
    let empty = Map::new();
    let main = sub_object(raw, MAIN_INFO).unwrap_or(&empty);
    json!({
        "sid": field(raw, "SID"),
        "description": field(raw, "Description"),
        "status": field(raw, "Availability Tooltip"),
        "flp_connections": field(raw, "FLPConnections"),
        "lpd_connections": field(raw, "LPDConnections"),
        "r3logon_link": field(raw, "R3Logon Link"),
        "type": field(main, "System Type"),
        "product_version": field(main, "Product Version"),
        "db_host": field(main, "DB_host"),
        "hdb_instance": field(main, "HDB Instance"),
        "db_type": field(main, "DB Type"),
        "hana_version": field(main, "HANA Version"),
        "hana_release": field(main, "HANA Release"),
        "sism_link": field(main, "SISM Link"),
        "basis_release": field(main, "Basis Release"),
        "app_server": field(main, "AppServer"),
        "created_on": field(main, "CreatedOn"),
    })
}

fn availability(raw: &Map<String, Value>) -> Value {
    json!({
        "sysmon_notes": field(raw, "Sysmon Notes"),
        "snow_landscape_down_tickets": raw.get("SNOW Landscape Down Tickets").cloned().unwrap_or(json!(0)),
        "open_snow_tickets": raw.get("Open SNOW Tickets").cloned().unwrap_or(json!(0)),
    })
}

fn program_landscape(raw: &Map<String, Value>) -> Value {
    let empty = Map::new();
    let main = sub_object(raw, MAIN_INFO).unwrap_or(&empty);
    let programs = sub_object(raw, ASSIGNED_PROGRAMS).unwrap_or(&empty);

    let mut responsibles = Vec::new();
    if let Some(lead) = present(programs, "Prog Lead").or_else(|| present(main, "ProgramLead")) {
        responsibles.push(json!({ "role": "Prog Lead", "name": lead }));
    }
    if let Some(plo) = present(main, "PLO").or_else(|| present(raw, "PLO")) {
        responsibles.push(json!({ "role": "PLO", "name": plo }));
    }

    let landscape = present(raw, "LandscapeName")
        .or_else(|| present(raw, "Landscape"))
        .cloned()
        .unwrap_or(Value::Null);

    json!({
        "landscape_name": landscape,
        "responsibles": responsibles,
        "upcoming_milestone": field(raw, "Upcoming Milestones"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erx_payload() -> Value {
        json!({
            "SID": "ERX",
            "Availability Tooltip": "Green",
            "Main System Info": {"System Type": "ABAP"}
        })
    }

    #[test]
    fn system_details_only() {
        let selector = vec!["system_details".to_string()];
        let view = normalize(&erx_payload(), Some(&selector)).unwrap();
        assert_eq!(view.section_names().collect::<Vec<_>>(), vec!["system_details"]);

        let details = view.get(Section::SystemDetails).unwrap();
        assert_eq!(details["sid"], json!("ERX"));
        assert_eq!(details["status"], json!("Green"));
        assert_eq!(details["type"], json!("ABAP"));
        assert_eq!(details["description"], Value::Null);
        assert_eq!(details["db_host"], Value::Null);
    }

    #[test]
    fn empty_selector_means_all_sections() {
        let all = normalize(&erx_payload(), None).unwrap();
        assert_eq!(all.len(), Section::ALL.len());
        let empty: Vec<String> = Vec::new();
        assert_eq!(normalize(&erx_payload(), Some(&empty)).unwrap(), all);
    }

    #[test]
    fn unknown_section_names_are_dropped() {
        let selector = vec!["availability".to_string(), "main_info".to_string()];
        let view = normalize(&erx_payload(), Some(&selector)).unwrap();
        assert_eq!(view.section_names().collect::<Vec<_>>(), vec!["availability"]);
        assert!(view.section_names().all(|name| name != "_resolved"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = json!({
            "SID": "ADL",
            "Clients": ["000", "100"],
            "Software Components": [{"name": "SAP_BASIS"}],
            "PLO": "someone",
        });
        let selector = vec!["Clients".to_string(), "program_landscape".to_string()];
        let first = normalize(&raw, Some(&selector)).unwrap();
        let second = normalize(&raw, Some(&selector)).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.get(Section::Clients),
            Some(&json!({"clients": ["000", "100"]}))
        );
    }

    #[test]
    fn availability_counts_default_to_zero() {
        let view = normalize(&json!({"Sysmon Notes": "ok"}), None).unwrap();
        let availability = view.get(Section::Availability).unwrap();
        assert_eq!(availability["snow_landscape_down_tickets"], json!(0));
        assert_eq!(availability["open_snow_tickets"], json!(0));
        assert_eq!(availability["sysmon_notes"], json!("ok"));
    }

    #[test]
    fn responsibles_are_added_only_when_present() {
        let view = normalize(&json!({"Landscape": "ERP"}), None).unwrap();
        let program = view.get(Section::ProgramLandscape).unwrap();
        assert_eq!(program["responsibles"], json!([]));
        assert_eq!(program["landscape_name"], json!("ERP"));

        let raw = json!({
            "LandscapeName": "ERP Dev",
            "Assigned Programs": {"Prog Lead": "Ada"},
            "Main System Info": {"PLO": "Grace"},
        });
        let view = normalize(&raw, None).unwrap();
        let program = view.get(Section::ProgramLandscape).unwrap();
        assert_eq!(
            program["responsibles"],
            json!([
                {"role": "Prog Lead", "name": "Ada"},
                {"role": "PLO", "name": "Grace"},
            ])
        );
        assert_eq!(program["landscape_name"], json!("ERP Dev"));
    }

    #[test]
    fn lead_falls_back_to_main_info() {
        let raw = json!({"Main System Info": {"ProgramLead": "Linus"}});
        let view = normalize(&raw, None).unwrap();
        let program = view.get(Section::ProgramLandscape).unwrap();
        assert_eq!(program["responsibles"], json!([{"role": "Prog Lead", "name": "Linus"}]));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = normalize(&json!("<html>"), None).unwrap_err();
        assert_eq!(err, NormalizeError::NotAnObject { found: "string" });
    }
}

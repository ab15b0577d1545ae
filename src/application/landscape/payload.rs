use serde_json::Value;

/// Known layouts of an inventory search response.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryShape {
    /// Top-level JSON array.
    List(Vec<Value>),
    /// JSON string that itself encodes an array.
    EncodedList(Vec<Value>),
    /// `data.variable.Entries`
    VariableEntries(Vec<Value>),
    /// `data.Entries`
    DataEntries(Vec<Value>),
    /// `Entries`
    Entries(Vec<Value>),
    Unrecognized(Value),
}

type ShapeAdapter = fn(&Value) -> Option<&Vec<Value>>;

const NESTED_LOCATIONS: [(ShapeAdapter, fn(Vec<Value>) -> EntryShape); 3] = [
    (variable_entries, EntryShape::VariableEntries),
    (data_entries, EntryShape::DataEntries),
    (top_entries, EntryShape::Entries),
];

fn variable_entries(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("variable")?.get("Entries")?.as_array()
}

fn data_entries(body: &Value) -> Option<&Vec<Value>> {
    body.get("data")?.get("Entries")?.as_array()
}

fn top_entries(body: &Value) -> Option<&Vec<Value>> {
    body.get("Entries")?.as_array()
}

impl EntryShape {
    pub fn detect(body: Value) -> Self {
        match body {
            Value::Array(entries) => EntryShape::List(entries),
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(entries)) => EntryShape::EncodedList(entries),
                _ => EntryShape::Unrecognized(Value::String(text)),
            },
            Value::Object(_) => Self::detect_nested(body),
            other => EntryShape::Unrecognized(other),
        }
    }

    // An empty list at a more specific location does not hide entries
    // found further down.
    fn detect_nested(body: Value) -> Self {
        let mut first_empty = None;
        for (locate, build) in NESTED_LOCATIONS {
            match locate(&body) {
                Some(entries) if !entries.is_empty() => return build(entries.clone()),
                Some(_) if first_empty.is_none() => first_empty = Some(build),
                _ => {}
            }
        }
        match first_empty {
            Some(build) => build(Vec::new()),
            None => EntryShape::Unrecognized(body),
        }
    }

    pub fn entries(&self) -> &[Value] {
        match self {
            EntryShape::List(entries)
            | EntryShape::EncodedList(entries)
            | EntryShape::VariableEntries(entries)
            | EntryShape::DataEntries(entries)
            | EntryShape::Entries(entries) => entries,
            EntryShape::Unrecognized(_) => &[],
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EntryShape::Unrecognized(_))
    }

    pub fn into_entries(self) -> Vec<Value> {
        match self {
            EntryShape::List(entries)
            | EntryShape::EncodedList(entries)
            | EntryShape::VariableEntries(entries)
            | EntryShape::DataEntries(entries)
            | EntryShape::Entries(entries) => entries,
            EntryShape::Unrecognized(_) => Vec::new(),
        }
    }

    /// Value handed back to the model: the entry list, or an unrecognized
    /// body unchanged.
    pub fn into_value(self) -> Value {
        match self {
            EntryShape::Unrecognized(body) => body,
            other => Value::Array(other.into_entries()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_each_known_layout() {
        let entry = json!({"sid": "ERX"});
        assert!(matches!(
            EntryShape::detect(json!([entry.clone()])),
            EntryShape::List(list) if list.len() == 1
        ));
        assert!(matches!(
            EntryShape::detect(json!("[{\"sid\":\"ERX\"}]")),
            EntryShape::EncodedList(list) if list.len() == 1
        ));
        assert!(matches!(
            EntryShape::detect(json!({"data": {"variable": {"Entries": [entry.clone()]}}})),
            EntryShape::VariableEntries(_)
        ));
        assert!(matches!(
            EntryShape::detect(json!({"data": {"Entries": [entry.clone()]}})),
            EntryShape::DataEntries(_)
        ));
        assert!(matches!(
            EntryShape::detect(json!({"Entries": [entry]})),
            EntryShape::Entries(_)
        ));
    }

    #[test]
    fn empty_specific_location_falls_through() {
        let body = json!({
            "data": {"variable": {"Entries": []}, "Entries": [{"sid": "ADL"}]}
        });
        let shape = EntryShape::detect(body);
        assert!(matches!(shape, EntryShape::DataEntries(_)));
        assert_eq!(shape.entries().len(), 1);
    }

    #[test]
    fn unknown_layouts_are_kept_verbatim() {
        let body = json!({"result": {"rows": []}});
        let shape = EntryShape::detect(body.clone());
        assert!(!shape.is_recognized());
        assert!(shape.entries().is_empty());
        assert_eq!(shape.into_value(), body);

        let shape = EntryShape::detect(json!("not a list"));
        assert_eq!(shape.into_value(), json!("not a list"));
    }
}

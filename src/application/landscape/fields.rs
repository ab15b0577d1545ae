//! Case-insensitive field aliases for inventory search records.
//!
//! The search backend has returned the same logical field under several
//! names over time. Each record is read once into a [`FieldRecord`].

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Id,
    Sid,
    SystemType,
    Landscape,
    Status,
}

impl RecordField {
    const ALL: [RecordField; 5] = [
        RecordField::Id,
        RecordField::Sid,
        RecordField::SystemType,
        RecordField::Landscape,
        RecordField::Status,
    ];

    /// Lowercase aliases, most preferred first.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            RecordField::Id => &["id", "objectid", "sismkey"],
            RecordField::Sid => &["sid"],
            RecordField::SystemType => &["systemtype", "system_type", "system type"],
            RecordField::Landscape => &["landscape"],
            RecordField::Status => &["status"],
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn lookup(key: &str) -> Option<(RecordField, usize)> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find_map(|field| {
            field
                .aliases()
                .iter()
                .position(|alias| *alias == key)
                .map(|rank| (field, rank))
        })
    }
}

/// The aliased fields of one search record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    values: [Option<(usize, String)>; 5],
}

impl FieldRecord {
    /// Returns `None` when the entry is not a JSON object.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        let mut record = FieldRecord::default();
        for (key, value) in object {
            let Some((field, rank)) = RecordField::lookup(key) else {
                continue;
            };
            let Some(text) = scalar_text(value) else {
                continue;
            };
            let slot = &mut record.values[field.index()];
            if slot.as_ref().is_none_or(|(current, _)| rank < *current) {
                *slot = Some((rank, text));
            }
        }
        Some(record)
    }

    pub fn get(&self, field: RecordField) -> Option<&str> {
        self.values[field.index()]
            .as_ref()
            .map(|(_, text)| text.as_str())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

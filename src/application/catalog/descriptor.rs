use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<ParamType>),
}

impl ParamType {
    fn schema_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array(_) => "array",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array(_) => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
    /// Allowed values for string parameters, or for the items of a string array.
    pub allowed: Option<&'static [&'static str]>,
}

impl ParameterSpec {
    pub fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            allowed: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn schema(&self) -> Value {
        let mut schema = json!({
            "type": self.kind.schema_name(),
            "description": self.description,
        });
        let enum_values = self
            .allowed
            .map(|values| Value::from(values.iter().map(|v| Value::from(*v)).collect::<Vec<_>>()));
        match &self.kind {
            ParamType::Array(item) => {
                let mut items = json!({ "type": item.schema_name() });
                if let Some(values) = enum_values {
                    items["enum"] = values;
                }
                schema["items"] = items;
            }
            _ => {
                if let Some(values) = enum_values {
                    schema["enum"] = values;
                }
            }
        }
        schema
    }

    fn check(&self, value: &Value) -> Result<(), ArgumentError> {
        if !self.kind.accepts(value) {
            return Err(ArgumentError::WrongType {
                parameter: self.name.to_string(),
                expected: self.kind.schema_name(),
            });
        }
        match (&self.kind, value) {
            (ParamType::Array(item), Value::Array(entries)) => {
                for entry in entries {
                    if !item.accepts(entry) {
                        return Err(ArgumentError::WrongType {
                            parameter: self.name.to_string(),
                            expected: item.schema_name(),
                        });
                    }
                    self.check_allowed(entry)?;
                }
                Ok(())
            }
            _ => self.check_allowed(value),
        }
    }

    fn check_allowed(&self, value: &Value) -> Result<(), ArgumentError> {
        let (Some(allowed), Some(text)) = (self.allowed, value.as_str()) else {
            return Ok(());
        };
        if allowed.contains(&text) {
            Ok(())
        } else {
            Err(ArgumentError::NotAllowed {
                parameter: self.name.to_string(),
                value: text.to_string(),
                allowed: allowed.join(", "),
            })
        }
    }
}

/// Static description of a callable tool, offered to the model and used to
/// validate arguments before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
    /// Strict descriptors reject arguments they do not declare.
    pub strict: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required parameter '{0}'")]
    Missing(String),
    #[error("unexpected parameter '{0}'")]
    Unexpected(String),
    #[error("parameter '{parameter}' must be of type {expected}")]
    WrongType {
        parameter: String,
        expected: &'static str,
    },
    #[error("parameter '{parameter}' has value '{value}', expected one of: {allowed}")]
    NotAllowed {
        parameter: String,
        value: String,
        allowed: String,
    },
}

impl ToolDescriptor {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": !self.strict,
        })
    }

    /// Function-tool form used by chat-completion style APIs.
    pub fn function_schema(&self) -> Value {
        // Strict function calling requires every property to be listed as required.
        let strict = self.strict && self.parameters.iter().all(|p| p.required);
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema(),
                "strict": strict,
            }
        })
    }

    /// Validates raw arguments; `null` is treated as an empty object.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>, ArgumentError> {
        let map = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            _ => return Err(ArgumentError::NotAnObject),
        };

        for spec in &self.parameters {
            match map.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ArgumentError::Missing(spec.name.to_string()));
                }
                None | Some(Value::Null) => {}
                Some(value) => spec.check(value)?,
            }
        }

        if self.strict {
            if let Some(extra) = map.keys().find(|key| self.parameter(key).is_none()) {
                return Err(ArgumentError::Unexpected(extra.clone()));
            }
        }

        Ok(map)
    }
}

//! Function specs as advertised to the reasoner
//!
//! Specs are derived from the `JsonSchema` of each argument struct and then
//! flattened into the fixed shape the reasoner understands:
//!
//! ```json
//! {"name": "...", "description": "...",
//!  "parameters": {"required": [...], "type": "object",
//!                 "properties": {"field": {"type": "...", "description": "..."}}}}
//! ```

use crate::{Error, Result};
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// JSON type of one declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn parse(name: &str) -> Option<ParamType> {
        match name {
            "string" => Some(ParamType::String),
            "integer" => Some(ParamType::Integer),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    /// Read the type out of a generated property schema.
    /// Nullable types (`["integer", "null"]`) collapse to the non-null member.
    fn from_schema(schema: &Value) -> ParamType {
        let declared = match schema.get("type") {
            Some(Value::String(name)) => ParamType::parse(name),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| *name != "null")
                .find_map(ParamType::parse),
            _ => None,
        };
        if let Some(kind) = declared {
            return kind;
        }

        ["anyOf", "oneOf"]
            .iter()
            .filter_map(|key| schema.get(*key).and_then(Value::as_array))
            .flatten()
            .find(|branch| branch.get("type").and_then(Value::as_str) != Some("null"))
            .map(ParamType::from_schema)
            .unwrap_or(ParamType::String)
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
}

/// Declared parameters, kept in the order the schema listed them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(Vec<(String, ParameterSpec)>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.0.iter().map(|(field, spec)| (field.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, spec) in &self.0 {
            map.serialize_entry(field, spec)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    pub required: Vec<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl FunctionSpec {
    /// Build a spec whose parameters mirror the schema of `T`.
    /// Field doc comments become parameter descriptions.
    pub fn from_args<T: JsonSchema>(name: &str, description: &str) -> Self {
        let root: Value = schemars::schema_for!(T).into();

        let required = root
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let properties = root
            .get("properties")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, schema)| {
                        let spec = ParameterSpec {
                            kind: ParamType::from_schema(schema),
                            description: schema
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        };
                        (field.clone(), spec)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: ParameterSchema {
                required,
                kind: "object",
                properties: Properties(properties),
            },
        }
    }

    /// Check decoded arguments against the declared parameters.
    ///
    /// Missing or null required fields and declared fields of the wrong type are
    /// rejected, naming the field. Undeclared fields are ignored.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let fields = arguments.as_object().ok_or_else(|| {
            Error::malformed_arguments(&self.name, "arguments must be a JSON object")
        })?;

        for field in &self.parameters.required {
            if fields.get(field).map_or(true, Value::is_null) {
                return Err(Error::malformed_arguments(
                    &self.name,
                    format!("missing required field '{}'", field),
                ));
            }
        }

        for (field, spec) in self.parameters.properties.iter() {
            match fields.get(field) {
                Some(value) if !value.is_null() && !spec.kind.matches(value) => {
                    return Err(Error::malformed_arguments(
                        &self.name,
                        format!("field '{}' must be of type {}", field, spec.kind),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Probe {
        /// Who to look at
        target: String,
        /// How many
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        ratio: Option<f64>,
    }

    fn probe() -> FunctionSpec {
        FunctionSpec::from_args::<Probe>("probe", "Test probe")
    }

    #[test]
    fn test_shape_from_schema() {
        let value = serde_json::to_value(probe()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "probe",
                "description": "Test probe",
                "parameters": {
                    "required": ["target"],
                    "type": "object",
                    "properties": {
                        "target": {"type": "string", "description": "Who to look at"},
                        "limit": {"type": "integer", "description": "How many"},
                        "ratio": {"type": "number", "description": ""}
                    }
                }
            })
        );
    }

    #[test]
    fn test_nullable_type_collapses() {
        assert_eq!(
            ParamType::from_schema(&json!({"type": ["null", "integer"]})),
            ParamType::Integer
        );
        assert_eq!(
            ParamType::from_schema(&json!({"anyOf": [{"type": "null"}, {"type": "boolean"}]})),
            ParamType::Boolean
        );
        assert_eq!(ParamType::from_schema(&json!({})), ParamType::String);
    }

    #[test]
    fn test_validate_missing_required() {
        let err = probe().validate(&json!({"limit": 3})).unwrap_err();
        match err {
            Error::MalformedArguments { function, reason } => {
                assert_eq!(function, "probe");
                assert!(reason.contains("'target'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(probe().validate(&json!({"target": null})).is_err());
    }

    #[test]
    fn test_validate_ignores_unknown_fields() {
        assert!(probe()
            .validate(&json!({"target": "0xabc", "colour": "blue"}))
            .is_ok());
    }

    #[test]
    fn test_validate_type_mismatch_names_field() {
        let err = probe()
            .validate(&json!({"target": "0xabc", "limit": "seven"}))
            .unwrap_err();
        assert!(err.to_string().contains("'limit'"));

        let err = probe()
            .validate(&json!({"target": "0xabc", "limit": 1.5}))
            .unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(matches!(
            probe().validate(&json!(["0xabc"])),
            Err(Error::MalformedArguments { .. })
        ));
    }

    #[test]
    fn test_integer_accepts_negative() {
        assert!(ParamType::Integer.matches(&json!(-3)));
        assert!(ParamType::Number.matches(&json!(3)));
        assert!(!ParamType::Integer.matches(&json!(3.5)));
    }
}

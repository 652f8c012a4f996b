//! Declared input/output schemas for pipeline steps.
//!
//! Schemas only check what the pipeline relies on: required keys are present
//! and each declared key carries the right primitive JSON type. Unknown keys
//! pass through untouched so that processing outputs can accrete.

use crate::types::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Parameter map exchanged with step delegates.
pub type Params = Map<String, Value>;

/// Primitive JSON type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `params` against the schema, naming `step` in any error.
    pub fn check(&self, step: &str, params: &Params) -> Result<()> {
        for field in &self.fields {
            match params.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(PipelineError::SchemaValidation {
                        step: step.to_string(),
                        message: format!("missing required field '{}'", field.name),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.field_type.matches(value) => {
                    return Err(PipelineError::SchemaValidation {
                        step: step.to_string(),
                        message: format!(
                            "field '{}' expected {}, got {}",
                            field.name,
                            field.field_type.as_str(),
                            describe(value)
                        ),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// JSON-schema rendering, shown by `config --steps`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let ty = match field.field_type {
                FieldType::Any => json!({}),
                other => json!({ "type": other.as_str() }),
            };
            properties.insert(field.name.clone(), ty);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

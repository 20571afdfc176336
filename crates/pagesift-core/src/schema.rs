use std::path::Path;

use crate::error::PipelineError;

/// Value type a schema field may declare.
///
/// `String` is the common case; the other primitives are accepted so a
/// schema file can declare them without a round-trip through the LLM
/// failing local validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
}

impl FieldType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Name of this type in JSON Schema terms.
    pub fn json_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Caller-supplied extraction schema: field name → declared value type.
///
/// Loaded from a flat JSON object such as
/// `{"market_cap": "string", "revenue": "string"}` and immutable for the
/// duration of a run.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<(String, FieldType)>,
}

impl FieldSchema {
    /// Parse a schema from its JSON representation (a flat object mapping
    /// field names to type names).
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PipelineError> {
        let map = value.as_object().ok_or_else(|| {
            PipelineError::Schema("Schema must be a JSON object of field: type pairs".into())
        })?;

        if map.is_empty() {
            return Err(PipelineError::Schema("Schema declares no fields".into()));
        }

        let mut fields = Vec::with_capacity(map.len());
        for (name, ty) in map {
            let ty_name = ty.as_str().ok_or_else(|| {
                PipelineError::Schema(format!("Field '{name}' must declare its type as a string"))
            })?;
            let ty = FieldType::parse(ty_name).ok_or_else(|| {
                PipelineError::Schema(format!("Field '{name}' has unknown type '{ty_name}'"))
            })?;
            fields.push((name.clone(), ty));
        }

        Ok(Self { fields })
    }

    /// Load a schema from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read schema file {}: {e}", path.display()))
        })?;
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Schema(format!("Invalid JSON in schema file {}: {e}", path.display()))
        })?;
        Self::from_value(&value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the JSON Schema handed to the LLM for structured output.
    ///
    /// All fields are marked required and additional properties are
    /// forbidden, as strict `json_schema` response mode demands; a field
    /// the model cannot locate comes back as an empty string rather than
    /// being omitted.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::with_capacity(self.fields.len());
        for (name, ty) in &self.fields {
            properties.insert(
                name.clone(),
                serde_json::json!({"type": ty.json_name()}),
            );
            required.push(serde_json::Value::String(name.clone()));
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Shape an extracted value to this schema.
    ///
    /// Not every provider honours strict structured output, so the reply is
    /// conformed locally: declared fields the model omitted become `null`,
    /// undeclared keys are dropped, and a present value of the wrong type is
    /// a schema error. `null` is always accepted ("the model found no
    /// match").
    pub fn conform(&self, value: serde_json::Value) -> Result<serde_json::Value, PipelineError> {
        let mut map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(PipelineError::Schema(format!(
                    "Extracted data is not a JSON object: {other}"
                )));
            }
        };

        let mut conformed = serde_json::Map::with_capacity(self.fields.len());
        for (name, ty) in &self.fields {
            match map.remove(name) {
                None => {
                    conformed.insert(name.clone(), serde_json::Value::Null);
                }
                Some(serde_json::Value::Null) => {
                    conformed.insert(name.clone(), serde_json::Value::Null);
                }
                Some(v) if ty.matches(&v) => {
                    conformed.insert(name.clone(), v);
                }
                Some(v) => {
                    return Err(PipelineError::Schema(format!(
                        "Field '{name}' expected {} but got: {v}",
                        ty.json_name()
                    )));
                }
            }
        }

        for leftover in map.keys() {
            tracing::debug!("Dropping undeclared field '{leftover}' from extraction");
        }

        Ok(serde_json::Value::Object(conformed))
    }
}

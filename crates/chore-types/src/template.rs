//! Chore templates decoded from calendar event descriptions.
//!
//! Event descriptions are free text typed by whoever owns the calendar. Only
//! descriptions holding a YAML (or JSON) mapping with string `person` and
//! `node` entries become templates; anything else is rejected with a reason
//! the caller is free to ignore.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a description did not produce a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateRejection {
    #[error("description is not valid YAML: {0}")]
    Unparsable(String),

    #[error("description is not a mapping")]
    NotAMapping,

    #[error("mapping key cannot be used as a field name")]
    UnrepresentableKey,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),

    #[error("field `{0}` cannot be represented as JSON")]
    UnrepresentableValue(String),
}

/// Structured payload of a calendar event, before it becomes a chore.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoreTemplate {
    pub person: String,
    pub node: String,
    /// Every other key of the mapping, passed through untouched.
    pub fields: Map<String, Value>,
}

impl ChoreTemplate {
    /// Decode an event description.
    ///
    /// The YAML parser only builds data; tags and anchors never run code.
    pub fn decode(text: &str) -> Result<Self, TemplateRejection> {
        let document: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|e| TemplateRejection::Unparsable(e.to_string()))?;

        let serde_yaml::Value::Mapping(mapping) = document else {
            return Err(TemplateRejection::NotAMapping);
        };

        let mut fields = Map::new();
        for (key, value) in mapping {
            let key = field_name(key)?;
            let value = serde_json::to_value(&value)
                .map_err(|_| TemplateRejection::UnrepresentableValue(key.clone()))?;
            fields.insert(key, value);
        }

        let person = take_string(&mut fields, "person")?;
        let node = take_string(&mut fields, "node")?;

        Ok(Self {
            person,
            node,
            fields,
        })
    }

    /// Tag the template with the calendar event it came from.
    pub fn set_event_id(&mut self, event_id: impl Into<String>) {
        self.fields
            .insert("event_id".to_string(), Value::String(event_id.into()));
    }
}

/// Scalar keys become field names the way a JSON encoder would write them.
fn field_name(key: serde_yaml::Value) -> Result<String, TemplateRejection> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_)
        | serde_yaml::Value::Tagged(_) => Err(TemplateRejection::UnrepresentableKey),
    }
}

fn take_string(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<String, TemplateRejection> {
    match fields.remove(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(TemplateRejection::NotAString(name)),
        None => Err(TemplateRejection::MissingField(name)),
    }
}

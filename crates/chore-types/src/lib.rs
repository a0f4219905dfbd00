use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

mod template;

pub use template::{ChoreTemplate, TemplateRejection};

/// Chore record as kept in the chore store, keyed by `node`.
///
/// Records written by other producers may lack any of the named fields or
/// hold other JSON types in them, so reading never fails on their shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chore {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub person: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub node: String,
    /// Calendar event that produced this chore, as stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Chore {
    /// Build the record stored for `node`. Explicit arguments win over any
    /// same-named keys carried in the template.
    pub fn from_template(template: ChoreTemplate, person: &str, node: &str) -> Self {
        let mut fields = template.fields;

        let event_id = fields.remove("event_id");
        for reserved in ["id", "person", "node"] {
            fields.remove(reserved);
        }

        Self {
            id: node.to_string(),
            person: person.to_string(),
            node: node.to_string(),
            event_id,
            fields,
        }
    }

    /// Event id when it was stored as a string.
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_ref().and_then(Value::as_str)
    }

    /// True when this chore was already produced by the given event.
    pub fn is_current_for(&self, event_id: &str) -> bool {
        self.event_id() == Some(event_id)
    }
}

/// Strings pass through, null reads as empty and any other value is kept in
/// its JSON text form.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(text: &str) -> ChoreTemplate {
        ChoreTemplate::decode(text).unwrap()
    }

    #[test]
    fn test_from_template() {
        let mut tmpl = template("person: dude\nnode: room\ntext: vacuum\n");
        tmpl.set_event_id("do");

        let chore = Chore::from_template(tmpl, "dude", "room");

        assert_eq!(chore.id, "room");
        assert_eq!(chore.person, "dude");
        assert_eq!(chore.node, "room");
        assert_eq!(chore.event_id(), Some("do"));
        assert_eq!(chore.fields.get("text"), Some(&json!("vacuum")));
        assert!(!chore.fields.contains_key("event_id"));
    }

    #[test]
    fn test_from_template_overrides_reserved_keys() {
        let tmpl = template("person: dude\nnode: room\nid: sneaky\n");
        let chore = Chore::from_template(tmpl, "dude", "room");

        assert_eq!(chore.id, "room");
        assert!(!chore.fields.contains_key("id"));
    }

    #[test]
    fn test_serialized_layout() {
        let mut tmpl = template("person: dude\nnode: room\n");
        tmpl.set_event_id("do");
        let chore = Chore::from_template(tmpl, "dude", "room");

        let value = serde_json::to_value(&chore).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "room",
                "event_id": "do",
                "person": "dude",
                "node": "room"
            })
        );
    }

    #[test]
    fn test_deserialize_sparse_record() {
        let chore: Chore = serde_json::from_str(r#"{"event_id": "done"}"#).unwrap();
        assert_eq!(chore.event_id(), Some("done"));
        assert!(chore.id.is_empty());
        assert!(chore.fields.is_empty());
    }

    #[test]
    fn test_deserialize_foreign_types() {
        let chore: Chore =
            serde_json::from_str(r#"{"id": null, "person": 3, "node": "room", "event_id": 5}"#)
                .unwrap();

        assert!(chore.id.is_empty());
        assert_eq!(chore.person, "3");
        assert_eq!(chore.node, "room");
        assert_eq!(chore.event_id, Some(json!(5)));
        assert_eq!(chore.event_id(), None);
        assert!(!chore.is_current_for("5"));
    }

    #[test]
    fn test_is_current_for() {
        let chore = Chore {
            event_id: Some(json!("done")),
            ..Default::default()
        };
        assert!(chore.is_current_for("done"));
        assert!(!chore.is_current_for("other"));
        assert!(!Chore::default().is_current_for("done"));
    }
}

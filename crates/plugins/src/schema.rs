//! Schema-validated plugin configuration.
//!
//! Every plugin declares an ordered list of config fields. Field kinds are a
//! closed sum, values are validated against their declared kind on merge, and
//! defaults come from the schema rather than from whatever the server happens
//! to send.

use std::collections::BTreeMap;

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// The kind of a single config field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Freeform text.
    Text,
    /// Numeric value (integral or fractional).
    Number,
    /// On/off switch.
    Toggle,
    /// One of a declared set of string values.
    Choice { choices: Vec<String> },
}

impl FieldKind {
    /// Human-readable kind name, used in validation errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Toggle => "toggle",
            Self::Choice { .. } => "choice",
        }
    }
}

/// Declaration of one config field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field key, unique within a schema.
    pub key: String,
    /// Display label; falls back to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Declared default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Ordered list of field declarations, as served in `Plugin.config_schema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSchema(pub Vec<FieldSpec>);

impl ConfigSchema {
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.0.iter()
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.0.iter().find(|spec| spec.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A configured value. Choice fields carry their selection as [`Self::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Toggle(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn matches(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Text(_), FieldKind::Text)
                | (Self::Text(_), FieldKind::Choice { .. })
                | (Self::Number(_), FieldKind::Number)
                | (Self::Toggle(_), FieldKind::Toggle)
        )
    }

    /// Render for a form-encoded submission.
    ///
    /// Integral numbers drop the trailing `.0` so the server sees `3`, not
    /// `3.0`.
    #[must_use]
    pub fn to_form_value(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Toggle(flag) => flag.to_string(),
            Self::Number(number) => {
                if number.fract() == 0.0 && number.is_finite() && number.abs() < 9.0e15 {
                    format!("{}", *number as i64)
                } else {
                    number.to_string()
                }
            },
        }
    }
}

/// Field-name → value mapping for one plugin config.
pub type ConfigValues = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("unknown config field '{key}'")]
    UnknownField { key: String },

    #[error("config field '{key}' expects a {expected} value")]
    KindMismatch { key: String, expected: &'static str },

    #[error("'{value}' is not a declared choice for config field '{key}'")]
    InvalidChoice { key: String, value: String },
}

/// Extract the declared defaults from a schema.
///
/// Fields without a declared default are omitted entirely.
#[must_use]
pub fn defaults(schema: &ConfigSchema) -> ConfigValues {
    schema
        .fields()
        .filter_map(|spec| {
            spec.default
                .clone()
                .map(|value| (spec.key.clone(), value))
        })
        .collect()
}

/// Overlay `changes` on `current`, validating every change against the schema.
///
/// Unknown keys, kind mismatches, and undeclared choice values are rejected;
/// `current` is not validated, since it came from the server.
pub fn merge(
    schema: &ConfigSchema,
    current: &ConfigValues,
    changes: &ConfigValues,
) -> Result<ConfigValues, SchemaError> {
    let mut merged = current.clone();
    for (key, value) in changes {
        let spec = schema.field(key).ok_or_else(|| SchemaError::UnknownField {
            key: key.clone(),
        })?;
        if !value.matches(&spec.kind) {
            return Err(SchemaError::KindMismatch {
                key: key.clone(),
                expected: spec.kind.name(),
            });
        }
        if let (FieldKind::Choice { choices }, FieldValue::Text(text)) = (&spec.kind, value)
            && !choices.contains(text)
        {
            return Err(SchemaError::InvalidChoice {
                key: key.clone(),
                value: text.clone(),
            });
        }
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

/// Build the form-encoded submission for a create/update call.
///
/// Pairs come out in schema order; fields with no value are skipped.
#[must_use]
pub fn submission(schema: &ConfigSchema, values: &ConfigValues) -> Vec<(String, String)> {
    schema
        .fields()
        .filter_map(|spec| {
            values
                .get(&spec.key)
                .map(|value| (spec.key.clone(), value.to_form_value()))
        })
        .collect()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn webhook_schema() -> ConfigSchema {
        serde_json::from_str(
            r#"[
                {"key": "endpoint", "label": "Webhook endpoint", "type": "text", "required": true},
                {"key": "batch_size", "type": "number", "default": 25},
                {"key": "verbose", "type": "toggle", "default": false},
                {"key": "format", "type": "choice", "choices": ["json", "csv"], "default": "json"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn schema_parses_from_wire_format() {
        let schema = webhook_schema();
        assert_eq!(schema.0.len(), 4);
        assert_eq!(schema.field("endpoint").unwrap().label(), "Webhook endpoint");
        assert_eq!(schema.field("batch_size").unwrap().label(), "batch_size");
        assert!(schema.field("endpoint").unwrap().required);
        assert_eq!(
            schema.field("format").unwrap().kind,
            FieldKind::Choice {
                choices: vec!["json".into(), "csv".into()]
            }
        );
    }

    #[test]
    fn defaults_skip_fields_without_one() {
        let values = defaults(&webhook_schema());
        assert_eq!(values.len(), 3);
        assert!(!values.contains_key("endpoint"));
        assert_eq!(values.get("batch_size"), Some(&FieldValue::Number(25.0)));
        assert_eq!(values.get("verbose"), Some(&FieldValue::Toggle(false)));
        assert_eq!(
            values.get("format"),
            Some(&FieldValue::Text("json".into()))
        );
    }

    #[test]
    fn merge_overlays_changes_on_current() {
        let schema = webhook_schema();
        let current = defaults(&schema);
        let changes = ConfigValues::from([
            ("endpoint".to_string(), FieldValue::Text("https://example.com/hook".into())),
            ("batch_size".to_string(), FieldValue::Number(100.0)),
        ]);

        let merged = merge(&schema, &current, &changes).unwrap();
        assert_eq!(
            merged.get("endpoint"),
            Some(&FieldValue::Text("https://example.com/hook".into()))
        );
        assert_eq!(merged.get("batch_size"), Some(&FieldValue::Number(100.0)));
        // Untouched fields keep their current value.
        assert_eq!(merged.get("format"), Some(&FieldValue::Text("json".into())));
    }

    #[test]
    fn merge_rejects_unknown_field() {
        let schema = webhook_schema();
        let changes = ConfigValues::from([("nope".to_string(), FieldValue::Toggle(true))]);
        assert_eq!(
            merge(&schema, &ConfigValues::new(), &changes),
            Err(SchemaError::UnknownField { key: "nope".into() })
        );
    }

    #[test]
    fn merge_rejects_kind_mismatch() {
        let schema = webhook_schema();
        let changes = ConfigValues::from([("verbose".to_string(), FieldValue::Text("yes".into()))]);
        assert_eq!(
            merge(&schema, &ConfigValues::new(), &changes),
            Err(SchemaError::KindMismatch {
                key: "verbose".into(),
                expected: "toggle",
            })
        );
    }

    #[test]
    fn merge_validates_choice_membership() {
        let schema = webhook_schema();

        let valid = ConfigValues::from([("format".to_string(), FieldValue::Text("csv".into()))]);
        assert!(merge(&schema, &ConfigValues::new(), &valid).is_ok());

        let invalid = ConfigValues::from([("format".to_string(), FieldValue::Text("xml".into()))]);
        assert_eq!(
            merge(&schema, &ConfigValues::new(), &invalid),
            Err(SchemaError::InvalidChoice {
                key: "format".into(),
                value: "xml".into(),
            })
        );
    }

    #[test]
    fn submission_follows_schema_order() {
        let schema = webhook_schema();
        let mut values = defaults(&schema);
        values.insert("endpoint".into(), FieldValue::Text("https://example.com".into()));

        let fields = submission(&schema, &values);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["endpoint", "batch_size", "verbose", "format"]);
        assert_eq!(fields[1].1, "25");
        assert_eq!(fields[2].1, "false");
    }

    #[test]
    fn form_values_render_plainly() {
        assert_eq!(FieldValue::Text("abc".into()).to_form_value(), "abc");
        assert_eq!(FieldValue::Toggle(true).to_form_value(), "true");
        assert_eq!(FieldValue::Number(3.0).to_form_value(), "3");
        assert_eq!(FieldValue::Number(2.5).to_form_value(), "2.5");
    }

    #[test]
    fn untagged_values_round_trip() {
        let parsed: ConfigValues =
            serde_json::from_str(r#"{"a": true, "b": 2, "c": "text"}"#).unwrap();
        assert_eq!(parsed.get("a"), Some(&FieldValue::Toggle(true)));
        assert_eq!(parsed.get("b"), Some(&FieldValue::Number(2.0)));
        assert_eq!(parsed.get("c"), Some(&FieldValue::Text("text".into())));
    }
}

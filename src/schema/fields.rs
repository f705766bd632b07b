//! Typed field descriptors.
//!
//! A form field is stored and served as `{label, type, options?, validation?}`.
//! The `options` key is present if and only if the type is a choice type, so
//! the descriptor is a discriminated enum rather than an open mapping: a
//! `Text` field carrying options is unrepresentable and gets rejected at the
//! deserialization boundary.

use serde::{Deserialize, Serialize, Serializer};

/// Validation rules attached to a field. Currently only `required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub required: bool,
}

/// One field of a form, in canonical order inside `Form.fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub label: String,
    pub kind: FieldKind,
    /// Absent when a structured upload did not supply validation rules;
    /// tabular uploads always set it.
    pub validation: Option<FieldValidation>,
}

/// The field type, with options attached only where the type takes them.
///
/// The type set is open ended: anything outside the four recognized names
/// lands in `Other`, which keeps whatever options the source carried.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Checkbox,
    Dropdown(Vec<String>),
    MultipleChoice(Vec<String>),
    Other {
        type_name: String,
        options: Option<Vec<String>>,
    },
}

impl FieldKind {
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Dropdown(_) => "Dropdown",
            FieldKind::MultipleChoice(_) => "Multiple Choice",
            FieldKind::Other { type_name, .. } => type_name,
        }
    }

    /// Options, where the type carries them.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Dropdown(options) | FieldKind::MultipleChoice(options) => Some(options),
            FieldKind::Other { options, .. } => options.as_deref(),
            FieldKind::Text | FieldKind::Checkbox => None,
        }
    }
}

/// Wire shape of a field descriptor. `FieldDescriptor` round-trips through
/// this on the API and in the `forms.fields` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

impl TryFrom<RawField> for FieldDescriptor {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let kind = match raw.type_name.as_str() {
            "Text" | "Checkbox" => {
                if raw.options.is_some() {
                    return Err(format!(
                        "field '{}': type '{}' must not carry options",
                        raw.label, raw.type_name
                    ));
                }
                if raw.type_name == "Text" {
                    FieldKind::Text
                } else {
                    FieldKind::Checkbox
                }
            }
            "Dropdown" | "Multiple Choice" => {
                let options = raw.options.ok_or_else(|| {
                    format!(
                        "field '{}': type '{}' requires options",
                        raw.label, raw.type_name
                    )
                })?;
                if raw.type_name == "Dropdown" {
                    FieldKind::Dropdown(options)
                } else {
                    FieldKind::MultipleChoice(options)
                }
            }
            other => FieldKind::Other {
                type_name: other.to_string(),
                options: raw.options,
            },
        };

        Ok(FieldDescriptor {
            label: raw.label,
            kind,
            validation: raw.validation,
        })
    }
}

// Borrowed mirror of RawField so serializing a descriptor does not clone it.
#[derive(Serialize)]
struct RawFieldRef<'a> {
    label: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<&'a FieldValidation>,
}

impl Serialize for FieldDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawFieldRef {
            label: &self.label,
            type_name: self.kind.type_name(),
            options: self.kind.options(),
            validation: self.validation.as_ref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldDescriptor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawField::deserialize(deserializer)?;
        FieldDescriptor::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_field_serializes_without_options_key() {
        let field = FieldDescriptor {
            label: "Name".to_string(),
            kind: FieldKind::Text,
            validation: Some(FieldValidation { required: true }),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "Text");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn dropdown_keeps_option_order() {
        let field = FieldDescriptor {
            label: "Color".to_string(),
            kind: FieldKind::Dropdown(vec!["Red".into(), "Green".into(), "Blue".into()]),
            validation: None,
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["options"], serde_json::json!(["Red", "Green", "Blue"]));
        assert!(json.get("validation").is_none());
    }

    #[test]
    fn text_with_options_is_rejected() {
        let err = serde_json::from_value::<FieldDescriptor>(serde_json::json!({
            "label": "Name",
            "type": "Text",
            "options": ["a"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("must not carry options"));
    }

    #[test]
    fn choice_without_options_is_rejected() {
        let err = serde_json::from_value::<FieldDescriptor>(serde_json::json!({
            "label": "Color",
            "type": "Dropdown"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("requires options"));
    }

    #[test]
    fn unknown_type_round_trips() {
        let value = serde_json::json!({
            "label": "Mood",
            "type": "Slider",
            "options": ["1", "5"]
        });
        let field: FieldDescriptor = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(field.kind.type_name(), "Slider");
        assert_eq!(serde_json::to_value(&field).unwrap(), value);
    }
}

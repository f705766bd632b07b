//! Field schema normalization.
//!
//! Turns either of the two upload shapes into the canonical ordered list of
//! [`FieldDescriptor`]s consumed by form creation:
//!
//! - a structured JSON payload (`{name, fields: [...]}`), validated and
//!   passed through, and
//! - a tabular payload (CSV with `Label` / `Type` / `Required` / `Option`
//!   columns), translated row by row.
//!
//! Pure functions, no I/O.

mod fields;

pub use fields::{FieldDescriptor, FieldKind, FieldValidation, RawField};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// Structured input missing required parts, or a descriptor violating
    /// the options-presence invariant. Client-side rejection, no retry.
    #[error("{0}")]
    Validation(String),
    /// Tabular input unparseable as tabular data. Aborts the whole upload.
    #[error("failed to parse tabular data")]
    Parsing(#[source] csv::Error),
}

/// What to do with a choice-type row whose `Option` column yields no
/// options. A choice field with zero choices is likely a data-entry
/// mistake, so this is a deployment policy rather than a fixed rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyOptionsPolicy {
    /// Keep the field with `options: []`.
    #[default]
    Allow,
    /// Fail the upload with a validation error.
    Reject,
}

/// A structured form definition as uploaded. Both `name` and the legacy
/// `formName` key are accepted.
#[derive(Debug, Deserialize)]
pub struct StructuredUpload {
    #[serde(default, alias = "formName")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<RawField>>,
}

/// Validate a structured JSON payload and return its name and fields.
///
/// The fields pass through unchanged in order; the only transformation is
/// the conversion into typed descriptors, which rejects descriptors that
/// violate the options-presence invariant.
pub fn normalize_structured(bytes: &[u8]) -> Result<(String, Vec<FieldDescriptor>), SchemaError> {
    let payload: StructuredUpload = serde_json::from_slice(bytes)
        .map_err(|e| SchemaError::Validation(format!("not a valid form definition: {e}")))?;

    let name = payload.name.unwrap_or_default();
    if name.is_empty() {
        return Err(SchemaError::Validation(
            "form definition must contain a non-empty 'name'".to_string(),
        ));
    }

    let raw_fields = payload.fields.unwrap_or_default();
    if raw_fields.is_empty() {
        return Err(SchemaError::Validation(
            "form definition must contain a non-empty 'fields' list".to_string(),
        ));
    }

    let fields = raw_fields
        .into_iter()
        .map(|raw| FieldDescriptor::try_from(raw).map_err(SchemaError::Validation))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((name, fields))
}

/// Translate tabular rows into field descriptors, in row order.
///
/// Headers are matched case-sensitively; a missing column reads as the
/// empty string everywhere. `Required` is true only for a trimmed,
/// lower-cased value of exactly `yes`.
pub fn normalize_table(
    bytes: &[u8],
    policy: EmptyOptionsPolicy,
) -> Result<Vec<FieldDescriptor>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers().map_err(SchemaError::Parsing)?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let label_col = column("Label");
    let type_col = column("Type");
    let required_col = column("Required");
    let option_col = column("Option");

    let mut fields = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(SchemaError::Parsing)?;
        let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("").trim();

        let label = cell(label_col).to_string();
        let type_name = cell(type_col).to_string();
        let required = cell(required_col).to_lowercase() == "yes";

        let kind = match type_name.as_str() {
            "Text" => FieldKind::Text,
            "Checkbox" => FieldKind::Checkbox,
            "Dropdown" | "Multiple Choice" => {
                let options = split_options(cell(option_col));
                if options.is_empty() && policy == EmptyOptionsPolicy::Reject {
                    return Err(SchemaError::Validation(format!(
                        "row {}: choice field '{}' has no options",
                        row + 1,
                        label
                    )));
                }
                if type_name == "Dropdown" {
                    FieldKind::Dropdown(options)
                } else {
                    FieldKind::MultipleChoice(options)
                }
            }
            // Unrecognized type: treat as non-choice, but keep any options
            // the sheet carried so they survive a later type addition.
            other => {
                let options = split_options(cell(option_col));
                FieldKind::Other {
                    type_name: other.to_string(),
                    options: if options.is_empty() { None } else { Some(options) },
                }
            }
        };

        fields.push(FieldDescriptor {
            label,
            kind,
            validation: Some(FieldValidation { required }),
        });
    }

    Ok(fields)
}

/// Split an `Option` cell on commas, trimming pieces and dropping empties,
/// order preserved.
fn split_options(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(value: serde_json::Value) -> Result<(String, Vec<FieldDescriptor>), SchemaError> {
        normalize_structured(value.to_string().as_bytes())
    }

    #[test]
    fn structured_fields_pass_through_in_order() {
        let (name, fields) = structured(serde_json::json!({
            "name": "Survey",
            "fields": [
                {"label": "Name", "type": "Text"},
                {"label": "Color", "type": "Dropdown", "options": ["Red", "Blue"]},
                {"label": "Agree", "type": "Checkbox", "validation": {"required": true}}
            ]
        }))
        .unwrap();

        assert_eq!(name, "Survey");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].label, "Name");
        assert_eq!(fields[1].kind, FieldKind::Dropdown(vec!["Red".into(), "Blue".into()]));
        assert_eq!(fields[2].validation, Some(FieldValidation { required: true }));
    }

    #[test]
    fn structured_accepts_legacy_form_name_key() {
        let (name, _) = structured(serde_json::json!({
            "formName": "Survey",
            "fields": [{"label": "Name", "type": "Text"}]
        }))
        .unwrap();
        assert_eq!(name, "Survey");
    }

    #[test]
    fn structured_rejects_missing_or_empty_name() {
        for payload in [
            serde_json::json!({"fields": [{"label": "A", "type": "Text"}]}),
            serde_json::json!({"name": "", "fields": [{"label": "A", "type": "Text"}]}),
        ] {
            assert!(matches!(structured(payload), Err(SchemaError::Validation(_))));
        }
    }

    #[test]
    fn structured_rejects_missing_or_empty_fields() {
        for payload in [
            serde_json::json!({"name": "Survey"}),
            serde_json::json!({"name": "Survey", "fields": []}),
        ] {
            assert!(matches!(structured(payload), Err(SchemaError::Validation(_))));
        }
    }

    #[test]
    fn structured_rejects_invalid_json() {
        assert!(matches!(
            normalize_structured(b"{not json"),
            Err(SchemaError::Validation(_))
        ));
    }

    fn table(csv: &str) -> Vec<FieldDescriptor> {
        normalize_table(csv.as_bytes(), EmptyOptionsPolicy::Allow).unwrap()
    }

    #[test]
    fn tabular_translates_rows_in_order() {
        let fields = table(
            "Label,Type,Required,Option\n\
             Name,Text,yes,\n\
             Color,Dropdown,no,\"Red, Green, Blue\"\n",
        );
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "Name");
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[0].validation, Some(FieldValidation { required: true }));
        assert_eq!(
            fields[1].kind,
            FieldKind::Dropdown(vec!["Red".into(), "Green".into(), "Blue".into()])
        );
    }

    #[test]
    fn options_are_trimmed_and_empties_dropped() {
        let fields = table("Label,Type,Required,Option\nColor,Dropdown,yes,\"A, B ,,C\"\n");
        assert_eq!(
            fields[0].kind,
            FieldKind::Dropdown(vec!["A".into(), "B".into(), "C".into()])
        );
    }

    #[test]
    fn required_matches_yes_case_insensitively() {
        for (value, expected) in [
            ("Yes", true),
            ("yes", true),
            ("YES", true),
            (" yes ", true),
            ("no", false),
            ("true", false),
            ("", false),
        ] {
            let fields = table(&format!("Label,Type,Required,Option\nA,Text,{value},\n"));
            assert_eq!(
                fields[0].validation,
                Some(FieldValidation { required: expected }),
                "Required = {value:?}"
            );
        }
    }

    #[test]
    fn text_and_checkbox_never_carry_options() {
        let fields = table(
            "Label,Type,Required,Option\n\
             Name,Text,no,\"A, B\"\n\
             Agree,Checkbox,no,\"C, D\"\n",
        );
        for field in &fields {
            assert_eq!(field.kind.options(), None);
            let json = serde_json::to_value(field).unwrap();
            assert!(json.get("options").is_none(), "{json}");
        }
    }

    #[test]
    fn choice_with_empty_options_follows_policy() {
        let csv = "Label,Type,Required,Option\nColor,Multiple Choice,no,\" , ,\"\n";

        let fields = normalize_table(csv.as_bytes(), EmptyOptionsPolicy::Allow).unwrap();
        assert_eq!(fields[0].kind, FieldKind::MultipleChoice(vec![]));
        // Present, but empty.
        let json = serde_json::to_value(&fields[0]).unwrap();
        assert_eq!(json["options"], serde_json::json!([]));

        assert!(matches!(
            normalize_table(csv.as_bytes(), EmptyOptionsPolicy::Reject),
            Err(SchemaError::Validation(_))
        ));
    }

    #[test]
    fn unknown_type_keeps_options_only_when_present() {
        let fields = table(
            "Label,Type,Required,Option\n\
             Scale,Slider,no,\"1, 5\"\n\
             Note,Paragraph,no,\n",
        );
        assert_eq!(
            fields[0].kind,
            FieldKind::Other {
                type_name: "Slider".to_string(),
                options: Some(vec!["1".into(), "5".into()]),
            }
        );
        assert_eq!(
            fields[1].kind,
            FieldKind::Other { type_name: "Paragraph".to_string(), options: None }
        );
    }

    #[test]
    fn missing_columns_read_as_empty() {
        let fields = table("Label,Type\nName,Text\n");
        assert_eq!(fields[0].validation, Some(FieldValidation { required: false }));

        // No recognized columns at all still yields one descriptor per row.
        let fields = table("A,B\nx,y\n");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label, "");
        assert_eq!(fields[0].kind.type_name(), "");
    }

    #[test]
    fn malformed_table_fails_with_parsing_error() {
        let err = normalize_table(b"Label,Type\n\xff\xfe,Text\n", EmptyOptionsPolicy::Allow)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Parsing(_)));
        // The underlying cause is attached.
        assert!(std::error::Error::source(&err).is_some());
    }
}

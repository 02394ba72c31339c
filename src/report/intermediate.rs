//! Intermediate document handed to the template renderer

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::date::date_macro_args;
use crate::error::Result;
use crate::escape::{escape_structure, RAW_SUFFIX};
use crate::store::TemplateRecord;

/// Escaped data for one preview, ready for serialization
///
/// Only [`IntermediateDocument::build`] creates one, and it escapes the
/// records exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateDocument {
    /// Date macro arguments, `{DD}{MM}{YYYY}`; pre-formatted LaTeX
    #[serde(rename = "generated_date_tex")]
    generated_date: String,
    /// Escaped template records in fetch order
    templates: Vec<Value>,
}

impl IntermediateDocument {
    /// Build from fetched records and the generation time
    pub fn build(records: Vec<TemplateRecord>, generated_at: &NaiveDateTime) -> Self {
        let templates = records
            .into_iter()
            .map(|record| {
                let mut value = record.into_value();
                escape_structure(&mut value, RAW_SUFFIX);
                value
            })
            .collect();

        IntermediateDocument {
            generated_date: date_macro_args(generated_at),
            templates,
        }
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the JSON form to `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(value: Value) -> TemplateRecord {
        match value {
            Value::Object(map) => TemplateRecord::new(map),
            _ => panic!("Expected object"),
        }
    }

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_build_escapes_templates_once() {
        let doc = IntermediateDocument::build(
            vec![record(json!({"name": "C:\\Temp", "subject_tex": "\\textbf{Hi}"}))],
            &when(),
        );
        assert_eq!(doc.generated_date, "{09}{03}{2026}");
        assert_eq!(doc.templates[0]["name"], "C:\\textbackslash{}Temp");
        assert_eq!(doc.templates[0]["subject_tex"], "\\textbf{Hi}");
    }

    #[test]
    fn test_date_not_escaped() {
        let doc = IntermediateDocument::build(Vec::new(), &when());
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"generated_date_tex": "{09}{03}{2026}", "templates": []}));
    }

    #[test]
    fn test_order_and_fields_preserved() {
        let doc = IntermediateDocument::build(
            vec![
                record(json!({"name": "B", "complexity": 1, "from_address": "a@b"})),
                record(json!({"name": "A", "complexity": 2})),
            ],
            &when(),
        );
        assert_eq!(doc.templates.len(), 2);
        assert_eq!(doc.templates[0]["name"], "B");
        assert_eq!(doc.templates[0]["complexity"], 1);
        assert_eq!(doc.templates[1]["name"], "A");

        let keys: Vec<&String> = doc.templates[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "complexity", "from_address"]);
    }

    #[test]
    fn test_write_json() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("template_preview.json");
        let doc = IntermediateDocument::build(vec![record(json!({"name": "50% Off"}))], &when());
        doc.write_json(&path).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["templates"][0]["name"], "50\\% Off");
    }
}

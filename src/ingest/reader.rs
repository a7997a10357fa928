//! JSON record extraction
//!
//! Turns a stored JSON file into documents. A top-level array yields one
//! document per element; a top-level object yields a single document.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::IngestError;
use crate::ingest::Document;

/// Field names recognised in uploaded records, in the order they are rendered:
/// domain area, topic, subtopic, subtopic name, subject names, content body.
pub const RECORD_KEYS: [&str; 6] = [
    "area",
    "tema",
    "subtema",
    "nomsubtema",
    "nommaterias",
    "contenido",
];

/// Extracts documents from JSON using a fixed, ordered set of keys.
#[derive(Debug, Clone)]
pub struct JsonReader {
    keys: Vec<String>,
}

impl Default for JsonReader {
    fn default() -> Self {
        Self::new(RECORD_KEYS)
    }
}

impl JsonReader {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Reads and parses the file at `path`.
    pub fn read(&self, path: &Path) -> Result<Vec<Document>, IngestError> {
        let source = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| IngestError::Read {
            path: source.clone(),
            source: e,
        })?;
        self.parse(&bytes, &source)
    }

    /// Parses raw JSON bytes. `source` is only used in error messages.
    pub fn parse(&self, bytes: &[u8], source: &str) -> Result<Vec<Document>, IngestError> {
        let root: Value = serde_json::from_slice(bytes).map_err(|e| IngestError::Parse {
            path: source.to_string(),
            source: e,
        })?;

        match root {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(self.to_document(&map)),
                    other => Err(IngestError::InvalidStructure(format!(
                        "element {} of {} is {}, expected an object",
                        i,
                        source,
                        type_name(&other)
                    ))),
                })
                .collect(),
            Value::Object(map) => Ok(vec![self.to_document(&map)]),
            other => Err(IngestError::InvalidStructure(format!(
                "{} holds {}, expected an array or object",
                source,
                type_name(&other)
            ))),
        }
    }

    fn to_document(&self, item: &Map<String, Value>) -> Document {
        let mut content = String::new();
        for key in &self.keys {
            if let Some(value) = item.get(key) {
                content.push_str(key);
                content.push_str(": ");
                content.push_str(&render(value));
                content.push('\n');
            }
        }

        if content.is_empty() {
            content = Value::Object(item.clone()).to_string();
        }

        Document::new(content)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_array_yields_one_document_per_element() {
        let json = br#"[
            {"contenido": "Fotosintesis", "area": "Ciencias", "tema": "Plantas"},
            {"area": "Historia", "subtema": "Independencia"}
        ]"#;
        let docs = JsonReader::default().parse(json, "upload.json").unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[0].content,
            "area: Ciencias\ntema: Plantas\ncontenido: Fotosintesis\n"
        );
        assert_eq!(docs[1].content, "area: Historia\nsubtema: Independencia\n");
        assert_ne!(docs[0].id, docs[1].id);
        assert!(docs[0].metadata.is_empty());
    }

    #[test]
    fn test_single_object() {
        let docs = JsonReader::default()
            .parse(br#"{"tema": "Algebra", "ignored": 1}"#, "one.json")
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "tema: Algebra\n");
    }

    #[test]
    fn test_non_string_values_rendered_as_json() {
        let docs = JsonReader::default()
            .parse(br#"{"nommaterias": ["Fisica", "Quimica"], "area": 3}"#, "x.json")
            .unwrap();
        assert_eq!(
            docs[0].content,
            "area: 3\nnommaterias: [\"Fisica\",\"Quimica\"]\n"
        );
    }

    #[test]
    fn test_no_known_keys_falls_back_to_whole_record() {
        let docs = JsonReader::default()
            .parse(br#"[{"title": "x"}]"#, "x.json")
            .unwrap();
        assert_eq!(docs[0].content, r#"{"title":"x"}"#);
    }

    #[test]
    fn test_empty_array() {
        let docs = JsonReader::default().parse(b"[]", "x.json").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let result = JsonReader::default().parse(b"not json", "bad.json");
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn test_scalar_elements_rejected() {
        let result = JsonReader::default().parse(b"[1, 2]", "nums.json");
        assert!(matches!(result, Err(IngestError::InvalidStructure(_))));

        let result = JsonReader::default().parse(b"\"text\"", "str.json");
        assert!(matches!(result, Err(IngestError::InvalidStructure(_))));
    }

    #[test]
    fn test_custom_keys() {
        let reader = JsonReader::new(["b", "a"]);
        let docs = reader.parse(br#"{"a": "1", "b": "2"}"#, "x.json").unwrap();
        assert_eq!(docs[0].content, "b: 2\na: 1\n");
    }

    #[test]
    fn test_read_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        fs::write(&path, br#"[{"area": "Arte"}]"#).unwrap();

        let docs = JsonReader::default().read(&path).unwrap();
        assert_eq!(docs[0].content, "area: Arte\n");

        let missing = JsonReader::default().read(&temp.path().join("missing.json"));
        assert!(matches!(missing, Err(IngestError::Read { .. })));
    }
}

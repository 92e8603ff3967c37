//! Shape validation and merging of decoded collections.

use super::types::{Document, DocumentError};
use serde_json::Value;

/// Accept a value as a document only when it is a JSON object.
pub fn into_document(value: Value, source_name: &str) -> Result<Document, DocumentError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::invalid(
            source_name,
            format!("expected a JSON object, found {}", value_kind(&other)),
        )),
    }
}

/// Convert a list of values into documents, naming the offending element on failure.
pub fn normalize_values(
    values: Vec<Value>,
    source_name: &str,
) -> Result<Vec<Document>, DocumentError> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| into_document(value, &format!("{source_name}[{position}]")))
        .collect()
}

/// Concatenate collections in the given order.
pub fn combine<I>(collections: I) -> Vec<Document>
where
    I: IntoIterator<Item = Vec<Document>>,
{
    let mut combined = Vec::new();
    for collection in collections {
        combined.extend(collection);
    }
    combined
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    fn docs(values: Value) -> Vec<Document> {
        normalize_values(
            values.as_array().cloned().expect("array fixture"),
            "fixture",
        )
        .expect("objects")
    }

    #[test]
    fn combine_preserves_order_and_length() {
        let first = docs(json!([{ "id": 1, "name": "Test 1" }, { "id": 2, "name": "Test 2" }]));
        let second = docs(json!([{ "id": 3, "name": "Test 3" }]));

        let combined = combine([first.clone(), second.clone()]);

        assert_eq!(combined.len(), first.len() + second.len());
        let ids: Vec<_> = combined.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(&combined[..2], first.as_slice());
    }

    #[test]
    fn combine_single_collection_is_identity() {
        let only = docs(json!([{ "id": "a" }, { "id": "b" }]));
        assert_eq!(combine([only.clone()]), only);
        assert!(combine(Vec::<Vec<Document>>::new()).is_empty());
    }

    #[test]
    fn normalize_rejects_non_objects_with_position() {
        let error = normalize_values(vec![json!({ "id": 1 }), json!(5)], "movies.json")
            .expect_err("scalar element");
        match error {
            DocumentError::InvalidDocument {
                source_name,
                reason,
            } => {
                assert_eq!(source_name, "movies.json[1]");
                assert!(reason.contains("a number"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_values_are_kept() {
        let value = json!({ "id": 1, "tags": ["a"], "meta": { "x": null } });
        let doc = into_document(value, "inline").expect("object");
        assert_eq!(doc["tags"], json!(["a"]));
        assert_eq!(doc["meta"]["x"], Value::Null);
    }
}

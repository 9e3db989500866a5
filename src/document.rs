//! Navigation over the raw extraction result document. The document is kept
//! as `serde_json::Value` and only ever read; every accessor tolerates
//! missing structure by returning an empty view.

use serde_json::Value;
use std::path::Path;

/// Top-level records of a result document. A single document is treated as a
/// one-element list so batched and single results walk the same way.
pub fn records(document: &Value) -> Vec<&Value> {
    match document {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// The `result.data` blocks of one record (one per uploaded file).
pub fn data_blocks(record: &Value) -> &[Value] {
    record
        .get("result")
        .and_then(|r| r.get("data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The invoice structure of a block, if present and non-empty. Blocks without
/// an `extracted_data.invoice` wrapper are skipped by the line-item report.
pub fn invoice(block: &Value) -> Option<&Value> {
    let invoice = block.get("extracted_data")?.get("invoice")?;
    match invoice.as_object() {
        Some(map) if !map.is_empty() => Some(invoice),
        _ => None,
    }
}

/// Root of the extracted fields: the wrapped `invoice` key when present,
/// otherwise `extracted_data` itself. Some extraction assets emit the
/// invoice shape directly, so the fallback must stay.
pub fn extracted_root(block: &Value) -> Option<&Value> {
    let extracted = block.get("extracted_data")?;
    Some(extracted.get("invoice").unwrap_or(extracted))
}

/// String form of a scalar field. Numbers are stringified so values like an
/// order line number compare stably whether extracted as text or number.
pub fn field_string(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// True if the field is present with a non-empty scalar value.
pub fn has_field(value: &Value, key: &str) -> bool {
    !field_string(value, key).is_empty()
}

/// Stem used for output filenames: the original uploaded filename recorded in
/// the first data block, falling back to the stem of the saved JSON result.
pub fn source_stem(document: &Value, json_path: &Path) -> String {
    let filename = records(document)
        .first()
        .copied()
        .and_then(|record| data_blocks(record).first())
        .and_then(|block| block.get("filename"))
        .and_then(Value::as_str);
    let stem_of = |name: &str| {
        Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    };
    match filename {
        Some(name) => stem_of(name).unwrap_or_else(|| name.to_string()),
        None => json_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_document_is_one_record() {
        let doc = json!({"result": {"data": []}});
        assert_eq!(records(&doc).len(), 1);
        let doc = json!([{}, {}]);
        assert_eq!(records(&doc).len(), 2);
    }

    #[test]
    fn missing_result_yields_no_blocks() {
        assert!(data_blocks(&json!({})).is_empty());
        assert!(data_blocks(&json!({"result": {}})).is_empty());
    }

    #[test]
    fn invoice_requires_non_empty_wrapper() {
        let block = json!({"extracted_data": {"invoice": {"metadata": {}}}});
        assert!(invoice(&block).is_some());
        assert!(invoice(&json!({"extracted_data": {"invoice": {}}})).is_none());
        assert!(invoice(&json!({"extracted_data": {}})).is_none());
        assert!(invoice(&json!({})).is_none());
    }

    #[test]
    fn extracted_root_falls_back_to_extracted_data() {
        let wrapped = json!({"extracted_data": {"invoice": {"grand_total": 1}}});
        assert_eq!(extracted_root(&wrapped).unwrap(), &json!({"grand_total": 1}));
        let bare = json!({"extracted_data": {"service_locations": []}});
        assert_eq!(
            extracted_root(&bare).unwrap(),
            &json!({"service_locations": []})
        );
    }

    #[test]
    fn source_stem_prefers_recorded_filename() {
        let doc = json!({"result": {"data": [{"filename": "Invoice 42.pdf"}]}});
        assert_eq!(source_stem(&doc, Path::new("result.json")), "Invoice 42");
        let doc = json!({});
        assert_eq!(source_stem(&doc, Path::new("a/b/result.json")), "result");
    }
}

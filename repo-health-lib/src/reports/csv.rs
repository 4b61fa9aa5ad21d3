use crate::Result;
use ::csv::{Writer, WriterBuilder};
use ohno::IntoAppError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Render summary records as a CSV table.
///
/// The columns are the union of all record keys in first-seen order, so records
/// written by different versions of the worker line up under one header. Missing
/// and `null` values become empty cells; strings are written as-is and every other
/// value uses its JSON text.
pub fn generate(records: &[Map<String, Value>]) -> Result<Vec<u8>> {
    let columns = union_columns(records);
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut buf = Vec::new();
    {
        let mut writer = Writer::from_writer(&mut buf);
        writer.write_record(&columns).into_app_err("writing CSV header")?;

        for record in records {
            let row: Vec<String> = columns.iter().map(|column| cell(record.get(*column))).collect();
            writer.write_record(&row).into_app_err("writing CSV row")?;
        }

        writer.flush().into_app_err("flushing CSV output")?;
    }

    Ok(buf)
}

/// Render typed rows under an explicit header.
///
/// The header is written even when there are no rows.
pub fn generate_rows<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut buf);
        writer.write_record(header).into_app_err("writing CSV header")?;

        for row in rows {
            writer.serialize(row).into_app_err("writing CSV row")?;
        }

        writer.flush().into_app_err("flushing CSV output")?;
    }

    Ok(buf)
}

fn union_columns(records: &[Map<String, Value>]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in records.iter().flat_map(Map::keys) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_generate_empty() {
        assert!(generate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_generate_uniform_schema() {
        let records = vec![
            record(json!({"repo": "a/b", "stars": 10, "license": "MIT"})),
            record(json!({"repo": "c/d", "stars": 20, "license": null})),
        ];

        let out = as_text(generate(&records).unwrap());
        assert_eq!(out, "repo,stars,license\na/b,10,MIT\nc/d,20,\n");
    }

    #[test]
    fn test_generate_union_of_columns() {
        let records = vec![
            record(json!({"repo": "a/b", "stars": 10})),
            record(json!({"repo": "c/d", "recent_commits": 3, "stars": 5})),
        ];

        let out = as_text(generate(&records).unwrap());
        assert_eq!(out, "repo,stars,recent_commits\na/b,10,\nc/d,5,3\n");
    }

    #[test]
    fn test_generate_escapes_commas_and_quotes() {
        let records = vec![record(json!({"repo": "a/b", "license": "BSD, \"modified\""}))];

        let out = as_text(generate(&records).unwrap());
        assert_eq!(out, "repo,license\na/b,\"BSD, \"\"modified\"\"\"\n");
    }

    #[test]
    fn test_generate_non_string_values() {
        let records = vec![record(json!({"score": 12.5, "ok": true, "tags": ["x", "y"]}))];

        let out = as_text(generate(&records).unwrap());
        assert_eq!(out, "score,ok,tags\n12.5,true,\"[\"\"x\"\",\"\"y\"\"]\"\n");
    }

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        count: u32,
        note: Option<&'static str>,
    }

    #[test]
    fn test_generate_rows() {
        let rows = [
            Row {
                name: "a",
                count: 1,
                note: None,
            },
            Row {
                name: "b,c",
                count: 2,
                note: Some("x"),
            },
        ];

        let out = as_text(generate_rows(&["name", "count", "note"], &rows).unwrap());
        assert_eq!(out, "name,count,note\na,1,\n\"b,c\",2,x\n");
    }

    #[test]
    fn test_generate_rows_header_only() {
        let out = as_text(generate_rows::<Row>(&["name", "count", "note"], &[]).unwrap());
        assert_eq!(out, "name,count,note\n");
    }
}

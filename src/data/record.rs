//! Raw sensor records: loading from JSON or CSV and the flattened CSV artifact.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ForecastError, Result};

/// One sensor observation as it appears in the input log
///
/// `_id` and `__v` are bookkeeping fields of the exporting database; they are
/// carried as text so the CSV artifact can echo them and are never used in
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "_id", default, deserialize_with = "bookkeeping_field")]
    pub id: Option<String>,
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
    #[serde(rename = "__v", default, deserialize_with = "bookkeeping_field")]
    pub version: Option<String>,
}

impl SensorRecord {
    pub fn new(timestamp: impl Into<String>, temperature: f64, humidity: f64, light: f64) -> Self {
        SensorRecord {
            id: None,
            timestamp: timestamp.into(),
            temperature,
            humidity,
            light,
            version: None,
        }
    }
}

/// Accepts any JSON/CSV scalar or object and keeps its textual form
fn bookkeeping_field<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }))
}

/// Load sensor records from `path`
///
/// The format is detected from the content rather than the extension: input
/// starting with `[` or `{` is JSON (an array of records or a single record),
/// anything else is CSV with a header row.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<SensorRecord>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| ForecastError::io(path, e))?;

    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents.as_str());

    let records = match contents.trim_start().chars().next() {
        Some('[') | Some('{') => parse_json(path, contents)?,
        _ => parse_csv(path, contents)?,
    };

    tracing::info!(path = %path.display(), records = records.len(), "loaded sensor records");
    Ok(records)
}

fn parse_json(path: &Path, contents: &str) -> Result<Vec<SensorRecord>> {
    let parse_error = |reason: String| ForecastError::InputParse {
        path: path.to_path_buf(),
        reason,
    };

    let document: Value = serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))?;
    let values = match document {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        other => return Err(parse_error(format!("expected an object or array, found {}", other))),
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| parse_error(format!("record {}: {}", index, e)))
        })
        .collect()
}

/// Columns every CSV input must carry
const REQUIRED_COLUMNS: [&str; 4] = ["timestamp", "temperature", "humidity", "light"];

fn parse_csv(path: &Path, contents: &str) -> Result<Vec<SensorRecord>> {
    let parse_error = |reason: String| ForecastError::InputParse {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let headers = reader.headers().map_err(|e| parse_error(format!("header: {}", e)))?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        return Err(parse_error(format!("missing column(s): {}", missing.join(", "))));
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| ForecastError::InputParse {
                path: path.to_path_buf(),
                reason: format!("record {}: {}", index, e),
            })
        })
        .collect()
}

/// Write the flattened table, one row per record, replacing any previous file
pub fn write_flattened_csv<P: AsRef<Path>>(records: &[SensorRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let artifact_error = |source: csv::Error| ForecastError::Artifact {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(artifact_error)?;
    if records.is_empty() {
        writer
            .write_record(["_id", "timestamp", "temperature", "humidity", "light", "__v"])
            .map_err(artifact_error)?;
    }
    for record in records {
        writer.serialize(record).map_err(artifact_error)?;
    }
    writer.flush().map_err(|e| ForecastError::io(path, e))?;

    tracing::info!(path = %path.display(), rows = records.len(), "wrote CSV artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MONGO_EXPORT: &str = r#"[
        {"_id": "6650c1a2f1", "timestamp": "2024-05-24T10:05:00.000Z", "temperature": 21.5, "humidity": 40, "light": 300, "__v": 0},
        {"_id": {"$oid": "6650c1a2f2"}, "timestamp": "2024-05-24T10:35:00.000Z", "temperature": 22.5, "humidity": 42, "light": 310, "__v": 0}
    ]"#;

    #[test]
    fn test_load_json_array_with_csv_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        fs::write(&path, MONGO_EXPORT).unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("6650c1a2f1"));
        assert_eq!(records[0].version.as_deref(), Some("0"));
        assert_eq!(records[1].id.as_deref(), Some(r#"{"$oid":"6650c1a2f2"}"#));
        assert_eq!(records[1].humidity, 42.0);
    }

    #[test]
    fn test_single_object_is_one_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("single.json");
        fs::write(
            &path,
            r#"{"timestamp": "2024-05-24T10:05:00Z", "temperature": 20.0, "humidity": 55.0, "light": 120.0}"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records, vec![SensorRecord::new("2024-05-24T10:05:00Z", 20.0, 55.0, 120.0)]);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"[{"timestamp": "2024-05-24T10:05:00Z", "temperature": 20.0, "light": 1.0}]"#).unwrap();

        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, ForecastError::InputParse { .. }));
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_records(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ForecastError::Io { .. }));
    }

    #[test]
    fn test_artifact_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("datos.csv");
        let artifact = dir.path().join("datos_convertidos.csv");
        fs::write(&source, MONGO_EXPORT).unwrap();

        let records = load_records(&source).unwrap();
        write_flattened_csv(&records, &artifact).unwrap();

        let text = fs::read_to_string(&artifact).unwrap();
        assert!(text.starts_with("_id,timestamp,temperature,humidity,light,__v\n"));
        assert_eq!(text.lines().count(), 3);

        let reloaded = load_records(&artifact).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn test_json_with_byte_order_mark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        fs::write(
            &path,
            "\u{feff}[{\"timestamp\":\"2024-05-24T10:00:00Z\",\"temperature\":1,\"humidity\":2,\"light\":3}]",
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records, vec![SensorRecord::new("2024-05-24T10:00:00Z", 1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_csv_with_byte_order_mark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}timestamp,temperature,humidity,light\n2024-05-24 10:05:00,21.0,40.0,300.0\n").unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "2024-05-24 10:05:00");
    }

    #[test]
    fn test_csv_missing_required_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrong.csv");
        fs::write(&path, "timestamp,temperature,pressure\n2024-05-24 10:05:00,21.0,1013\n").unwrap();

        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, ForecastError::InputParse { .. }));
        assert!(err.to_string().contains("humidity, light"));
    }

    #[test]
    fn test_text_without_table_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        fs::write(&path, "these are not sensor readings").unwrap();

        assert!(matches!(load_records(&path), Err(ForecastError::InputParse { .. })));
    }

    #[test]
    fn test_csv_without_bookkeeping_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        fs::write(&path, "timestamp,temperature,humidity,light\n2024-05-24 10:05:00,21.0,40.0,300.0\n").unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, None);
        assert_eq!(records[0].light, 300.0);
    }
}

//! Extracted records: the terminal artifact of a successful job, plus CSV
//! rendering.
//!
//! ## Result derivation policy
//!
//! The remote response is authoritative when it contains a record-shaped
//! JSON array (objects with `id`/`field`/`value`/`type`), directly or under
//! a top-level wrapper key. When it does not (current service versions
//! return an opaque acknowledgement), the flow falls back to
//! [`fallback_records`], a fixed transformation of the first file's name,
//! size, and the current date into four rows. The fallback is a placeholder
//! standing in for true content-based extraction, kept so the flow stays
//! usable end-to-end; it is not the intended long-term contract.

use crate::audit::{ApiCallRecord, AuditLog};
use crate::error::FlowError;
use crate::upload::UploadedFile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use tracing::{debug, info};

/// One row of the final result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Row identifier, 1-based.
    pub id: u32,
    /// Field label, e.g. `"File Size"`.
    pub field: String,
    /// Rendered value, e.g. `"2.0 KB"`.
    pub value: String,
    /// Value category: `Text`, `Number`, `Date`, `Status`, ...
    #[serde(rename = "type")]
    pub kind: String,
}

/// Humanize a byte count the way the result table displays it: kibibytes
/// with one decimal, e.g. 2048 → `"2.0 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Try to read an authoritative record list out of the applyPrompt response
/// body.
///
/// Accepts the array at the top level or under any top-level object key;
/// every element must parse as an [`ExtractedRecord`] and the array must be
/// non-empty, otherwise the body is treated as opaque and `None` is
/// returned.
pub fn records_from_response(body: &serde_json::Value) -> Option<Vec<ExtractedRecord>> {
    let candidates: Vec<&serde_json::Value> = match body {
        serde_json::Value::Array(_) => vec![body],
        serde_json::Value::Object(map) => map.values().filter(|v| v.is_array()).collect(),
        _ => return None,
    };

    for candidate in candidates {
        if let Ok(records) = serde_json::from_value::<Vec<ExtractedRecord>>(candidate.clone()) {
            if !records.is_empty() {
                debug!(count = records.len(), "derived records from response body");
                return Some(records);
            }
        }
    }
    None
}

/// The metadata-only fallback: four fixed rows derived from the first file.
///
/// Placeholder policy: see the module docs.
pub fn fallback_records(first_file: &UploadedFile) -> Vec<ExtractedRecord> {
    let today = OffsetDateTime::now_utc().date();
    vec![
        ExtractedRecord {
            id: 1,
            field: "Document Title".into(),
            value: first_file.name.clone(),
            kind: "Text".into(),
        },
        ExtractedRecord {
            id: 2,
            field: "File Size".into(),
            value: format_file_size(first_file.size),
            kind: "Number".into(),
        },
        ExtractedRecord {
            id: 3,
            field: "Upload Date".into(),
            value: format!(
                "{:04}-{:02}-{:02}",
                today.year(),
                today.month() as u8,
                today.day()
            ),
            kind: "Date".into(),
        },
        ExtractedRecord {
            id: 4,
            field: "Status".into(),
            value: "Processed".into(),
            kind: "Status".into(),
        },
    ]
}

/// Render records as CSV text: header row plus one quoted row per record.
pub fn to_csv(records: &[ExtractedRecord]) -> String {
    let mut out = String::from("id,field,value,type\n");
    for r in records {
        out.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\"\n",
            r.id,
            csv_escape(&r.field),
            csv_escape(&r.value),
            csv_escape(&r.kind),
        ));
    }
    out
}

fn csv_escape(field: &str) -> String {
    field.replace('"', "\"\"")
}

/// Write records to `path` as CSV and append the synthetic `Export` audit
/// entry (kind `Export`, target `local`).
///
/// The write is atomic: content goes to a sibling `.tmp` file which is then
/// renamed over the destination, so a crash never leaves a partial export.
pub async fn export_csv(
    records: &[ExtractedRecord],
    path: impl AsRef<Path>,
    audit: &AuditLog,
) -> Result<(), FlowError> {
    let path = path.as_ref();
    let csv = to_csv(records);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FlowError::ExportFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, &csv)
        .await
        .map_err(|e| FlowError::ExportFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| FlowError::ExportFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    audit.append(ApiCallRecord::export());
    info!(path = %path.display(), rows = records.len(), "exported records to CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_file_size_matches_table_rendering() {
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(0), "0.0 KB");
    }

    #[test]
    fn fallback_has_four_rows_from_first_file() {
        let file = UploadedFile::from_text("report.txt", "x".repeat(2048));
        let records = fallback_records(&file);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].value, "report.txt");
        assert_eq!(
            records[1],
            ExtractedRecord {
                id: 2,
                field: "File Size".into(),
                value: "2.0 KB".into(),
                kind: "Number".into(),
            }
        );
        assert_eq!(records[3].value, "Processed");
    }

    #[test]
    fn response_array_is_authoritative() {
        let body = json!([
            {"id": 1, "field": "Invoice No", "value": "INV-17", "type": "Text"},
            {"id": 2, "field": "Total", "value": "400.00", "type": "Number"}
        ]);
        let records = records_from_response(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field, "Invoice No");
    }

    #[test]
    fn wrapped_response_array_is_found() {
        let body = json!({
            "status": "done",
            "records": [
                {"id": 1, "field": "Title", "value": "Q3", "type": "Text"}
            ]
        });
        assert_eq!(records_from_response(&body).unwrap().len(), 1);
    }

    #[test]
    fn opaque_bodies_yield_none() {
        assert!(records_from_response(&json!({"message": "object created"})).is_none());
        assert!(records_from_response(&json!("ok")).is_none());
        assert!(records_from_response(&json!([])).is_none());
        assert!(records_from_response(&json!([{"unrelated": true}])).is_none());
    }

    #[test]
    fn csv_quotes_every_field_and_escapes_quotes() {
        let records = vec![ExtractedRecord {
            id: 1,
            field: "Say \"hi\"".into(),
            value: "a,b".into(),
            kind: "Text".into(),
        }];
        let csv = to_csv(&records);
        assert_eq!(csv, "id,field,value,type\n\"1\",\"Say \"\"hi\"\"\",\"a,b\",\"Text\"\n");
    }

    #[tokio::test]
    async fn export_writes_file_and_audits_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_data.csv");
        let audit = AuditLog::new();
        let file = UploadedFile::from_text("a.txt", "body");

        export_csv(&fallback_records(&file), &path, &audit).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("id,field,value,type\n"));
        assert_eq!(written.lines().count(), 5);

        let entries = audit.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "local");
        assert_eq!(entries[0].success, Some(true));
    }
}

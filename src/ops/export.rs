use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat};

use crate::model::task::Task;

/// Header row of the CSV export
pub const CSV_HEADER: &str = "ID,Text,Done,Category,Priority,Created";

/// Error type for import operations. Any error rejects the whole file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid file format: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid file format: expected a JSON array of tasks")]
    NotAnArray,
    #[error("invalid task at index {index}: {source}")]
    InvalidTask {
        index: usize,
        source: serde_json::Error,
    },
    #[error("invalid task at index {0}: text is empty")]
    EmptyText(usize),
    #[error("duplicate task id: {0}")]
    DuplicateId(String),
    #[error("invalid task at index {0}: createdAt is out of range")]
    InvalidTimestamp(usize),
}

/// Pretty-printed JSON array of all tasks
pub fn export_json(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tasks)
}

/// CSV with one row per task in collection order.
///
/// Text is always quoted (embedded quotes doubled); `Created` is an ISO-8601
/// UTC instant with milliseconds. Rows are newline-separated with no
/// trailing newline, so an empty list yields just the header.
pub fn export_csv(tasks: &[Task]) -> String {
    let mut rows = Vec::with_capacity(tasks.len() + 1);
    rows.push(CSV_HEADER.to_string());
    for t in tasks {
        rows.push(format!(
            "{},\"{}\",{},{},{},{}",
            t.id,
            t.text.replace('"', "\"\""),
            t.done,
            t.category,
            t.priority,
            iso_instant(t.created_at),
        ));
    }
    rows.join("\n")
}

/// Render epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Values outside chrono's range fall back to the raw millisecond count.
pub fn iso_instant(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => {
            tracing::warn!(created_at = ms, "timestamp out of range; exporting raw milliseconds");
            ms.to_string()
        }
    }
}

/// Parse an exported JSON file back into a task list.
///
/// The content must be a JSON array whose every element is a valid task
/// with non-empty text and a unique id. Nothing is returned unless the
/// whole file passes.
pub fn import_json(content: &str) -> Result<Vec<Task>, ImportError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let serde_json::Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    let mut tasks = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let task: Task = serde_json::from_value(item)
            .map_err(|source| ImportError::InvalidTask { index, source })?;
        if task.text.trim().is_empty() {
            return Err(ImportError::EmptyText(index));
        }
        if DateTime::from_timestamp_millis(task.created_at).is_none() {
            return Err(ImportError::InvalidTimestamp(index));
        }
        if !seen.insert(task.id.clone()) {
            return Err(ImportError::DuplicateId(task.id));
        }
        tasks.push(task);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    #[test]
    fn csv_of_empty_list_is_header_only() {
        assert_eq!(export_csv(&[]), "ID,Text,Done,Category,Priority,Created");
    }

    #[test]
    fn csv_rows() {
        let tasks = vec![
            Task::new("a1", "Say \"hi\"", 0).with_category("work"),
            Task::new("b2", "Plain, with comma", 1_700_000_000_123)
                .with_priority(Priority::High)
                .done(),
        ];
        let csv = export_csv(&tasks);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "a1,\"Say \"\"hi\"\"\",false,work,medium,1970-01-01T00:00:00.000Z"
        );
        assert_eq!(
            lines[2],
            "b2,\"Plain, with comma\",true,personal,high,2023-11-14T22:13:20.123Z"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn csv_keeps_out_of_range_timestamps_as_millis() {
        assert_eq!(iso_instant(i64::MAX), i64::MAX.to_string());
        let csv = export_csv(&[Task::new("a", "far", i64::MAX)]);
        assert!(csv.ends_with(&format!(",{}", i64::MAX)));
    }

    #[test]
    fn json_export_is_pretty_array() {
        let tasks = vec![Task::new("a", "one", 1)];
        let json = export_json(&tasks).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"createdAt\": 1"));
    }

    #[test]
    fn import_accepts_exported_json() {
        let tasks = vec![
            Task::new("a", "one", 1),
            Task::new("b", "two", 2).with_priority(Priority::Low),
        ];
        let json = export_json(&tasks).unwrap();
        assert_eq!(import_json(&json).unwrap(), tasks);
    }

    #[test]
    fn import_accepts_legacy_shape() {
        let json = r#"[{"id":"x","text":"old","done":false,"createdAt":1}]"#;
        let tasks = import_json(json).unwrap();
        assert_eq!(tasks[0].text, "old");
    }

    #[test]
    fn import_rejects_non_array() {
        assert!(matches!(
            import_json(r#"{"tasks":[]}"#),
            Err(ImportError::NotAnArray)
        ));
    }

    #[test]
    fn import_rejects_malformed_json() {
        assert!(matches!(
            import_json("[{not json"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn import_rejects_bad_element() {
        let json = r#"[{"id":"a","text":"ok","createdAt":1},{"text":"no id"}]"#;
        assert!(matches!(
            import_json(json),
            Err(ImportError::InvalidTask { index: 1, .. })
        ));
    }

    #[test]
    fn import_rejects_blank_text_and_duplicates() {
        let blank = r#"[{"id":"a","text":"  ","createdAt":1}]"#;
        assert!(matches!(import_json(blank), Err(ImportError::EmptyText(0))));
        let dup = r#"[{"id":"a","text":"x","createdAt":1},{"id":"a","text":"y","createdAt":2}]"#;
        assert!(matches!(import_json(dup), Err(ImportError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn import_rejects_unrepresentable_created_at() {
        let json = format!(
            r#"[{{"id":"a","text":"ok","createdAt":1}},{{"id":"b","text":"far","createdAt":{}}}]"#,
            i64::MAX
        );
        assert!(matches!(
            import_json(&json),
            Err(ImportError::InvalidTimestamp(1))
        ));
    }

    #[test]
    fn import_of_empty_array_is_ok() {
        assert!(import_json("[]").unwrap().is_empty());
    }
}

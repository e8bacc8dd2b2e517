use super::TIMESTAMP_FIELD;
use crate::graylog::parse_timestamp;
use crate::rules::LogEntry;
use csv::ReaderBuilder;

/// Parsed CSV export: column names in export order plus entries sorted by time.
#[derive(Debug, Default)]
pub struct ExportBatch {
    pub fields: Vec<String>,
    pub entries: Vec<LogEntry>,
}

/// Parses exported CSV lines (header first) and sorts the entries ascending by
/// timestamp.
///
/// Rows that cannot be parsed, or whose timestamp is not in the Graylog format,
/// are dropped. Entries with an empty or missing timestamp are kept for the
/// filter to reject.
pub fn parse_export(lines: &[String]) -> ExportBatch {
    let text = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let fields: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read export header");
            return ExportBatch::default();
        }
    };

    let mut entries = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(row, error = %e, "Dropping unparseable row");
                continue;
            }
        };

        let entry: LogEntry = fields.iter().map(String::as_str).zip(record.iter()).collect();

        if let Some(timestamp) = entry.non_empty(TIMESTAMP_FIELD) {
            if let Err(e) = parse_timestamp(timestamp) {
                tracing::debug!(row, error = %e, "Dropping row with malformed timestamp");
                continue;
            }
        }

        entries.push(entry);
    }

    // stable, so entries with equal timestamps keep their export order
    entries.sort_by_cached_key(|entry| {
        entry
            .non_empty(TIMESTAMP_FIELD)
            .and_then(|ts| parse_timestamp(ts).ok())
    });

    ExportBatch { fields, entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_and_sort() {
        let batch = parse_export(&lines(
            "timestamp,correlationId,message\n\
             2020-01-01T01:00:02.000Z,1,message2\n\
             2020-01-01T01:00:01.000Z,2,message1\n\
             2020-01-01T01:00:00.000Z,1,message0\n",
        ));

        assert_eq!(batch.fields, vec!["timestamp", "correlationId", "message"]);
        let messages: Vec<&str> = batch.entries.iter().map(|e| e.get("message").unwrap()).collect();
        assert_eq!(messages, vec!["message0", "message1", "message2"]);
    }

    #[test]
    fn test_quoted_fields() {
        let batch = parse_export(&lines(
            "timestamp,correlationId,message\n\
             2020-01-01T01:00:00.000Z,1,\"hello, world\"\n",
        ));
        assert_eq!(batch.entries[0].get("message"), Some("hello, world"));
    }

    #[test]
    fn test_short_row_dropped() {
        let batch = parse_export(&lines(
            "timestamp,correlationId,message\n\
             2020-01-01T01:01:05.000Z,3,message5\n    ",
        ));
        assert_eq!(batch.entries.len(), 1);
    }

    #[test]
    fn test_malformed_timestamp_dropped() {
        let batch = parse_export(&lines(
            "timestamp,correlationId,message\n\
             yesterday,1,message0\n\
             2020-01-01T01:00:00.000Z,1,message1\n",
        ));
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].get("message"), Some("message1"));
    }

    #[test]
    fn test_empty_timestamp_kept_for_filter() {
        let batch = parse_export(&lines(
            "timestamp,correlationId,message\n\
             2020-01-01T01:00:00.000Z,1,message1\n\
             ,1,message0\n",
        ));
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entries[0].get("timestamp"), Some(""));
    }

    #[test]
    fn test_header_only() {
        let batch = parse_export(&lines("timestamp,correlationId,message"));
        assert_eq!(batch.fields.len(), 3);
        assert!(batch.entries.is_empty());
    }
}

use super::{CORRELATION_ID_FIELD, MESSAGE_FIELD, TIMESTAMP_FIELD};
use crate::rules::LogEntry;
use std::collections::{HashMap, HashSet};

/// Entries of one batch that share a correlation id, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub correlation_id: String,
    pub entries: Vec<LogEntry>,
}

impl Session {
    /// Name of the file the session is stored in:
    /// `{timestamp of first entry}_{correlationId}.csv`, made filesystem safe.
    pub fn file_name(&self) -> String {
        let first_timestamp = self
            .entries
            .first()
            .and_then(|e| e.get(TIMESTAMP_FIELD))
            .unwrap_or_default();
        sanitize_file_name(&format!("{}_{}.csv", first_timestamp, self.correlation_id))
    }

    /// Encodes the session as CSV with the given header.
    /// Fields an entry does not have are written empty.
    pub fn to_csv(&self, header: &[String]) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(header)?;
        for entry in &self.entries {
            writer.write_record(header.iter().map(|field| entry.get(field).unwrap_or("")))?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Groups chronologically sorted entries by correlation id.
///
/// Sessions are returned in order of their first entry. Entries without a
/// correlation id are dropped.
pub fn group_by_correlation_id(entries: Vec<LogEntry>) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let Some(correlation_id) = entry.non_empty(CORRELATION_ID_FIELD).map(str::to_string) else {
            tracing::info!(entry = ?entry, "Omitting entry with missing correlationId");
            continue;
        };

        match index.get(&correlation_id) {
            Some(&i) => sessions[i].entries.push(entry),
            None => {
                index.insert(correlation_id.clone(), sessions.len());
                sessions.push(Session {
                    correlation_id,
                    entries: vec![entry],
                });
            }
        }
    }

    sessions
}

/// File names claimed by more than one session, in order of first collision.
///
/// Sanitizing can map distinct correlation ids (`a:b`, `a_b`) to the same name.
pub fn duplicate_file_names(sessions: &[Session]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in sessions.iter().map(Session::file_name) {
        if !seen.insert(name.clone()) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

/// Moves `message` to the last column; it is the only free-text field.
pub fn header_with_message_last(mut fields: Vec<String>) -> Vec<String> {
    fields.retain(|f| f != MESSAGE_FIELD);
    fields.push(MESSAGE_FIELD.to_string());
    fields
}

/// `:` is reserved on Windows; path separators would escape the target directory.
fn sanitize_file_name(name: &str) -> String {
    name.replace([':', '/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: &str, correlation_id: &str, message: &str) -> LogEntry {
        [
            (TIMESTAMP_FIELD, timestamp),
            (CORRELATION_ID_FIELD, correlation_id),
            (MESSAGE_FIELD, message),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_group_preserves_order() {
        let sessions = group_by_correlation_id(vec![
            entry("2020-01-01T01:00:00.000Z", "1", "message0"),
            entry("2020-01-01T01:00:01.000Z", "2", "message1"),
            entry("2020-01-01T01:00:02.000Z", "1", "message2"),
            entry("2020-01-01T01:00:03.000Z", "2", "message3"),
        ]);

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].correlation_id, "1");
        assert_eq!(sessions[1].correlation_id, "2");
        let messages: Vec<&str> = sessions[0]
            .entries
            .iter()
            .map(|e| e.get(MESSAGE_FIELD).unwrap())
            .collect();
        assert_eq!(messages, vec!["message0", "message2"]);
    }

    #[test]
    fn test_group_drops_missing_correlation_id() {
        let sessions = group_by_correlation_id(vec![
            entry("2020-01-01T01:00:00.000Z", "", "orphan"),
            entry("2020-01-01T01:00:01.000Z", "1", "kept"),
        ]);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].entries.len(), 1);
    }

    #[test]
    fn test_file_name_sanitized() {
        let session = Session {
            correlation_id: "a/b".to_string(),
            entries: vec![entry("2020-01-01T01:00:00.000Z", "a/b", "m")],
        };
        assert_eq!(session.file_name(), "2020-01-01T01_00_00.000Z_a_b.csv");
    }

    #[test]
    fn test_duplicate_file_names_after_sanitizing() {
        let sessions = group_by_correlation_id(vec![
            entry("2020-01-01T01:00:00.000Z", "a:b", "first"),
            entry("2020-01-01T01:00:00.000Z", "a_b", "second"),
            entry("2020-01-01T01:00:00.000Z", "c", "third"),
        ]);

        assert_eq!(sessions.len(), 3);
        assert_eq!(
            duplicate_file_names(&sessions),
            vec!["2020-01-01T01_00_00.000Z_a_b.csv"]
        );
        assert!(duplicate_file_names(&sessions[1..]).is_empty());
    }

    #[test]
    fn test_header_with_message_last() {
        let header = header_with_message_last(vec![
            "timestamp".to_string(),
            "message".to_string(),
            "correlationId".to_string(),
            "approach".to_string(),
        ]);
        assert_eq!(header, vec!["timestamp", "correlationId", "approach", "message"]);
    }

    #[test]
    fn test_to_csv_writes_missing_fields_empty() {
        let session = Session {
            correlation_id: "1".to_string(),
            entries: vec![entry("2020-01-01T01:00:00.000Z", "1", "hello, world")],
        };
        let header = vec![
            "timestamp".to_string(),
            "correlationId".to_string(),
            "approach".to_string(),
            "message".to_string(),
        ];

        let csv = String::from_utf8(session.to_csv(&header).unwrap()).unwrap();
        assert_eq!(
            csv,
            "timestamp,correlationId,approach,message\n\
             2020-01-01T01:00:00.000Z,1,,\"hello, world\"\n"
        );
    }
}

//! Sequenced log entries and their line format
//!
//! One entry is one line: `seq \t action-or-message \t key-or-NULL \t value-or-NULL \n`.
//! Backslash, tab, newline and carriage return inside fields are escaped so a
//! field can never break the line structure. A field that would otherwise read
//! back as a placeholder (a value spelled `NULL`, an error message spelled like
//! an action) is prefixed with the empty escape `\0`.

use std::fmt::Write as _;

use crate::error::{Error, Result};

use super::{Action, ErrorEvent, Event};

/// Placeholder written for absent fields
pub const NULL_FIELD: &str = "NULL";

/// Escape that decodes to nothing; marks a literal that collides with a placeholder
const GUARD: &str = "\\0";

/// Payload of a log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    Event(Event),
    Error(ErrorEvent),
}

/// An entry as written to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position in the global stream, starting at 1
    pub sequence_id: u64,
    pub body: EntryBody,
}

impl LogEntry {
    /// Render the entry as a newline-terminated line
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(64);
        self.write_line(&mut line);
        line
    }

    /// Append the rendered line to `out`
    pub fn write_line(&self, out: &mut String) {
        // Writing into a String cannot fail
        let _ = write!(out, "{}\t", self.sequence_id);

        match &self.body {
            EntryBody::Event(event) => {
                out.push_str(event.action.name());
                out.push('\t');
                escape_into(&event.key, out);
                out.push('\t');
                match &event.value {
                    Some(value) => {
                        if value == NULL_FIELD {
                            out.push_str(GUARD);
                        }
                        escape_into(value, out);
                    }
                    None => out.push_str(NULL_FIELD),
                }
            }
            EntryBody::Error(err) => {
                if err.message.parse::<Action>().is_ok() {
                    out.push_str(GUARD);
                }
                escape_into(&err.message, out);
                out.push('\t');
                out.push_str(NULL_FIELD);
                out.push('\t');
                out.push_str(NULL_FIELD);
            }
        }

        out.push('\n');
    }

    /// Parse a line produced by [`LogEntry::to_line`].
    ///
    /// A second field naming an action makes an event; anything else is an
    /// error message. A bare `NULL` value reads back as absent; a guarded one
    /// (`\0NULL`) reads back as the string.
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() != 4 {
            return Err(Error::MalformedEntry(format!(
                "expected 4 fields, found {}",
                fields.len()
            )));
        }

        let sequence_id = fields[0]
            .parse::<u64>()
            .map_err(|e| Error::MalformedEntry(format!("bad sequence id {:?}: {}", fields[0], e)))?;

        let body = match fields[1].parse::<Action>() {
            Ok(action) => EntryBody::Event(Event {
                action,
                key: unescape(fields[2])?,
                value: match fields[3] {
                    NULL_FIELD => None,
                    value => Some(unescape(value)?),
                },
            }),
            Err(_) => EntryBody::Error(ErrorEvent::new(unescape(fields[1])?)),
        };

        Ok(Self { sequence_id, body })
    }

    /// Check if this entry journals an error
    pub fn is_error(&self) -> bool {
        matches!(self.body, EntryBody::Error(_))
    }
}

fn escape_into(field: &str, out: &mut String) {
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

fn unescape(field: &str) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => {}
            other => {
                return Err(Error::MalformedEntry(format!(
                    "invalid escape sequence: \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_line_format() {
        let entry = LogEntry {
            sequence_id: 1,
            body: EntryBody::Event(Event::put("a", "1")),
        };
        assert_eq!(entry.to_line(), "1\tPUT\ta\t1\n");
    }

    #[test]
    fn test_delete_and_error_lines_use_null() {
        let delete = LogEntry {
            sequence_id: 7,
            body: EntryBody::Event(Event::delete("a")),
        };
        assert_eq!(delete.to_line(), "7\tDELETE\ta\tNULL\n");

        let error = LogEntry {
            sequence_id: 8,
            body: EntryBody::Error(ErrorEvent::new("key already exists")),
        };
        assert_eq!(error.to_line(), "8\tkey already exists\tNULL\tNULL\n");
        assert!(error.is_error());
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let entry = LogEntry {
            sequence_id: 3,
            body: EntryBody::Event(Event::put("tab\tkey", "line one\nline two\\")),
        };
        let line = entry.to_line();

        assert_eq!(line, "3\tPUT\ttab\\tkey\tline one\\nline two\\\\\n");
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(LogEntry::parse_line(&line).unwrap(), entry);
    }

    #[test]
    fn test_placeholder_lookalikes_survive_parsing() {
        let literal_null = LogEntry {
            sequence_id: 4,
            body: EntryBody::Event(Event::put("a", "NULL")),
        };
        assert_eq!(literal_null.to_line(), "4\tPUT\ta\t\\0NULL\n");
        assert_eq!(LogEntry::parse_line(&literal_null.to_line()).unwrap(), literal_null);

        let action_message = LogEntry {
            sequence_id: 5,
            body: EntryBody::Error(ErrorEvent::new("GET")),
        };
        assert_eq!(action_message.to_line(), "5\t\\0GET\tNULL\tNULL\n");
        assert_eq!(LogEntry::parse_line(&action_message.to_line()).unwrap(), action_message);

        // Keys are never placeholders and stay unguarded
        let null_key = LogEntry {
            sequence_id: 6,
            body: EntryBody::Event(Event::delete("NULL")),
        };
        assert_eq!(null_key.to_line(), "6\tDELETE\tNULL\tNULL\n");
        assert_eq!(LogEntry::parse_line(&null_key.to_line()).unwrap(), null_key);
    }

    #[test]
    fn test_parse_error_entry() {
        let entry = LogEntry::parse_line("12\tkey not found\tNULL\tNULL\n").unwrap();
        assert_eq!(entry.sequence_id, 12);
        assert_eq!(entry.body, EntryBody::Error(ErrorEvent::new("key not found")));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(LogEntry::parse_line("1\tPUT\ta").is_err());
        assert!(LogEntry::parse_line("x\tPUT\ta\t1").is_err());
        assert!(LogEntry::parse_line("1\tPUT\ta\\q\t1").is_err());
    }
}

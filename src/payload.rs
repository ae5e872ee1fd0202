//! Wire format for the `x-chromelogger-data` header
//!
//! A payload is a JSON document of the shape
//!
//! ```json
//! {"version": "1.1.1", "columns": ["log", "backtrace", "type"], "rows": [[["msg"], "src/main.rs:10:5", ""]]}
//! ```
//!
//! encoded as ASCII-only JSON and then base64. Rows are positional tuples whose
//! layout is declared by `columns`.

use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{
    de::Deserializer,
    ser::{SerializeTuple, Serializer},
    Deserialize, Serialize,
};
use serde_json::{ser::Formatter, Value};
use std::io;

use crate::error::DecodeError;

/// Response header carrying the encoded payload
pub const HEADER_NAME: &str = "x-chromelogger-data";

/// Wire format version reported in every payload
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Positional schema of every row
pub const COLUMNS: [&str; 3] = ["log", "backtrace", "type"];

/// How the browser client renders a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowType {
    #[serde(rename = "")]
    Log,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "groupCollapsed")]
    GroupCollapsed,
    #[serde(rename = "groupEnd")]
    GroupEnd,
}

impl RowType {
    /// Value written in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Group => "group",
            Self::GroupCollapsed => "groupCollapsed",
            Self::GroupEnd => "groupEnd",
        }
    }

    /// Non-empty label for metrics and tracing (`log` for plain rows)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Log => "log",
            other => other.as_str(),
        }
    }
}

/// One logged event
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub args: Vec<Value>,
    pub backtrace: String,
    pub kind: RowType,
}

impl Row {
    pub fn new(kind: RowType, args: Vec<Value>, backtrace: String) -> Self {
        Self {
            args,
            backtrace,
            kind,
        }
    }

    /// Closing row of a group; never carries arguments or a source location
    pub fn group_end() -> Self {
        Self::new(RowType::GroupEnd, Vec::new(), String::new())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(COLUMNS.len())?;
        tuple.serialize_element(&self.args)?;
        tuple.serialize_element(&self.backtrace)?;
        tuple.serialize_element(&self.kind)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (args, backtrace, kind) = <(Vec<Value>, String, RowType)>::deserialize(deserializer)?;
        Ok(Self {
            args,
            backtrace,
            kind,
        })
    }
}

/// The full document sent for one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub version: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

impl Payload {
    /// Empty payload for the current protocol version
    pub fn new() -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Serialize to ASCII-only JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::with_capacity(128);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
        self.serialize(&mut serializer)?;
        Ok(buf)
    }

    /// Serialize to the header value: base64 over [`Payload::to_json`]
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(BASE64_STANDARD.encode(self.to_json()?))
    }

    /// Parse a header value produced by [`Payload::encode`]
    pub fn decode(header: &str) -> Result<Self, DecodeError> {
        let json = BASE64_STANDARD.decode(header.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Compact JSON formatter that escapes every non-ASCII character as `\uXXXX`
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut rest = fragment;
        while let Some(pos) = rest.find(|c: char| !c.is_ascii()) {
            writer.write_all(rest[..pos].as_bytes())?;
            let ch = rest[pos..].chars().next().unwrap_or_default();
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            rest = &rest[pos + ch.len_utf8()..];
        }
        writer.write_all(rest.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_type_wire_names() {
        let names: Vec<String> = [
            RowType::Log,
            RowType::Info,
            RowType::Warn,
            RowType::Error,
            RowType::Group,
            RowType::GroupCollapsed,
            RowType::GroupEnd,
        ]
        .iter()
        .map(|t| serde_json::to_string(t).unwrap())
        .collect();

        assert_eq!(
            names,
            vec![
                "\"\"",
                "\"info\"",
                "\"warn\"",
                "\"error\"",
                "\"group\"",
                "\"groupCollapsed\"",
                "\"groupEnd\""
            ]
        );
        assert_eq!(RowType::Log.label(), "log");
        assert_eq!(RowType::GroupCollapsed.as_str(), "groupCollapsed");
    }

    #[test]
    fn test_row_serializes_as_positional_tuple() {
        let row = Row::new(
            RowType::Warn,
            vec![json!("a"), json!(4)],
            "src/app.rs:3:9".to_string(),
        );
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!([["a", 4], "src/app.rs:3:9", "warn"]));
    }

    #[test]
    fn test_empty_payload_shape() {
        let payload = Payload::new();
        let value: Value = serde_json::from_slice(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "version": PROTOCOL_VERSION,
                "columns": ["log", "backtrace", "type"],
                "rows": []
            })
        );
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let mut payload = Payload::new();
        payload
            .rows
            .push(Row::new(RowType::Log, vec![json!("héllo 🚀")], String::new()));

        let json = payload.to_json().unwrap();
        assert!(json.is_ascii());
        let text = String::from_utf8(json).unwrap();
        assert!(text.contains("h\\u00e9llo \\ud83d\\ude80"));

        let decoded = Payload::decode(&payload.encode().unwrap()).unwrap();
        assert_eq!(decoded.rows[0].args[0], json!("héllo 🚀"));
    }

    #[test]
    fn test_control_characters_still_escaped() {
        let mut payload = Payload::new();
        payload
            .rows
            .push(Row::new(RowType::Log, vec![json!("a\"b\nc")], String::new()));

        let text = String::from_utf8(payload.to_json().unwrap()).unwrap();
        assert!(text.contains(r#""a\"b\nc""#));
    }

    #[test]
    fn test_decode_round_trip_keeps_rows() {
        let mut payload = Payload::new();
        payload.rows.push(Row::new(
            RowType::Group,
            vec![json!({"nested": [1, 2, {"k": null}]})],
            "src/lib.rs:1:1".to_string(),
        ));
        payload.rows.push(Row::group_end());

        let decoded = Payload::decode(&payload.encode().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Payload::decode("not base64!!"),
            Err(DecodeError::Base64(_))
        ));
        let not_json = BASE64_STANDARD.encode("{oops");
        assert!(matches!(Payload::decode(&not_json), Err(DecodeError::Json(_))));
    }
}

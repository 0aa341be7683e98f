//! Raw JSON archive of a batch

use crate::error::Result;
use bytes::Bytes;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Serialize records as a pretty-printed UTF-8 JSON array
///
/// Non-ASCII characters are written as-is, not escaped.
pub fn encode_archive(records: &[Value], indent: usize) -> Result<Bytes> {
    let indent = " ".repeat(indent);
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());

    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;

    Ok(Bytes::from(buf))
}

//! Indented JSON output shared by crawler snapshots and version files.
//!
//! Keys come out sorted because every map written here is a `BTreeMap` (or a
//! `serde_json::Map`, which is ordered without the `preserve_order` feature).

use serde::Serialize;

const INDENT: &[u8] = b"    ";

/// Serialize `value` as JSON indented with four spaces.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}

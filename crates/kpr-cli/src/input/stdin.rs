use serde_json::Value;
use std::io::{self, Read};

use super::file::parse_document;

/// Read a piped JSON or YAML document from stdin.
/// Returns None when stdin is a terminal or the pipe is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }

    let value = parse_document(&buffer, None).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(value))
}

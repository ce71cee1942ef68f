//! ASCII-escaped JSON output for manifests and reports.
//!
//! Every record demoforge writes must survive transports that are not UTF-8
//! clean, so non-ASCII characters are written as `\uXXXX` escapes (UTF-16
//! surrogate pairs above the BMP). Reports are pretty-printed with a two-space
//! indent; JSONL rows are compact. Both end with a newline.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use std::io::{self, Write};
use std::path::Path;

/// Formatter adapter that escapes non-ASCII characters in strings.
struct AsciiFormatter<F> {
    inner: F,
}

impl<F: Formatter> Formatter for AsciiFormatter<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_object_value(writer)
    }
}

fn serialize_with<T, F>(value: &T, formatter: F) -> Result<String>
where
    T: ?Sized + Serialize,
    F: Formatter,
{
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter { inner: formatter });
    value.serialize(&mut ser)?;
    // Only ASCII bytes were written.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serialize to a single-line ASCII JSON string.
pub fn to_ascii_string<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    serialize_with(value, CompactFormatter)
}

/// Serialize to an indented ASCII JSON string.
pub fn to_ascii_string_pretty<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    serialize_with(value, PrettyFormatter::with_indent(b"  "))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write an indented JSON document followed by a newline.
pub fn write_json_pretty<T: ?Sized + Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let mut text = to_ascii_string_pretty(value)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

/// Write one compact JSON document per line, newline terminated.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut text = String::new();
    for row in rows {
        text.push_str(&to_ascii_string(row)?);
        text.push('\n');
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Write plain text lines, newline terminated.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    ensure_parent(path)?;
    let text: String = lines.iter().map(|line| format!("{}\n", line)).collect();
    std::fs::write(path, text)?;
    Ok(())
}

/// Read a JSONL file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(Into::into))
        .collect()
}

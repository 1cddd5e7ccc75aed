//! Rendering and parsing of the `==UserScript==` metadata block.
//!
//! Userscript managers read the block line by line, so the layout is fixed:
//! an opening marker, one `// @key value` line per value and a closing
//! marker. Keys are padded to a shared column for readability.

use std::ops::Range;

use crate::metadata::{MetadataRecord, MetadataValue};

/// Opening line of the metadata block.
pub const HEADER_START: &str = "// ==UserScript==";
/// Closing line of the metadata block.
pub const HEADER_END: &str = "// ==/UserScript==";

/// Renders `record` into the metadata block.
///
/// Absent fields and blank values are skipped, values are trimmed, and list
/// values produce one line per element. Flags are written as a bare key.
/// Keys are padded to the longest emitted key plus two spaces. The result has
/// no trailing newline.
///
/// # Examples
///
/// ```
/// use userscript_bundler::{MetadataRecord, render_header};
///
/// let mut record = MetadataRecord::new();
/// record.insert("name", "Demo",);
/// record.insert("version", "1.0.0",);
///
/// assert_eq!(
///     render_header(&record,),
///     "// ==UserScript==\n// @name     Demo\n// @version  1.0.0\n// ==/UserScript=="
/// );
/// ```
pub fn render_header(record: &MetadataRecord,) -> String
{
    let width = record
        .iter()
        .filter(|(_, value,)| value.emits(),)
        .map(|(key, _,)| key.chars().count(),)
        .max()
        .unwrap_or(0,)
        + 2;

    let mut lines = vec![HEADER_START.to_owned()];
    for (key, value,) in record.iter() {
        if matches!(value, MetadataValue::Flag) {
            lines.push(format!("// @{key}"),);
            continue;
        }
        for item in value.values() {
            lines.push(format!("// @{key:<width$}{item}"),);
        }
    }
    lines.push(HEADER_END.to_owned(),);

    lines.join("\n",)
}

/// Metadata block located inside a larger script.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ParsedHeader
{
    /// Fields in order of first appearance; repeated keys become lists.
    pub record: MetadataRecord,
    /// Byte range of the block, from the opening marker to the end of the
    /// closing marker line (line terminator excluded).
    pub span:   Range<usize,>,
}

/// Parses the first metadata block found in `script`.
///
/// Returns `None` when no complete block exists. Lines inside the block that
/// are not `// @key value` entries are ignored, and a key without a value is
/// kept as [`MetadataValue::Flag`].
///
/// # Examples
///
/// ```
/// use userscript_bundler::{MetadataValue, parse_header};
///
/// let script = "// ==UserScript==\n// @name  Demo\n// @match a\n// @match b\n// ==/UserScript==\n";
/// let parsed = parse_header(script,).expect("header present",);
/// assert_eq!(parsed.record.get("name"), Some(&MetadataValue::from("Demo")));
/// assert_eq!(parsed.record.get("match").map(|value| value.values().count()), Some(2));
/// ```
pub fn parse_header(script: &str,) -> Option<ParsedHeader,>
{
    let mut offset = 0;
    let mut start = None;
    let mut record = MetadataRecord::new();

    for line in script.split_inclusive('\n',) {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\r', '\n',],);

        let Some(begin,) = start else {
            if content.trim() == HEADER_START {
                start = Some(line_start,);
            }
            continue;
        };

        if content.trim() == HEADER_END {
            let end = line_start + content.len();
            return Some(ParsedHeader {
                record,
                span: begin..end,
            },);
        }

        if let Some((key, value,),) = parse_entry(content,) {
            push_value(&mut record, key, value,);
        }
    }

    None
}

fn parse_entry(line: &str,) -> Option<(&str, &str,),>
{
    let entry = line.trim_start().strip_prefix("//",)?.trim_start().strip_prefix('@',)?;
    let (key, value,) = match entry.split_once(char::is_whitespace,) {
        Some((key, value,),) => (key, value.trim(),),
        None => (entry.trim_end(), "",),
    };
    if key.is_empty() { None } else { Some((key, value,),) }
}

fn push_value(record: &mut MetadataRecord, key: &str, value: &str,)
{
    let merged = match (record.get(key,), value.is_empty(),) {
        (None | Some(MetadataValue::Absent | MetadataValue::Flag,), true,) => MetadataValue::Flag,
        (None | Some(MetadataValue::Absent | MetadataValue::Flag,), false,) => MetadataValue::from(value,),
        (Some(MetadataValue::Scalar(_,) | MetadataValue::List(_,),), true,) => return,
        (Some(MetadataValue::Scalar(existing,),), false,) => {
            MetadataValue::List(vec![existing.clone(), value.to_owned()],)
        }
        (Some(MetadataValue::List(existing,),), false,) => {
            let mut values = existing.clone();
            values.push(value.to_owned(),);
            MetadataValue::List(values,)
        }
    };
    record.insert(key, merged,);
}

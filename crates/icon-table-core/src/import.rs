//! Reading generated tables back in (C++ header or JSON).

use crate::error::{IconTableError, Result};
use crate::model::ImageRecord;
use crate::table::ImageTable;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

fn entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\{ "((?:[^"\\]|\\.)*)", \{ new unsigned char\[(\d+)\] \{ ?([0-9,\s]*?) ?\}, (\d+), (\d+), (\d+), (\d+), (true|false), (true|false) \} \},?$"#,
        )
        .expect("static regex")
    })
}

/// Parses a header produced by [`to_cpp_header`](crate::export::to_cpp_header).
///
/// Only map entry lines are interpreted; everything else is skipped. An entry
/// whose declared array length disagrees with its bytes or its `size` field is
/// rejected.
pub fn parse_cpp_header(text: &str) -> Result<ImageTable> {
    let re = entry_regex();
    let mut table = ImageTable::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if !line.starts_with("{ \"") {
            continue;
        }
        let caps = re.captures(line).ok_or_else(|| IconTableError::Parse {
            line: line_no,
            message: "malformed image entry".into(),
        })?;
        let out_of_range = |i: usize| IconTableError::Parse {
            line: line_no,
            message: format!("number out of range: {}", &caps[i]),
        };
        let num = |i: usize| -> Result<usize> { caps[i].parse().map_err(|_| out_of_range(i)) };
        let dim = |i: usize| -> Result<u32> { caps[i].parse().map_err(|_| out_of_range(i)) };
        let declared = num(2)?;
        let data = parse_bytes(&caps[3], line_no)?;
        let size = num(4)?;
        if data.len() != declared || size != declared {
            return Err(IconTableError::Parse {
                line: line_no,
                message: format!(
                    "array declares {} bytes, size is {}, found {}",
                    declared,
                    size,
                    data.len()
                ),
            });
        }
        let record = ImageRecord {
            name: c_unescape(&caps[1]),
            width: dim(5)?,
            height: dim(6)?,
            original_size: num(7)?,
            is_raw_png: &caps[8] == "true",
            alpha_only: &caps[9] == "true",
            size,
            data,
        };
        table.insert_record(record)?;
    }
    Ok(table)
}

fn parse_bytes(list: &str, line: usize) -> Result<Vec<u8>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>().map_err(|_| IconTableError::Parse {
                line,
                message: format!("not a byte: {}", s),
            })
        })
        .collect()
}

fn c_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Deserialize)]
struct JsonTable {
    images: ImageTable,
}

/// Parses the output of [`to_json`](crate::export::to_json).
pub fn parse_json(text: &str) -> Result<ImageTable> {
    let parsed: JsonTable = serde_json::from_str(text).map_err(|e| IconTableError::Parse {
        line: e.line(),
        message: e.to_string(),
    })?;
    // re-insert so key/name disagreement and duplicates surface the same way as for headers
    let mut table = ImageTable::new();
    for rec in parsed.images.records() {
        table.insert_record(rec.clone())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{to_cpp_header, to_json};
    use crate::model::{EncodedImage, Encoding};

    fn sample() -> ImageTable {
        let mut t = ImageTable::new();
        t.insert(
            "a \"quoted\".png",
            EncodedImage {
                width: 2,
                height: 2,
                encoding: Encoding::AlphaRle(vec![4, 255]),
                original_size: 4,
            },
        )
        .unwrap();
        t.insert(
            "b.png",
            EncodedImage {
                width: 1,
                height: 1,
                encoding: Encoding::FullRle(vec![1, 1, 1, 2, 2, 3]),
                original_size: 4,
            },
        )
        .unwrap();
        t
    }

    #[test]
    fn header_reads_back() {
        let t = sample();
        assert_eq!(parse_cpp_header(&to_cpp_header(&t)).unwrap(), t);
    }

    #[test]
    fn json_reads_back() {
        let t = sample();
        let text = serde_json::to_string(&to_json(&t)).unwrap();
        assert_eq!(parse_json(&text).unwrap(), t);
    }

    #[test]
    fn false_flags_stay_false() {
        let line = r#"{ "x", { new unsigned char[2] { 4,0 }, 2, 1, 1, 4, false, false } },"#;
        let t = parse_cpp_header(line).unwrap();
        let r = t.lookup("x").unwrap();
        assert!(!r.is_raw_png);
        assert!(!r.alpha_only);
    }

    #[test]
    fn length_mismatch_is_reported_with_line() {
        let text = "#pragma once\n{ \"x\", { new unsigned char[3] { 4,0 }, 3, 1, 1, 4, false, false } },";
        assert!(matches!(
            parse_cpp_header(text),
            Err(IconTableError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let text = "{ \"x\", { new unsigned char[2] { 4,0 }, 2, 4294967297, 1, 4, false, false } },";
        match parse_cpp_header(text) {
            Err(IconTableError::Parse { line: 1, message }) => {
                assert!(message.contains("4294967297"))
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }
}

use crate::table::ImageTable;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Write as _;

/// Identifier names used in the generated C++ header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Name of the record struct.
    pub struct_name: String,
    /// Name of the `std::map` holding every record.
    pub map_name: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            struct_name: "ImageData".into(),
            map_name: "imageMap".into(),
        }
    }
}

/// Renders the table as a C++ header with default identifiers.
pub fn to_cpp_header(table: &ImageTable) -> String {
    to_cpp_header_with(table, &HeaderOptions::default())
}

/// Renders the table as a C++ header: one `ImageData` struct definition and a
/// `std::map<std::string, ImageData>` with one entry per record, in name order.
/// Each entry line is `{ "name", { new unsigned char[N] { bytes }, size, width,
/// height, originalSize, isRawPng, alphaOnly } },`.
pub fn to_cpp_header_with(table: &ImageTable, opts: &HeaderOptions) -> String {
    let mut s = String::new();
    s.push_str("#pragma once\n\n");
    s.push_str("#include <map>\n");
    s.push_str("#include <string>\n\n");
    let _ = writeln!(s, "struct {} {{", opts.struct_name);
    s.push_str("    unsigned char* data;\n");
    s.push_str("    unsigned int size;\n");
    s.push_str("    unsigned int width;\n");
    s.push_str("    unsigned int height;\n");
    s.push_str("    unsigned int originalSize;\n");
    s.push_str("    bool isRawPng;\n");
    s.push_str("    bool alphaOnly;\n");
    s.push_str("};\n\n");
    let _ = writeln!(
        s,
        "std::map<std::string, {}> {} = {{",
        opts.struct_name, opts.map_name
    );
    for rec in table {
        let bytes = rec
            .data
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            s,
            "{{ \"{}\", {{ new unsigned char[{}] {{ {} }}, {}, {}, {}, {}, {}, {} }} }},",
            c_escape(&rec.name),
            rec.data.len(),
            bytes,
            rec.size,
            rec.width,
            rec.height,
            rec.original_size,
            rec.is_raw_png,
            rec.alpha_only,
        );
    }
    s.push_str("};\n");
    s
}

/// Serialize the table as `{ images: { name: record }, meta }`.
pub fn to_json(table: &ImageTable) -> Value {
    let stats = table.stats();
    json!({
        "images": table,
        "meta": {
            "app": "icon-table",
            "version": env!("CARGO_PKG_VERSION"),
            "format": "rle-u8-pairs",
            "images": stats.num_images,
            "storedBytes": stats.stored_bytes,
            "decodedBytes": stats.decoded_bytes,
        }
    })
}

pub(crate) fn c_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

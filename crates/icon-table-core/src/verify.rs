//! Re-decoding a finished table for inspection.

use crate::decode::{decode_record, decode_to_image};
use crate::error::Result;
use crate::model::{ImageRecord, PixelBuffer};
use crate::table::ImageTable;
use image::RgbaImage;
use std::fmt;
use tracing::instrument;

/// Maximum number of individual differences kept in a [`DiffReport`].
pub const MAX_REPORTED_DIFFS: usize = 32;

/// A record decoded back to pixels.
pub struct VerifiedImage {
    pub name: String,
    pub image: RgbaImage,
}

#[instrument(skip_all, fields(images = table.len()))]
/// Decodes every record. Any decode failure fails the whole pass.
pub fn verify_table(table: &ImageTable) -> Result<Vec<VerifiedImage>> {
    table
        .records()
        .map(|rec| {
            Ok(VerifiedImage {
                name: rec.name.clone(),
                image: decode_to_image(rec)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteDiff {
    pub index: usize,
    pub expected: u8,
    pub actual: u8,
}

/// Byte-level comparison of two buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub expected_len: usize,
    pub actual_len: usize,
    /// Differing positions within the common prefix.
    pub num_differences: usize,
    /// First [`MAX_REPORTED_DIFFS`] differences.
    pub differences: Vec<ByteDiff>,
}

impl DiffReport {
    pub fn is_identical(&self) -> bool {
        self.expected_len == self.actual_len && self.num_differences == 0
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identical() {
            return f.write_str("no differences");
        }
        if self.expected_len != self.actual_len {
            writeln!(
                f,
                "length differs: expected {} bytes, got {}",
                self.expected_len, self.actual_len
            )?;
        }
        write!(f, "{} differences", self.num_differences)?;
        for d in &self.differences {
            write!(
                f,
                "\n  at {}: {:#04x} != {:#04x}",
                d.index, d.expected, d.actual
            )?;
        }
        if self.num_differences > self.differences.len() {
            write!(f, "\n  ...")?;
        }
        Ok(())
    }
}

/// Compares `actual` against `expected` byte by byte.
pub fn diff_bytes(expected: &[u8], actual: &[u8]) -> DiffReport {
    let mut report = DiffReport {
        expected_len: expected.len(),
        actual_len: actual.len(),
        ..Default::default()
    };
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        if e != a {
            report.num_differences += 1;
            if report.differences.len() < MAX_REPORTED_DIFFS {
                report.differences.push(ByteDiff {
                    index,
                    expected: e,
                    actual: a,
                });
            }
        }
    }
    report
}

/// Decodes `record` and compares it with the pixels it was built from.
///
/// Alpha-only records report their discarded colour as differences.
pub fn diff_record(record: &ImageRecord, source: &PixelBuffer) -> Result<DiffReport> {
    let decoded = decode_record(record)?;
    Ok(diff_bytes(&source.data, &decoded.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_buffers() {
        let r = diff_bytes(&[1, 2, 3], &[1, 2, 3]);
        assert!(r.is_identical());
        assert_eq!(r.to_string(), "no differences");
    }

    #[test]
    fn reports_positions_and_length() {
        let r = diff_bytes(&[1, 2, 3, 4], &[1, 9, 3]);
        assert!(!r.is_identical());
        assert_eq!(r.num_differences, 1);
        assert_eq!(
            r.differences,
            vec![ByteDiff {
                index: 1,
                expected: 2,
                actual: 9
            }]
        );
        assert!(r.to_string().contains("length differs"));
    }

    #[test]
    fn caps_reported_list() {
        let a = vec![0u8; 100];
        let b = vec![1u8; 100];
        let r = diff_bytes(&a, &b);
        assert_eq!(r.num_differences, 100);
        assert_eq!(r.differences.len(), MAX_REPORTED_DIFFS);
    }
}

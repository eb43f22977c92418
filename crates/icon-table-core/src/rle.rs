//! Byte-oriented run-length codec.
//!
//! A stream is a sequence of `(count, value)` pairs with `count` in `1..=255`.
//! Serialized, pair `i` occupies bytes `2i` (count) and `2i + 1` (value).
//! The serialized form carries no length header: the decoder is told how many
//! bytes to produce and treats any disagreement as an error.

use crate::error::{IconTableError, Result};

/// Longest run a single pair can describe.
pub const MAX_RUN: u8 = u8::MAX;

/// One `(count, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub count: u8,
    pub value: u8,
}

/// Ordered run-length pairs describing a byte stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLengthStream {
    runs: Vec<Run>,
}

impl RunLengthStream {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of bytes this stream expands to.
    pub fn decoded_len(&self) -> usize {
        self.runs.iter().map(|r| r.count as usize).sum()
    }

    /// Length of [`serialize`](Self::serialize) output without building it.
    pub fn serialized_len(&self) -> usize {
        self.runs.len() * 2
    }

    /// Flattens the pairs into `count, value, count, value, ...`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        for r in &self.runs {
            out.push(r.count);
            out.push(r.value);
        }
        out
    }

    /// Parses serialized pairs. Rejects a dangling byte or a zero count.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() % 2 != 0 {
            return Err(IconTableError::Encode(format!(
                "run-length data has odd length {}",
                data.len()
            )));
        }
        let mut runs = Vec::with_capacity(data.len() / 2);
        for pair in data.chunks_exact(2) {
            if pair[0] == 0 {
                return Err(IconTableError::Encode(format!(
                    "zero-length run at byte {}",
                    runs.len() * 2
                )));
            }
            runs.push(Run {
                count: pair[0],
                value: pair[1],
            });
        }
        Ok(Self { runs })
    }

    /// Expands the runs back into bytes.
    pub fn expand(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.decoded_len());
        for r in &self.runs {
            out.extend(std::iter::repeat_n(r.value, r.count as usize));
        }
        out
    }
}

/// Run-length encodes `bytes`.
///
/// A run is closed when it reaches [`MAX_RUN`], when the next byte differs, or
/// at end of input, so physical runs longer than 255 become several pairs with
/// the same value. Empty input yields an empty stream.
pub fn encode(bytes: &[u8]) -> RunLengthStream {
    let mut runs = Vec::new();
    let mut iter = bytes.iter().copied();
    let Some(mut value) = iter.next() else {
        return RunLengthStream { runs };
    };
    let mut count: u8 = 1;
    for b in iter {
        if b == value && count < MAX_RUN {
            count += 1;
        } else {
            runs.push(Run { count, value });
            value = b;
            count = 1;
        }
    }
    runs.push(Run { count, value });
    RunLengthStream { runs }
}

/// Convenience for `encode(bytes).serialize()`.
pub fn encode_to_bytes(bytes: &[u8]) -> Vec<u8> {
    encode(bytes).serialize()
}

/// Decodes serialized pairs into exactly `original_size` bytes.
///
/// Fails with [`IconTableError::RunLengthMismatch`] when the pairs do not sum
/// to `original_size` or the data ends in half a pair, and with
/// [`IconTableError::Encode`] on a zero-count pair. No partial output is
/// returned.
pub fn decode(data: &[u8], original_size: usize) -> Result<Vec<u8>> {
    let mismatch = |actual| IconTableError::RunLengthMismatch {
        expected: original_size,
        actual,
    };
    if data.len() % 2 != 0 {
        return Err(mismatch(decoded_len(&data[..data.len() - 1]) + 1));
    }
    let mut out = Vec::with_capacity(original_size);
    for (i, pair) in data.chunks_exact(2).enumerate() {
        let (count, value) = (pair[0] as usize, pair[1]);
        if count == 0 {
            return Err(IconTableError::Encode(format!(
                "zero-length run at byte {}",
                i * 2
            )));
        }
        if out.len() + count > original_size {
            return Err(mismatch(out.len() + decoded_len(&data[i * 2..])));
        }
        out.resize(out.len() + count, value);
    }
    if out.len() != original_size {
        return Err(mismatch(out.len()));
    }
    Ok(out)
}

fn decoded_len(data: &[u8]) -> usize {
    data.chunks_exact(2).map(|p| p[0] as usize).sum()
}

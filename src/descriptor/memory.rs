//! Memory ceiling parsing ("512M", "1G", ...).

use std::fmt;

const KIB: u64 = 1024;

/// A byte ceiling together with the text it was declared as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryThreshold {
    bytes: u64,
    declared: String,
}

impl MemoryThreshold {
    /// Parse a size with an optional K/M/G/T suffix (binary units, optional
    /// trailing "B", case-insensitive). Zero and overflow are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let upper = trimmed.to_ascii_uppercase();
        let unitless = upper.strip_suffix('B').unwrap_or(&upper);

        let (digits, multiplier) = match unitless.chars().last()? {
            'K' => (&unitless[..unitless.len() - 1], KIB),
            'M' => (&unitless[..unitless.len() - 1], KIB.pow(2)),
            'G' => (&unitless[..unitless.len() - 1], KIB.pow(3)),
            'T' => (&unitless[..unitless.len() - 1], KIB.pow(4)),
            _ => (unitless, 1),
        };

        let digits = digits.trim_end();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let bytes = digits.parse::<u64>().ok()?.checked_mul(multiplier)?;
        if bytes == 0 {
            return None;
        }

        Some(Self {
            bytes,
            declared: text.to_string(),
        })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The text this threshold was parsed from
    pub fn declared(&self) -> &str {
        &self.declared
    }
}

impl fmt::Display for MemoryThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.declared)
    }
}

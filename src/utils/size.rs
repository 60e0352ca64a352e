//! Allocation rounding and unit size helpers.
//!
//! Filesystems hand out space in blocks, not bytes, so the space a file
//! actually occupies is its length rounded up to the next block. This module
//! converts raw byte counts into that allocated space expressed in display
//! units, and parses/formats display unit sizes.

use std::num::NonZeroU64;

use humansize::{BINARY, format_size};

use crate::error::{DuError, Result};

/// Converts byte counts into allocation-rounded display units.
///
/// Both parameters are non-zero by construction, so [`SizeConverter::units`]
/// cannot fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeConverter {
    block_size: NonZeroU64,
    unit_size: NonZeroU64,
}

impl SizeConverter {
    /// Create a converter for a filesystem block size and a display unit size.
    #[must_use]
    pub const fn new(block_size: NonZeroU64, unit_size: NonZeroU64) -> Self {
        Self {
            block_size,
            unit_size,
        }
    }

    /// Create a converter from plain integers.
    ///
    /// # Errors
    ///
    /// Returns [`DuError::InvalidSize`] if either size is zero.
    pub fn try_new(block_size: u64, unit_size: u64) -> Result<Self> {
        let block_size = NonZeroU64::new(block_size)
            .ok_or_else(|| DuError::InvalidSize("block size must be positive".to_string()))?;
        let unit_size = NonZeroU64::new(unit_size)
            .ok_or_else(|| DuError::InvalidSize("unit size must be positive".to_string()))?;
        Ok(Self::new(block_size, unit_size))
    }

    /// Filesystem block size in bytes.
    #[must_use]
    pub const fn block_size(&self) -> u64 {
        self.block_size.get()
    }

    /// Display unit size in bytes.
    #[must_use]
    pub const fn unit_size(&self) -> u64 {
        self.unit_size.get()
    }

    /// Number of display units needed for the space allocated to `bytes`.
    ///
    /// An empty file still occupies one block, so the result is never zero.
    #[must_use]
    pub fn units(&self, bytes: u64) -> u64 {
        let block = u128::from(self.block_size.get());
        let unit = u128::from(self.unit_size.get());

        let blocks = u128::from(bytes).div_ceil(block).max(1);
        let units = (blocks * block).div_ceil(unit);

        u64::try_from(units).unwrap_or(u64::MAX)
    }
}

/// Number of `unit_size` units needed for the space allocated to `bytes` on a
/// filesystem with `block_size` blocks.
///
/// # Errors
///
/// Returns [`DuError::InvalidSize`] if `block_size` or `unit_size` is zero.
///
/// # Examples
///
/// ```
/// # use posix_du::utils::convert;
/// assert_eq!(convert(3456, 4096, 512).unwrap(), 8);
/// assert_eq!(convert(0, 4096, 1024).unwrap(), 4);
/// ```
pub fn convert(bytes: u64, block_size: u64, unit_size: u64) -> Result<u64> {
    SizeConverter::try_new(block_size, unit_size).map(|c| c.units(bytes))
}

/// Parse a display unit size such as `512`, `1K`, `1KiB` or `4m`.
///
/// Suffixes are binary multiples and case-insensitive; the optional `iB` or
/// `B` after the multiplier letter is ignored.
///
/// # Errors
///
/// Returns [`DuError::InvalidSize`] if the text is not a positive integer with
/// an optional known suffix, or if the value overflows `u64`.
pub fn parse_unit_size(text: &str) -> Result<NonZeroU64> {
    let invalid = || DuError::InvalidSize(format!("'{text}' is not a valid unit size"));

    let upper = text.trim().to_ascii_uppercase();
    let trimmed = upper
        .strip_suffix("IB")
        .or_else(|| upper.strip_suffix('B'))
        .unwrap_or(&upper);

    let (digits, shift) = match trimmed.chars().last() {
        Some('K') => (&trimmed[..trimmed.len() - 1], 10),
        Some('M') => (&trimmed[..trimmed.len() - 1], 20),
        Some('G') => (&trimmed[..trimmed.len() - 1], 30),
        _ => (trimmed, 0),
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let bytes = value.checked_mul(1 << shift).ok_or_else(invalid)?;

    NonZeroU64::new(bytes).ok_or_else(invalid)
}

/// Render `units` display units as a human readable byte size (`"4 KiB"`).
#[must_use]
pub fn format_units(units: u64, unit_size: u64) -> String {
    format_size(units.saturating_mul(unit_size), BINARY)
}

//! Serial numbers and inclusive serial ranges.
//!
//! A serial is always rendered as exactly four ASCII digits (`0001`..`9999`).
//! Values outside `1..=9999` are rejected before any cipher work.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Smallest valid serial value.
pub const SERIAL_MIN: u16 = 1;

/// Largest valid serial value.
pub const SERIAL_MAX: u16 = 9999;

/// Errors from serial and range validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// The serial text is not four digits, or its value is 0.
    #[error("invalid serial {0:?}: must be 4 digits between 0001 and 9999")]
    InvalidSerial(String),

    /// The batch range is malformed or reversed.
    #[error("invalid range {start:?}..={end:?}: {reason}")]
    InvalidRange {
        start: String,
        end: String,
        reason: &'static str,
    },
}

/// A validated serial in `1..=9999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Serial(u16);

impl Serial {
    /// Build a serial from its numeric value.
    pub fn new(value: u32) -> Result<Self, SerialError> {
        match u16::try_from(value) {
            Ok(v) if (SERIAL_MIN..=SERIAL_MAX).contains(&v) => Ok(Self(v)),
            _ => Err(SerialError::InvalidSerial(value.to_string())),
        }
    }

    /// Parse a serial from exactly four ASCII digits.
    pub fn parse(text: &str) -> Result<Self, SerialError> {
        let invalid = || SerialError::InvalidSerial(text.to_owned());
        if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u16 = text.parse().map_err(|_| invalid())?;
        if value < SERIAL_MIN {
            return Err(invalid());
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for Serial {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An inclusive range of serials with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialRange {
    start: Serial,
    end: Serial,
}

impl SerialRange {
    /// Build a range from two serials.
    pub fn new(start: Serial, end: Serial) -> Result<Self, SerialError> {
        if start > end {
            return Err(SerialError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
                reason: "start must not exceed end",
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two 4-digit texts.
    ///
    /// A malformed endpoint is reported as [`SerialError::InvalidRange`].
    pub fn parse(start: &str, end: &str) -> Result<Self, SerialError> {
        let malformed = |reason| SerialError::InvalidRange {
            start: start.to_owned(),
            end: end.to_owned(),
            reason,
        };
        let s = Serial::parse(start).map_err(|_| malformed("start must be 4 digits in 0001..9999"))?;
        let e = Serial::parse(end).map_err(|_| malformed("end must be 4 digits in 0001..9999"))?;
        Self::new(s, e)
    }

    pub fn start(&self) -> Serial {
        self.start
    }

    pub fn end(&self) -> Serial {
        self.end
    }

    /// Number of serials in the range; always at least 1.
    pub fn len(&self) -> usize {
        usize::from(self.end.value() - self.start.value()) + 1
    }

    /// Serial at `offset` from the start, or `None` past the end.
    pub fn serial_at(&self, offset: usize) -> Option<Serial> {
        if offset >= self.len() {
            return None;
        }
        let offset = u32::try_from(offset).ok()?;
        Serial::new(u32::from(self.start.value()) + offset).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_digits() {
        assert_eq!(Serial::parse("0001").unwrap().value(), 1);
        assert_eq!(Serial::parse("0042").unwrap().value(), 42);
        assert_eq!(Serial::parse("9999").unwrap().value(), 9999);
    }

    #[test]
    fn renders_zero_padded() {
        assert_eq!(Serial::new(7).unwrap().to_string(), "0007");
        assert_eq!(Serial::new(1234).unwrap().to_string(), "1234");
    }

    #[test]
    fn rejects_zero_and_out_of_range_values() {
        assert!(Serial::parse("0000").is_err());
        assert!(Serial::new(0).is_err());
        assert!(Serial::new(10_000).is_err());
        assert!(Serial::new(u32::MAX).is_err());
    }

    #[test]
    fn rejects_wrong_shape() {
        for bad in ["", "1", "042", "00042", "12a4", " 123", "+123", "-001", "１２３４"] {
            assert!(
                matches!(Serial::parse(bad), Err(SerialError::InvalidSerial(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn from_str_matches_parse() {
        let s: Serial = "0100".parse().unwrap();
        assert_eq!(s, Serial::parse("0100").unwrap());
    }

    #[test]
    fn range_len_and_offsets() {
        let r = SerialRange::parse("0001", "0010").unwrap();
        assert_eq!(r.len(), 10);
        assert_eq!(r.serial_at(0).unwrap().to_string(), "0001");
        assert_eq!(r.serial_at(9).unwrap().to_string(), "0010");
        assert!(r.serial_at(10).is_none());
    }

    #[test]
    fn single_serial_range() {
        let r = SerialRange::parse("0500", "0500").unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.serial_at(0).unwrap().to_string(), "0500");
        assert!(r.serial_at(1).is_none());
    }

    #[test]
    fn full_range() {
        let r = SerialRange::parse("0001", "9999").unwrap();
        assert_eq!(r.len(), 9999);
        assert_eq!(r.serial_at(9998).unwrap().value(), 9999);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = SerialRange::parse("0010", "0001").unwrap_err();
        assert!(matches!(err, SerialError::InvalidRange { .. }));
    }

    #[test]
    fn malformed_endpoints_are_range_errors() {
        for (s, e) in [("0000", "0010"), ("0001", "10000"), ("abc", "0002"), ("0001", "")] {
            assert!(
                matches!(SerialRange::parse(s, e), Err(SerialError::InvalidRange { .. })),
                "{s:?}..{e:?} should be rejected"
            );
        }
    }
}

//! The seed a build derives from its own timestamp.
//!
//! Without `__POLY_RANDOM_SEED__`, the header folds `__DATE__` and
//! `__TIME__` into a seed digit by digit. The weights are not positional:
//! year and time digits are read in reverse, so the result is only
//! meaningful as a value to reproduce, not as a readable timestamp.

use chrono::NaiveDateTime;

use crate::{Error, Seed};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Seed for the given `__DATE__` (`Mmm dd yyyy`) and `__TIME__` (`hh:mm:ss`).
///
/// # Errors
///
/// [`Error::InvalidDate`] or [`Error::InvalidTime`] when a string does not
/// have the exact macro layout.
pub fn default_seed(date: &str, time: &str) -> Result<Seed, Error> {
    let (day, month, year) = parse_date(date)?;
    let time = parse_time(time)?;

    let value = time + 100_000 * day + 10_000_000 * month + 1_000_000_000 * year;
    Ok(Seed::new(value))
}

/// Seed for a build performed at `at`.
///
/// # Errors
///
/// Fails when the year does not have four digits.
pub fn default_seed_at(at: NaiveDateTime) -> Result<Seed, Error> {
    let date = at.format("%b %e %Y").to_string();
    let time = at.format("%H:%M:%S").to_string();
    default_seed(&date, &time)
}

// ============================================================================
// Private helpers
// ============================================================================

fn digit(bytes: &[u8], index: usize) -> Option<u64> {
    bytes
        .get(index)
        .filter(|b| b.is_ascii_digit())
        .map(|b| u64::from(b - b'0'))
}

fn parse_date(date: &str) -> Result<(u64, u64, u64), Error> {
    let invalid = || Error::InvalidDate(date.to_string());
    let bytes = date.as_bytes();

    if bytes.len() != 11 || bytes[3] != b' ' || bytes[6] != b' ' {
        return Err(invalid());
    }

    let month = MONTHS
        .iter()
        .position(|m| m.as_bytes() == &bytes[..3])
        .ok_or_else(invalid)? as u64
        + 1;

    // Single-digit days are space padded.
    let tens = match bytes[4] {
        b' ' => 0,
        _ => digit(bytes, 4).ok_or_else(invalid)?,
    };
    let day = digit(bytes, 5).ok_or_else(invalid)? + 10 * tens;

    if !(7..=10).all(|i| digit(bytes, i).is_some()) {
        return Err(invalid());
    }
    let year = digit(bytes, 9).ok_or_else(invalid)? + 10 * digit(bytes, 10).ok_or_else(invalid)?;

    Ok((day, month, year))
}

fn parse_time(time: &str) -> Result<u64, Error> {
    let invalid = || Error::InvalidTime(time.to_string());
    let bytes = time.as_bytes();

    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
        return Err(invalid());
    }

    [0, 1, 3, 4, 6, 7]
        .iter()
        .zip([1, 10, 100, 1_000, 10_000, 100_000])
        .try_fold(0, |acc, (&index, weight)| {
            digit(bytes, index).map(|d| acc + d * weight)
        })
        .ok_or_else(invalid)
}

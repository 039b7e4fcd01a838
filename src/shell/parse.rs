//! Argument parsing for shell commands.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use std::str::FromStr;

/// Splits a command line into words. Double quotes group words containing
/// spaces; `""` yields an empty argument.
///
/// # Errors
/// Returns a validation error for an unterminated quote.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        return Err(Error::validation("unterminated quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// The argument at `index`, or a validation error naming what is missing.
pub fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| Error::validation(format!("missing <{name}>")))
}

/// The argument at `index` if present.
#[must_use]
pub fn optional(args: &[String], index: usize) -> Option<&str> {
    args.get(index).map(String::as_str)
}

/// All arguments from `index` on, joined by single spaces.
#[must_use]
pub fn rest(args: &[String], index: usize) -> String {
    args.get(index..).unwrap_or_default().join(" ")
}

/// Parses a value, naming the argument in the error.
pub fn value<T: FromStr>(input: &str, name: &str) -> Result<T> {
    input
        .trim()
        .parse()
        .map_err(|_| Error::validation(format!("invalid {name}: '{input}'")))
}

/// Parses the required argument at `index`.
pub fn required_value<T: FromStr>(args: &[String], index: usize, name: &str) -> Result<T> {
    value(required(args, index, name)?, name)
}

/// Parses a `YYYY-MM-DD` date.
pub fn date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("invalid date '{input}', expected YYYY-MM-DD")))
}

/// Parses a `YYYY-MM` month into `(year, month)`.
pub fn year_month(input: &str) -> Result<(i32, u32)> {
    let invalid = || Error::validation(format!("invalid month '{input}', expected YYYY-MM"));
    let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

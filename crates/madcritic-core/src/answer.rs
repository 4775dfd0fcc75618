//! Canonical numeric answers and their extraction from free-form text.
//!
//! Extraction ladder for [`extract_answer`]:
//! 1. the last `\boxed{..}` / `\fbox{..}` whose contents hold a number
//! 2. the last `#### N` marker
//! 3. the last bare number anywhere in the text
//!
//! Anything else is "no answer" (`None`). Zero is a real answer and is never
//! used as a stand-in for absence.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref NUMBER: Regex =
        Regex::new(r"(-)?\$?((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+)").expect("valid regex");
    static ref FRACTION: Regex =
        Regex::new(r"^(-)?\s*\\d?frac\{\s*(\d+)\s*\}\{\s*(\d+)\s*\}$|^(-)?\s*(\d+)\s*/\s*(\d+)$")
            .expect("valid regex");
    static ref HASH_MARKER: Regex = Regex::new(r"####\s*([^\n]+)").expect("valid regex");
}

const BOX_MARKERS: [&str; 2] = ["\\boxed{", "\\fbox{"];
const MAX_FRACTION_DIGITS: usize = 24;

/// A numeric answer in canonical decimal form.
///
/// Canonical means: optional `-`, integer digits without leading zeros,
/// and fraction digits without trailing zeros (`5.0` → `5`, `-0` → `0`).
/// Two answers are the same vote iff their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Answer(String);

impl Answer {
    /// Parse a standalone numeric literal such as `"1,234"`, `"$18.50"` or
    /// `"-3.5."`. Returns `None` unless the whole input is one number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '%')
        });
        let trimmed = trimmed.trim_start_matches(['$', '€', '£', '¥']);
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start_matches(['$', '€', '£', '¥'])),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return None;
        }
        if let Some(answer) = Self::parse_fraction(trimmed) {
            return Some(answer);
        }

        let m = NUMBER.find(body)?;
        if m.start() != 0 || m.end() != body.len() {
            return None;
        }
        Self::from_parts(negative, body)
    }

    fn from_parts(negative: bool, digits: &str) -> Option<Self> {
        let digits: String = digits.chars().filter(|c| *c != ',').collect();
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits.as_str(), ""),
        };
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
            || (int_part.is_empty() && frac_part.is_empty())
        {
            return None;
        }

        let int_part = int_part.trim_start_matches('0');
        let frac_part = frac_part.trim_end_matches('0');
        let int_part = if int_part.is_empty() { "0" } else { int_part };

        let mut canonical = String::with_capacity(int_part.len() + frac_part.len() + 2);
        let is_zero = int_part == "0" && frac_part.is_empty();
        if negative && !is_zero {
            canonical.push('-');
        }
        canonical.push_str(int_part);
        if !frac_part.is_empty() {
            canonical.push('.');
            canonical.push_str(frac_part);
        }
        Some(Answer(canonical))
    }

    /// Parse `a/b` or `\frac{a}{b}`; only fractions with a terminating
    /// decimal expansion produce an answer.
    fn parse_fraction(raw: &str) -> Option<Self> {
        let caps = FRACTION.captures(raw.trim())?;
        let (sign, num, den) = if caps.get(2).is_some() {
            (caps.get(1), caps.get(2)?, caps.get(3)?)
        } else {
            (caps.get(4), caps.get(5)?, caps.get(6)?)
        };
        let num: u128 = num.as_str().parse().ok()?;
        let den: u128 = den.as_str().parse().ok()?;
        Self::from_fraction(sign.is_some(), num, den)
    }

    fn from_fraction(negative: bool, num: u128, den: u128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let int_part = num / den;
        let mut rem = num % den;
        let mut frac = String::new();
        while rem != 0 {
            if frac.len() == MAX_FRACTION_DIGITS {
                return None;
            }
            rem = rem.checked_mul(10)?;
            frac.push(char::from(b'0' + (rem / den) as u8));
            rem %= den;
        }
        let digits = if frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac)
        };
        Self::from_parts(negative, &digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Approximate floating value, for reporting only
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Answer {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Answer::parse(&value).ok_or_else(|| format!("not a numeric answer: {:?}", value))
    }
}

impl From<Answer> for String {
    fn from(answer: Answer) -> Self {
        answer.0
    }
}

impl std::str::FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Answer::try_from(s.to_string())
    }
}

/// Return the contents of every boxed marker, in order of appearance.
/// Braces inside the box are balanced; an unterminated box runs to the end.
fn boxed_contents(text: &str) -> Vec<&str> {
    let mut found: Vec<(usize, &str)> = Vec::new();
    for marker in BOX_MARKERS {
        let mut search_from = 0;
        while let Some(offset) = text[search_from..].find(marker) {
            let start = search_from + offset + marker.len();
            let mut depth = 1usize;
            let mut end = text.len();
            for (i, c) in text[start..].char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = start + i;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            found.push((start, &text[start..end]));
            search_from = end.min(text.len());
            if search_from == text.len() {
                break;
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, s)| s).collect()
}

/// The last number in `text`, honoring a leading minus only when it is not
/// a binary operator (`5-3` yields `3`, `x = -3` yields `-3`).
fn last_number(text: &str) -> Option<Answer> {
    let caps = NUMBER.captures_iter(text).last()?;
    let whole = caps.get(0)?;
    let digits = caps.get(2)?.as_str();
    let negative = caps.get(1).is_some() && {
        let before = text[..whole.start()].chars().next_back();
        !matches!(before, Some(c) if c.is_alphanumeric() || c == ')' || c == '_')
    };
    Answer::from_parts(negative, digits)
}

fn boxed_answer(content: &str) -> Option<Answer> {
    let stripped = content.trim().replace("\\$", "").replace("\\!", "");
    Answer::parse_fraction(&stripped).or_else(|| last_number(&stripped))
}

/// Pull the final numeric answer out of a model completion.
///
/// Never fails: unparseable text yields `None`.
pub fn extract_answer(raw_text: &str) -> Option<Answer> {
    if let Some(answer) = boxed_contents(raw_text)
        .into_iter()
        .rev()
        .find_map(boxed_answer)
    {
        return Some(answer);
    }

    if let Some(answer) = HASH_MARKER
        .captures_iter(raw_text)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| last_number(m.as_str()))
    {
        return Some(answer);
    }

    last_number(raw_text)
}

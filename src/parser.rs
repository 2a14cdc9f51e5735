// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Sensor line parsing
//
// The scale emits free-form status chatter; only lines starting with
// "Gross" carry a reading. A line consisting of "0" is the operator's
// request to stop.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ParseError;

/// Marker that makes a line eligible for weight extraction
pub const GROSS_MARKER: &str = "Gross";

/// Line that asks the ingestion loop to return to the menu
pub const EXIT_SENTINEL: &str = "0";

/// How a single transport line is handled by the ingestion loop
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// "Gross" line with a usable weight
    Weight(f64),
    /// "Gross" line that failed to parse
    Rejected(ParseError),
    /// Exit sentinel
    Sentinel,
    /// Anything else: echoes, status chatter, blank lines
    Chatter,
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+(\.[0-9]+)?").expect("weight pattern is valid"))
}

/// Extract the first integer or decimal number in `line`.
pub fn extract_weight(line: &str) -> Result<f64, ParseError> {
    let found = number_pattern()
        .find(line)
        .ok_or_else(|| ParseError::NoNumber(line.to_string()))?;

    let value: f64 = found
        .as_str()
        .parse()
        .map_err(|_| ParseError::InvalidWeight(found.as_str().to_string()))?;

    if !value.is_finite() {
        return Err(ParseError::InvalidWeight(found.as_str().to_string()));
    }
    Ok(value)
}

/// Classify a raw transport line. Surrounding whitespace is ignored.
pub fn classify_line(raw: &str) -> LineKind {
    let line = raw.trim();
    if line == EXIT_SENTINEL {
        return LineKind::Sentinel;
    }
    if !line.starts_with(GROSS_MARKER) {
        return LineKind::Chatter;
    }
    match extract_weight(line) {
        Ok(weight) => LineKind::Weight(weight),
        Err(e) => LineKind::Rejected(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_weight() {
        assert_eq!(extract_weight("Gross 12.34").unwrap(), 12.34);
        assert_eq!(extract_weight("Gross     12 kg").unwrap(), 12.0);
        assert_eq!(extract_weight("G: 0.5kg N: 0.4kg").unwrap(), 0.5);
        assert_eq!(
            extract_weight("Status OK"),
            Err(ParseError::NoNumber("Status OK".to_string()))
        );
    }

    #[test]
    fn test_extract_weight_ignores_sign() {
        // The pattern has no sign, so the magnitude is what gets recorded
        assert_eq!(extract_weight("Gross -3.5").unwrap(), 3.5);
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("Gross 25.10 kg\r"), LineKind::Weight(25.1));
        assert_eq!(classify_line(" 0 "), LineKind::Sentinel);
        assert_eq!(classify_line("Net 24.00"), LineKind::Chatter);
        assert_eq!(classify_line(""), LineKind::Chatter);
        assert!(matches!(
            classify_line("Gross ----"),
            LineKind::Rejected(ParseError::NoNumber(_))
        ));
    }

    #[test]
    fn test_zero_weight_is_not_sentinel() {
        assert_eq!(classify_line("Gross 0"), LineKind::Weight(0.0));
        assert_eq!(classify_line("00"), LineKind::Chatter);
    }

    #[test]
    fn test_non_ascii_digits_are_skipped() {
        assert_eq!(extract_weight("Gross \u{0663} 12.5").unwrap(), 12.5);
        assert_eq!(classify_line("Gross \u{0663}\u{0662} kg 7"), LineKind::Weight(7.0));
        assert!(matches!(
            classify_line("Gross \u{0663}"),
            LineKind::Rejected(ParseError::NoNumber(_))
        ));
    }
}

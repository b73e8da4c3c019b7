//! Parsing of human-written target lengths such as `"1m30s"`, `"2h"` or `"90"`.

use crate::config::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

fn length_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?P<h>\d+(?:\.\d+)?)\s*h)?\s*(?:(?P<m>\d+(?:\.\d+)?)\s*m)?\s*(?:(?P<s>\d+(?:\.\d+)?)\s*s?)?\s*$",
        )
        .expect("length pattern is a valid regex")
    })
}

/// Parse a length string into seconds.
///
/// Accepts any combination of `h`, `m` and `s` components in that order
/// (`"1h2m3s"`, `"2m"`, `"45s"`) as well as a bare number of seconds (`"15"`,
/// `"12.5"`). Fails with [`ConfigError::InvalidDurationFormat`] when the
/// string carries no numeric component at all.
pub fn parse_length(input: &str) -> Result<f64, ConfigError> {
    let invalid = || ConfigError::InvalidDurationFormat(input.to_string());

    let lowered = input.to_lowercase();
    let caps = length_pattern().captures(&lowered).ok_or_else(invalid)?;

    let mut seen_component = false;
    let mut total = 0.0;
    for (name, scale) in [("h", 3600.0), ("m", 60.0), ("s", 1.0)] {
        if let Some(m) = caps.name(name) {
            let value: f64 = m.as_str().parse().map_err(|_| invalid())?;
            total += value * scale;
            seen_component = true;
        }
    }

    if !seen_component {
        return Err(invalid());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bare_seconds() {
        assert_eq!(parse_length("15").unwrap(), 15.0);
        assert_eq!(parse_length(" 12.5 ").unwrap(), 12.5);
    }

    #[test]
    fn test_uppercase_suffixes() {
        assert_eq!(parse_length("1M30S").unwrap(), 90.0);
        assert_eq!(parse_length("2H").unwrap(), 7200.0);
    }

    #[test]
    fn test_suffixed_components() {
        assert_eq!(parse_length("45s").unwrap(), 45.0);
        assert_eq!(parse_length("2m").unwrap(), 120.0);
        assert_eq!(parse_length("1h").unwrap(), 3600.0);
        assert_eq!(parse_length("1m30s").unwrap(), 90.0);
        assert_eq!(parse_length("1h 2m 3s").unwrap(), 3723.0);
        assert_eq!(parse_length("1M30S").unwrap(), 90.0);
    }

    #[test]
    fn test_no_numeric_component_is_rejected() {
        for input in ["", "   ", "abc", "m", "hms", "1x", "s15"] {
            assert!(
                matches!(parse_length(input), Err(ConfigError::InvalidDurationFormat(_))),
                "'{}' should be rejected",
                input
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_components_sum_to_seconds(h in 0u32..5, m in 0u32..60, s in 0u32..60) {
            let input = format!("{}h{}m{}s", h, m, s);
            let parsed = parse_length(&input).unwrap();
            prop_assert_eq!(parsed, (h * 3600 + m * 60 + s) as f64);
        }
    }
}

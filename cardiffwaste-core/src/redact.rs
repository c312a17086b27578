//! Masking of property identifiers for log lines and diagnostics.

/// Redact all but the last four characters of a UPRN.
///
/// Single-character values pass through unchanged; values shorter than five
/// characters keep only their last character so that even short identifiers
/// never appear whole in logs.
#[must_use]
pub fn redact_uprn(uprn: &str) -> String {
    let length = uprn.chars().count();
    let keep = match length {
        0 | 1 => return uprn.to_owned(),
        2..=4 => 1,
        _ => 4,
    };
    let masked = length - keep;
    let mut redacted = "x".repeat(masked);
    redacted.extend(uprn.chars().skip(masked));
    redacted
}

#[cfg(test)]
mod tests {
    use super::redact_uprn;

    #[test]
    fn long_values_keep_last_four() {
        assert_eq!(redact_uprn("100100123456"), "xxxxxxxx3456");
        assert_eq!(redact_uprn("12345"), "x2345");
    }

    #[test]
    fn short_values_keep_last_one() {
        assert_eq!(redact_uprn("12"), "x2");
        assert_eq!(redact_uprn("123"), "xx3");
        assert_eq!(redact_uprn("1234"), "xxx4");
    }

    #[test]
    fn single_character_unchanged() {
        assert_eq!(redact_uprn("7"), "7");
    }

    #[test]
    fn empty_is_empty() {
        assert_eq!(redact_uprn(""), "");
    }

    #[test]
    fn mask_length_matches_input() {
        for raw in ["12345", "123456789", "100100123456"] {
            assert_eq!(redact_uprn(raw).len(), raw.len());
        }
    }
}

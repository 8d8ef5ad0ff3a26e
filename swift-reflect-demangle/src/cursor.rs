//! Low-level byte-slice helpers shared by every grammar rule.
//!
//! The grammar is written as a set of free functions of the shape
//! `fn parse_x(input: &[u8], ...) -> Option<(Out, &[u8])>`: on success they return the parsed
//! value together with the unconsumed remainder ("rest"), on failure `None`, so a caller can try
//! an alternate rule without unwinding any state. This file only holds the primitive byte-reading
//! operations those rules are built from.

/// Parses a run of ASCII decimal digits from the front of `input`, returning the value and the
/// remainder. Returns `None` if `input` doesn't start with a digit.
pub fn take_digits(input: &[u8]) -> Option<(usize, &[u8])> {
    let mut end = 0;
    while end < input.len() && input[end].is_ascii_digit() {
        end += 1;
    }
    if end == 0 {
        return None;
    }
    // SAFETY of the unwrap: we only consumed bytes verified to be ASCII digits.
    let value: usize = std::str::from_utf8(&input[..end]).ok()?.parse().ok()?;
    Some((value, &input[end..]))
}

/// Splits off exactly `n` bytes from the front of `input`, or `None` if it's shorter than that.
pub fn take_n(input: &[u8], n: usize) -> Option<(&[u8], &[u8])> {
    if input.len() < n {
        None
    } else {
        Some((&input[..n], &input[n..]))
    }
}

/// Consumes `literal` as a fixed prefix of `input`, returning the remainder.
pub fn take_prefix<'a>(input: &'a [u8], literal: &[u8]) -> Option<&'a [u8]> {
    input.strip_prefix(literal)
}

/// Reads a length-prefixed identifier: ASCII decimal digits followed by exactly that many bytes
/// of UTF-8 (§4.1's "length-prefixed" token class). Returns the decoded `&str` and the remainder.
pub fn take_length_prefixed(input: &[u8]) -> Option<(&str, &[u8])> {
    let (len, rest) = take_digits(input)?;
    let (literal, rest) = take_n(rest, len)?;
    let literal = std::str::from_utf8(literal).ok()?;
    Some((literal, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_length_prefixed_identifier() {
        assert_eq!(take_length_prefixed(b"4TestXYZ"), Some(("Test", &b"XYZ"[..])));
    }

    #[test]
    fn rejects_short_literal() {
        assert_eq!(take_length_prefixed(b"9Test"), None);
    }

    #[test]
    fn take_digits_stops_at_first_non_digit() {
        assert_eq!(take_digits(b"12ab"), Some((12, &b"ab"[..])));
        assert_eq!(take_digits(b"ab"), None);
    }
}

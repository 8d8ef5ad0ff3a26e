use std::fmt;

/// A deterministic placeholder substituted into a rendered name when a symbolic reference or
/// generic requirement target cannot be resolved.
///
/// Per §7's error taxonomy, an unresolved reference never fails the surrounding decode; instead
/// one of these placeholders is spliced into the rendered string so the rest of the name still
/// comes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The reference points outside the image (e.g. an external/dynamically-linked symbol).
    ExternalType,
    /// An indirect reference could not be dereferenced through any of the known strategies.
    UnresolvedIndirect,
    /// A relative or absolute offset fell outside the buffer.
    InvalidOffset(i64),
    /// A symbolic-reference marker byte was not one of the recognized kinds.
    UnknownMarker(u8),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ExternalType => write!(f, "/* external type */"),
            Diagnostic::UnresolvedIndirect => write!(f, "/* unresolved indirect */"),
            Diagnostic::InvalidOffset(offset) => write!(f, "/* invalid offset: {offset} */"),
            Diagnostic::UnknownMarker(marker) => {
                write!(f, "/* unknown symbolic reference: {marker:#04x} */")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_placeholders() {
        assert_eq!(Diagnostic::ExternalType.to_string(), "/* external type */");
        assert_eq!(
            Diagnostic::UnresolvedIndirect.to_string(),
            "/* unresolved indirect */"
        );
        assert_eq!(
            Diagnostic::InvalidOffset(-12).to_string(),
            "/* invalid offset: -12 */"
        );
        assert_eq!(
            Diagnostic::UnknownMarker(0x05).to_string(),
            "/* unknown symbolic reference: 0x05 */"
        );
    }
}

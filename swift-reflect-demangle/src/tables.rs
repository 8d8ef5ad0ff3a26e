//! Static lookup tables for the grammar's fixed-vocabulary token classes (§4.1).

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Single ASCII-character shortcuts for standard-library types, tried only when the entire
/// mangled string is exactly one of these characters.
pub fn shortcut1(c: u8) -> Option<&'static str> {
    Some(match c {
        b'a' => "Array",
        b'b' => "Bool",
        b'D' => "Dictionary",
        b'd' => "Double",
        b'f' => "Float",
        b'h' => "Set",
        b'i' => "Int",
        b'J' => "Character",
        b'N' => "ClosedRange",
        b'n' => "Range",
        b'O' => "ObjectIdentifier",
        b'P' => "UnsafePointer",
        b'p' => "UnsafeMutablePointer",
        b'q' => "Optional",
        b'R' => "UnsafeBufferPointer",
        b'r' => "UnsafeMutableBufferPointer",
        b'S' => "String",
        b's' => "Substring",
        b'u' => "UInt",
        b'V' => "UnsafeRawPointer",
        b'v' => "UnsafeMutableRawPointer",
        _ => return None,
    })
}

/// Two-character `S`-prefixed shortcuts for standard-library types, including the Swift
/// Concurrency (`Sc`-prefixed) additions.
pub fn shortcut2(token: &[u8]) -> Option<&'static str> {
    Some(match token {
        b"Sa" => "Array",
        b"Sb" => "Bool",
        b"SD" => "Dictionary",
        b"Sd" => "Double",
        b"Sf" => "Float",
        b"Sh" => "Set",
        b"Si" => "Int",
        b"SS" => "String",
        b"Su" => "UInt",
        b"Ss" => "Int8",
        b"SZ" => "UInt8",
        b"Sg" => "Optional",
        b"Sq" => "Optional",
        b"yt" => "()",
        b"ScT" => "Task",
        b"Scg" => "TaskGroup",
        b"ScG" => "ThrowingTaskGroup",
        b"ScP" => "TaskPriority",
        b"ScA" => "Actor",
        b"ScM" => "MainActor",
        b"ScC" => "CheckedContinuation",
        b"ScU" => "UnsafeContinuation",
        b"ScS" => "AsyncStream",
        b"ScF" => "AsyncThrowingStream",
        _ => return None,
    })
}

/// Two-character `S`-prefixed shortcuts that name a protocol rather than a concrete type. Used
/// only in constraint/requirement contexts, where the overlapping bytes with [`shortcut2`]
/// (e.g. `SD`) are disambiguated by the surrounding grammar rule rather than by the table itself.
pub fn protocol_shortcut2(token: &[u8]) -> Option<&'static str> {
    Some(match token {
        b"SH" => "Hashable",
        b"SE" => "Equatable",
        b"SQ" => "Equatable",
        b"Sl" => "Collection",
        b"ST" => "Sequence",
        b"SL" => "Comparable",
        b"Sz" => "BinaryInteger",
        b"SZ" => "SignedInteger",
        b"SU" => "UnsignedInteger",
        b"SY" => "RawRepresentable",
        b"Se" => "Encodable",
        b"SD" => "Decodable",
        b"SN" => "FixedWidthInteger",
        _ => return None,
    })
}

/// Standard-library protocol names spelled with the compact `s<len><name>P` encoding (§4.1)
/// rather than the general qualified-name grammar (`10Foundation...`) — these protocols outgrew
/// the single two-character slot the [`protocol_shortcut2`] table has room for, so Swift spells
/// their full name out but still marks them as coming from the standard module via the `s`
/// prefix.
pub fn standard_protocol_name(name: &str) -> Option<&'static str> {
    const NAMES: &[&str] = &[
        "Sendable",
        "Error",
        "Codable",
        "Comparable",
        "Hashable",
        "Equatable",
        "Identifiable",
        "AsyncSequence",
        "AsyncIteratorProtocol",
        "IteratorProtocol",
        "Actor",
        "AdditiveArithmetic",
        "CustomStringConvertible",
        "TextOutputStream",
    ];
    NAMES.iter().find(|&&n| n == name).copied()
}

/// `B`-prefixed builtin-type tokens. Rendered best-effort; Non-goals (spec.md §1) explicitly
/// excludes full fidelity with the vendor demangler's `Builtin.*` width/vector suffix grammar.
pub fn builtin(token: &[u8]) -> Option<&'static str> {
    Some(match token {
        b"Bb" => "Builtin.BridgeObject",
        b"Bo" => "Builtin.NativeObject",
        b"BO" => "Builtin.UnknownObject",
        b"Bp" => "Builtin.RawPointer",
        b"Bw" => "Builtin.Word",
        b"BB" => "Builtin.UnsafeValueBuffer",
        b"BD" => "Builtin.DefaultActorStorage",
        b"Be" => "Builtin.Executor",
        b"Bi" => "Builtin.Int",
        b"Bf" => "Builtin.FPIEEE",
        b"Bv" => "Builtin.Vector",
        _ => return None,
    })
}

/// Maps a well-known Foundation/Dispatch Objective-C class name to its bridged Swift name. Names
/// with no bridged equivalent pass through unchanged.
pub fn objc_bridged_name(name: &str) -> &str {
    static TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
        HashMap::from([
            ("NSString", "String"),
            ("NSArray", "Array"),
            ("NSDictionary", "Dictionary"),
            ("NSSet", "Set"),
            ("NSNumber", "NSNumber"),
            ("NSURL", "URL"),
            ("NSData", "Data"),
            ("NSDate", "Date"),
            ("NSError", "NSError"),
            ("NSObject", "NSObject"),
        ])
    });

    if let Some(bridged) = TABLE.get(name) {
        return bridged;
    }
    if let Some(suffix) = name.strip_prefix("OS_dispatch_") {
        // "OS_dispatch_queue" -> "DispatchQueue"; leak is fine, these are small and rare.
        return Box::leak(format!("Dispatch{}", titlecase(suffix)).into_boxed_str());
    }
    name
}

fn titlecase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Common whole-name to demangled-form shortcuts tried first by [`crate::demangle`], per §4.1's
/// "common-pattern table" token class.
pub fn common_pattern(mangled: &str) -> Option<&'static str> {
    static TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
        HashMap::from([
            ("yt", "()"),
            ("Sg", "Optional"),
            ("Sq", "Optional"),
            ("Si", "Int"),
            ("SS", "String"),
        ])
    });
    TABLE.get(mangled).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut1_covers_int() {
        assert_eq!(shortcut1(b'i'), Some("Int"));
    }

    #[test]
    fn shortcut2_covers_string() {
        assert_eq!(shortcut2(b"SS"), Some("String"));
    }

    #[test]
    fn standard_protocol_name_covers_sendable() {
        assert_eq!(standard_protocol_name("Sendable"), Some("Sendable"));
        assert_eq!(standard_protocol_name("NotAProtocol"), None);
    }

    #[test]
    fn objc_bridging_maps_foundation_types() {
        assert_eq!(objc_bridged_name("NSString"), "String");
        assert_eq!(objc_bridged_name("MyCustomClass"), "MyCustomClass");
    }

    #[test]
    fn objc_bridging_maps_dispatch_types() {
        assert_eq!(objc_bridged_name("OS_dispatch_queue"), "DispatchQueue");
    }
}

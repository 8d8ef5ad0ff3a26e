//! The legacy `_Tt`-prefixed ObjC-interop mangling used for `@objc` class and protocol names
//! (§4.1, operations `demangleClassName`/`demangleProtocolName`).

use crate::cursor::take_length_prefixed;

/// Demangles an `@objc`-exposed class name, returning `(module, name)`. Handles the plain
/// `_TtC<module><name>` form, the nested `_TtCC<module><outer><inner>` form (a class declared
/// inside another class, joined with `.`), and the generic `_TtGC<module><name>...` form (whose
/// trailing generic-argument list isn't rendered into the returned name).
pub fn demangle_class_name(mangled: &str) -> Option<(String, String)> {
    if let Some(rest) = mangled.strip_prefix("_TtCC") {
        let (module, rest) = take_length_prefixed(rest.as_bytes())?;
        let (outer, rest) = take_length_prefixed(rest)?;
        let (inner, rest) = take_length_prefixed(rest)?;
        if !rest.is_empty() {
            return None;
        }
        return Some((module.to_string(), format!("{outer}.{inner}")));
    }

    if let Some(rest) = mangled.strip_prefix("_TtGC") {
        let (module, rest) = take_length_prefixed(rest.as_bytes())?;
        let (name, _rest) = take_length_prefixed(rest)?;
        return Some((module.to_string(), name.to_string()));
    }

    let rest = mangled.strip_prefix("_TtC")?;
    let (module, rest) = take_length_prefixed(rest.as_bytes())?;
    let (name, rest) = take_length_prefixed(rest)?;
    if !rest.is_empty() {
        return None;
    }
    Some((module.to_string(), name.to_string()))
}

/// Demangles an `@objc`-exposed protocol name of the form `_TtP<module><name>_`, returning
/// `(module, name)`. The trailing `_` is the protocol-list terminator and is discarded.
pub fn demangle_protocol_name(mangled: &str) -> Option<(String, String)> {
    let rest = mangled.strip_prefix("_TtP")?;
    let (module, rest) = take_length_prefixed(rest.as_bytes())?;
    let (name, rest) = take_length_prefixed(rest)?;
    let rest = rest.strip_prefix(b"_")?;
    if !rest.is_empty() {
        return None;
    }
    Some((module.to_string(), name.to_string()))
}

//! Demangling support for Swift's name-mangling grammar.
//!
//! This is a pure-Rust, best-effort subset of Swift's mangling scheme: the Swift-5 (`$s`/`_$s`)
//! type and function grammar, and the legacy `_Tt`-prefixed ObjC-interop class/protocol forms.
//! Other source languages (C++, Rust, MSVC) are out of scope; see the crate's Non-goals.
//!
//! # Examples
//!
//! ```rust
//! use swift_reflect_demangle::demangle;
//!
//! assert_eq!(demangle("Si"), "Int");
//! assert_eq!(demangle("SaySiG"), "[Int]");
//! ```

#![warn(missing_docs)]

mod cursor;
mod function;
mod generic;
mod grammar;
mod legacy;
mod tables;
mod words;

use std::borrow::Cow;

pub use function::{ClosureConvention, ClosureType, FunctionSignature, ThrowsKind};
pub use generic::{GenericRequirement, GenericRequirementKind, GenericSignature};
pub use legacy::{demangle_class_name, demangle_protocol_name};

use words::WordList;

/// Strips the prefix a Swift-5 mangled type or symbol carries (`_$s` or `$s`), if present.
fn strip_swift5_prefix(s: &str) -> &str {
    s.strip_prefix("_$s").or_else(|| s.strip_prefix("$s")).unwrap_or(s)
}

/// Demangles a single Swift type mangling, e.g. `"Si"` -> `"Int"`, `"SaySiG"` -> `"[Int]"`.
///
/// Never fails. Empty input renders as the empty string. If the first byte is a symbolic-
/// reference marker (ordinal ≤ `0x17`), the input is returned verbatim — the caller is expected
/// to have preprocessed binary markers via the resolver before calling this. Otherwise tries, in
/// order: the common-pattern table, a single-character stdlib shortcut (only when the entire
/// input is one character), the builtin-type table, then the full structural grammar; on a
/// partial structural match, the rendered prefix is followed by the unparsed tail verbatim.
pub fn demangle(mangled: &str) -> String {
    if mangled.is_empty() {
        return String::new();
    }
    if mangled.as_bytes()[0] <= 0x17 {
        return mangled.to_string();
    }

    let body = strip_swift5_prefix(mangled);

    if let Some(name) = tables::common_pattern(body) {
        return name.to_string();
    }
    if body.len() == 1 {
        if let Some(name) = tables::shortcut1(body.as_bytes()[0]) {
            return name.to_string();
        }
    }
    if body.len() == 2 {
        if let Some(name) = tables::builtin(body.as_bytes()) {
            return name.to_string();
        }
    }

    let mut words = WordList::new();
    match grammar::parse_type(body.as_bytes(), &mut words, 0) {
        Some((rendered, rest)) if rest.is_empty() => rendered,
        Some((rendered, rest)) => format!("{rendered}{}", String::from_utf8_lossy(rest)),
        None => mangled.to_string(),
    }
}

/// Demangles a Swift symbol of unknown shape: tries a function signature, then the legacy
/// `_Tt`-prefixed class/protocol forms, then a bare type mangling, falling back to the original
/// string unchanged if nothing recognizes it (mirroring the common "demangle, else pass through"
/// convention for symbol names of uncertain origin).
pub fn demangle_swift_name(mangled: &str) -> Cow<'_, str> {
    if let Some(sig) = function::demangle_function_signature(mangled) {
        let mut rendered = String::new();
        if !sig.type_context.is_empty() {
            rendered.push_str(&sig.type_context.join("."));
            rendered.push('.');
        }
        rendered.push_str(&sig.module);
        rendered.push('.');
        rendered.push_str(&sig.name);
        rendered.push('(');
        rendered.push_str(&sig.parameters.join(", "));
        rendered.push(')');
        return Cow::Owned(rendered);
    }
    if let Some((module, name)) = legacy::demangle_class_name(mangled) {
        return Cow::Owned(format!("{module}.{name}"));
    }
    if let Some((module, name)) = legacy::demangle_protocol_name(mangled) {
        return Cow::Owned(format!("{module}.{name}"));
    }
    Cow::Owned(demangle(mangled))
}

/// Extracts the bare (unqualified) type name from a type mangling, dropping module/enclosing-type
/// qualification, e.g. `"4Test6WidgetV"` -> `"Widget"`.
pub fn extract_type_name(mangled: &str) -> Option<String> {
    if mangled.is_empty() {
        return None;
    }
    let rendered = demangle(mangled);
    match rendered.rsplit_once('.') {
        Some((_, last)) => Some(last.to_string()),
        None => Some(rendered),
    }
}

/// Demangles a function symbol's signature. See [`function::demangle_function_signature`].
pub fn demangle_function_signature(symbol: &str) -> Option<FunctionSignature> {
    function::demangle_function_signature(symbol)
}

/// Demangles a closure-type mangling. See [`function::demangle_closure_type`].
pub fn demangle_closure_type(mangled: &str) -> Option<ClosureType> {
    function::demangle_closure_type(mangled)
}

/// Demangles a generic signature. See [`generic::demangle_generic_signature`].
pub fn demangle_generic_signature(mangled: &str) -> Option<GenericSignature> {
    generic::demangle_generic_signature(mangled)
}

/// Parses exactly one type token from the front of `input`, returning the rendered type and how
/// many bytes of `input` it consumed.
///
/// This is the byte-accounting counterpart to [`demangle`]: where `demangle` renders a whole
/// mangled string and silently appends any unparsed tail, this is for a caller (the symbolic
/// resolver's container fast path) that needs to know exactly where one type argument ends so it
/// can continue parsing the next one out of a shared byte cursor.
pub fn parse_one_type(input: &str) -> Option<(String, usize)> {
    let mut words = WordList::new();
    let (rendered, rest) = grammar::parse_type(input.as_bytes(), &mut words, 0)?;
    Some((rendered, input.len() - rest.len()))
}

/// Parses a comma-less sequence of concatenated type manglings, e.g. the generic-argument list
/// embedded in a symbolic reference's generic-suffix pass (§4.2). Best-effort: stops and returns
/// what it has if a prefix fails to parse as a type.
pub fn demangle_type_list(input: &str) -> Vec<String> {
    let mut words = WordList::new();
    let mut rest = input.as_bytes();
    let mut items = Vec::new();
    while !rest.is_empty() {
        match grammar::parse_type(rest, &mut words, 0) {
            Some((rendered, next)) => {
                items.push(rendered);
                rest = next;
            }
            None => break,
        }
    }
    items
}

/// Options controlling how much detail [`Demangle::demangle`] includes in its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemangleOptions {
    parameters: bool,
    return_type: bool,
}

impl DemangleOptions {
    /// Renders only the base name, with no parameter list or return type.
    pub fn name_only() -> Self {
        DemangleOptions {
            parameters: false,
            return_type: false,
        }
    }

    /// Renders the full signature: parameters and return type.
    pub fn complete() -> Self {
        DemangleOptions {
            parameters: true,
            return_type: true,
        }
    }

    /// Controls whether the parameter list is included.
    pub fn parameters(mut self, parameters: bool) -> Self {
        self.parameters = parameters;
        self
    }

    /// Controls whether the return type is included.
    pub fn return_type(mut self, return_type: bool) -> Self {
        self.return_type = return_type;
        self
    }
}

impl Default for DemangleOptions {
    fn default() -> Self {
        DemangleOptions::name_only()
    }
}

/// A borrowed mangled name, ready to be demangled.
///
/// Mirrors the `Demangle`-over-`Name` idiom: wrap a raw symbol string, then ask it to demangle
/// itself under a given [`DemangleOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MangledName<'a>(pub &'a str);

impl<'a> From<&'a str> for MangledName<'a> {
    fn from(s: &'a str) -> Self {
        MangledName(s)
    }
}

/// Demangles Swift symbol and type names under a [`DemangleOptions`] policy.
pub trait Demangle {
    /// Demangles this name, returning the original string unchanged if it isn't recognized.
    fn demangle(&self, options: DemangleOptions) -> Cow<'_, str>;

    /// Demangles this name, returning `None` if it isn't recognized as a Swift mangling at all.
    fn try_demangle(&self, options: DemangleOptions) -> Option<Cow<'_, str>>;
}

impl<'a> Demangle for MangledName<'a> {
    fn demangle(&self, options: DemangleOptions) -> Cow<'_, str> {
        self.try_demangle(options)
            .unwrap_or(Cow::Borrowed(self.0))
    }

    fn try_demangle(&self, options: DemangleOptions) -> Option<Cow<'_, str>> {
        let sig = function::demangle_function_signature(self.0)?;

        let mut rendered = String::new();
        if !sig.type_context.is_empty() {
            rendered.push_str(&sig.type_context.join("."));
            rendered.push('.');
        }
        rendered.push_str(&sig.module);
        rendered.push('.');
        rendered.push_str(&sig.name);

        if options.parameters {
            rendered.push('(');
            rendered.push_str(&sig.parameters.join(", "));
            rendered.push(')');
        }
        if options.return_type {
            rendered.push_str(" -> ");
            rendered.push_str(&sig.return_type);
        }
        Some(Cow::Owned(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demangles_bare_shortcut() {
        assert_eq!(demangle("Si"), "Int");
    }

    #[test]
    fn demangles_array_of_int() {
        assert_eq!(demangle("SaySiG"), "[Int]");
    }

    #[test]
    fn demangle_swift_name_falls_back_to_input() {
        assert_eq!(demangle_swift_name("not-a-mangled-name"), "not-a-mangled-name");
    }

    #[test]
    fn demangle_swift_name_renders_class() {
        assert_eq!(
            demangle_swift_name("_TtC10Foundation8NSObject"),
            "Foundation.NSObject"
        );
    }

    #[test]
    fn extract_type_name_drops_module_qualification() {
        assert_eq!(extract_type_name("4Test6WidgetV").as_deref(), Some("Widget"));
    }

    #[test]
    fn name_demangles_with_options() {
        let name = MangledName::from("_$s4Test3fooSSyF");
        assert_eq!(name.demangle(DemangleOptions::name_only()), "Test.foo");
        assert_eq!(
            name.demangle(DemangleOptions::complete()),
            "Test.foo() -> String"
        );
    }

    #[test]
    fn name_try_demangle_none_for_unrecognized_input() {
        let name = MangledName::from("garbage");
        assert_eq!(name.try_demangle(DemangleOptions::complete()), None);
    }

    #[test]
    fn parse_one_type_reports_consumed_length() {
        let (rendered, consumed) = parse_one_type("SiSS").unwrap();
        assert_eq!(rendered, "Int");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn demangle_type_list_splits_concatenated_types() {
        assert_eq!(
            demangle_type_list("SiSS"),
            vec!["Int".to_string(), "String".to_string()]
        );
    }
}

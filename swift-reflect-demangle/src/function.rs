//! Function-signature and closure-type demangling (§4.1's "operations" list, entries 6-8).

use crate::cursor::take_length_prefixed;
use crate::grammar::parse_type;
use crate::words::WordList;

/// The effects a Swift function signature may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrowsKind {
    /// The function does not throw.
    None,
    /// The function throws, with no typed-throws error type.
    Untyped,
    /// The function declares a typed-throws error type.
    Typed(String),
}

/// A demangled function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// The defining module.
    pub module: String,
    /// Enclosing nominal type names, outermost first, if the function is a member.
    pub type_context: Vec<String>,
    /// The function's base name.
    pub name: String,
    /// Parameter types, in declaration order. An empty parameter list is `[]`, not `["Void"]`.
    pub parameters: Vec<String>,
    /// The return type.
    pub return_type: String,
    /// Whether the function is declared `async`.
    pub is_async: bool,
    /// Whether the function value is `Sendable`.
    pub is_sendable: bool,
    /// The function's throwing behavior.
    pub throws: ThrowsKind,
}

/// The calling convention recorded on a closure-type mangling's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureConvention {
    /// Objective-C block (`@convention(block)`).
    Block,
    /// C function pointer (`@convention(c)`).
    CFunction,
    /// Swift noescape closure (`@noescape`).
    SwiftNoescape,
    /// Thin function reference (`@convention(thin)`).
    Thin,
    /// Ordinary escaping Swift closure, the default when no other suffix is present.
    SwiftEscaping,
}

/// A demangled closure type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureType {
    /// The closure's calling convention.
    pub convention: ClosureConvention,
    /// Parameter types, in declaration order.
    pub parameters: Vec<String>,
    /// The return type.
    pub return_type: String,
}

/// Strips the `_$s`/`$s` prefix symbolic functions are mangled with.
fn strip_prefix(symbol: &str) -> Option<&str> {
    symbol.strip_prefix("_$s").or_else(|| symbol.strip_prefix("$s"))
}

/// Parses the module, optional nested-type context, and base name shared by function- and
/// closure-adjacent manglings, returning them plus the unconsumed remainder.
fn parse_context_and_name<'a>(
    input: &'a [u8],
    words: &mut WordList,
) -> Option<(String, Vec<String>, String, &'a [u8])> {
    let (module, mut rest) = take_length_prefixed(input)?;
    words.push_literal(module);

    let mut type_context = Vec::new();
    loop {
        let (literal, next) = take_length_prefixed(rest)?;
        words.push_literal(literal);

        // A component immediately followed by a nominal-kind marker is a nested type context;
        // the final component with no marker (or at end of input) is the function's base name.
        if let Some(marker) = next.first().copied() {
            if matches!(marker, b'C' | b'V' | b'O') {
                type_context.push(literal.to_string());
                rest = &next[1..];
                continue;
            }
        }

        return Some((module.to_string(), type_context, literal.to_string(), next));
    }
}

/// The outcome of scanning a signature-middle token stream.
struct SignatureMiddle {
    return_type: String,
    parameters: Vec<String>,
    is_async: bool,
    is_sendable: bool,
    throws: ThrowsKind,
}

/// Scans the signature-middle token stream (the bytes between the base name and the final kind
/// terminator) left to right, per §4.1: effect markers `Ya` (async), `Yb` (`@Sendable`), `YK`
/// (typed throws — the immediately preceding parsed type becomes the error type), bare `K` not
/// followed by `Z` (untyped throws), and `y` (the empty-list sentinel, pushing `Void`) are
/// recognized interleaved with ordinary type tokens. After scanning, the first parsed type is the
/// return type; the remainder are parameters; `Void` parameters are discarded.
fn scan_signature_middle(mut input: &[u8], words: &mut WordList) -> Option<SignatureMiddle> {
    let mut tokens: Vec<String> = Vec::new();
    let mut is_async = false;
    let mut is_sendable = false;
    let mut throws = ThrowsKind::None;

    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix(b"Ya") {
            is_async = true;
            input = rest;
            continue;
        }
        if let Some(rest) = input.strip_prefix(b"Yb") {
            is_sendable = true;
            input = rest;
            continue;
        }
        if let Some(rest) = input.strip_prefix(b"YK") {
            let error_type = tokens.pop()?;
            throws = ThrowsKind::Typed(error_type);
            input = rest;
            continue;
        }
        if input[0] == b'K' && input.get(1).copied() != Some(b'Z') {
            throws = ThrowsKind::Untyped;
            input = &input[1..];
            continue;
        }
        if let Some(rest) = input.strip_prefix(b"y") {
            tokens.push("Void".to_string());
            input = rest;
            continue;
        }
        let (token, rest) = parse_type(input, words, 0)?;
        tokens.push(token);
        input = rest;
    }

    let mut iter = tokens.into_iter();
    let return_type = iter.next()?;
    let parameters = iter.filter(|t| t != "Void").collect();
    Some(SignatureMiddle {
        return_type,
        parameters,
        is_async,
        is_sendable,
        throws,
    })
}

/// Demangles a Swift function symbol into its signature.
///
/// Recognizes the `F` (function), `f` (global accessor), `g` (getter), `s` (setter), `W`
/// (protocol witness), and `Z` (static) terminators, per the function-kind terminator set.
pub fn demangle_function_signature(symbol: &str) -> Option<FunctionSignature> {
    let body = strip_prefix(symbol)?;

    let terminator = body.as_bytes().last().copied()?;
    if !matches!(terminator, b'F' | b'f' | b'g' | b's' | b'W' | b'Z') {
        return None;
    }
    let middle_and_name = &body.as_bytes()[..body.len() - 1];

    let mut words = WordList::new();
    let (module, type_context, name, middle) = parse_context_and_name(middle_and_name, &mut words)?;
    let scanned = scan_signature_middle(middle, &mut words)?;

    Some(FunctionSignature {
        module,
        type_context,
        name,
        parameters: scanned.parameters,
        return_type: scanned.return_type,
        is_async: scanned.is_async,
        is_sendable: scanned.is_sendable,
        throws: scanned.throws,
    })
}

/// Demangles a Swift closure-type mangling (the type mangled for a closure's captured-context
/// descriptor, not a full function symbol).
pub fn demangle_closure_type(mangled: &str) -> Option<ClosureType> {
    let bytes = mangled.as_bytes();

    let (convention, body) = if let Some(rest) = strip_suffix(bytes, b"cXB") {
        (ClosureConvention::Block, rest)
    } else if let Some(rest) = strip_suffix(bytes, b"cXC") {
        (ClosureConvention::CFunction, rest)
    } else if let Some(rest) = strip_suffix(bytes, b"cXE") {
        (ClosureConvention::SwiftNoescape, rest)
    } else if let Some(rest) = strip_suffix(bytes, b"Xf") {
        (ClosureConvention::Thin, rest)
    } else if let Some(rest) = strip_suffix(bytes, b"c") {
        (ClosureConvention::SwiftEscaping, rest)
    } else {
        return None;
    };

    let mut words = WordList::new();
    let scanned = scan_signature_middle(body, &mut words)?;

    Some(ClosureType {
        convention,
        parameters: scanned.parameters,
        return_type: scanned.return_type,
    })
}

fn strip_suffix<'a>(input: &'a [u8], suffix: &[u8]) -> Option<&'a [u8]> {
    if input.ends_with(suffix) {
        Some(&input[..input.len() - suffix.len()])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demangles_simple_function_signature() {
        let sig = demangle_function_signature("_$s4Test3fooSSyF").unwrap();
        assert_eq!(sig.module, "Test");
        assert_eq!(sig.name, "foo");
        assert_eq!(sig.parameters, Vec::<String>::new());
        assert_eq!(sig.return_type, "String");
        assert!(!sig.is_async);
        assert!(!sig.is_sendable);
        assert_eq!(sig.throws, ThrowsKind::None);
    }

    #[test]
    fn demangles_block_convention_closure() {
        let closure = demangle_closure_type("ySScXB").unwrap();
        assert_eq!(closure.convention, ClosureConvention::Block);
        assert_eq!(closure.parameters, vec!["String".to_string()]);
        assert_eq!(closure.return_type, "Void");
    }

    #[test]
    fn demangles_bare_escaping_closure() {
        let closure = demangle_closure_type("Sic").unwrap();
        assert_eq!(closure.convention, ClosureConvention::SwiftEscaping);
        assert_eq!(closure.return_type, "Int");
        assert!(closure.parameters.is_empty());
    }

    #[test]
    fn demangles_async_throwing_function_signature() {
        let sig = demangle_function_signature("_$s4Test3barSiyKYaF").unwrap();
        assert_eq!(sig.module, "Test");
        assert_eq!(sig.name, "bar");
        assert_eq!(sig.return_type, "Int");
        assert!(sig.parameters.is_empty());
        assert!(sig.is_async);
        assert!(!sig.is_sendable);
        assert_eq!(sig.throws, ThrowsKind::Untyped);
    }

    #[test]
    fn demangles_typed_throws_function_signature() {
        let sig = demangle_function_signature("_$s4Test3bazSiSSYKyF").unwrap();
        assert_eq!(sig.return_type, "Int");
        assert!(sig.parameters.is_empty());
        assert_eq!(sig.throws, ThrowsKind::Typed("String".to_string()));
    }

    #[test]
    fn rejects_symbol_without_recognized_terminator() {
        assert!(demangle_function_signature("_$s4Test3fooSSy").is_none());
    }
}

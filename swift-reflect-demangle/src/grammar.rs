//! The structural type-name grammar (§4.1): containers, ObjC-imported names, qualified names,
//! and Swift-5 word substitution, wired together as a recursive-descent parser over byte slices.
//!
//! Every rule has the shape `fn parse_x(input: &[u8], words: &mut WordList, depth: usize) ->
//! Option<(String, &[u8])>`, returning the rendered fragment and the unconsumed remainder. A rule
//! that needs to try more than one alternative clones `words` for each attempt so an abandoned
//! branch doesn't leave behind word-substitution entries the chosen branch never emitted.

use crate::cursor::{take_length_prefixed, take_n, take_prefix};
use crate::tables::{builtin, objc_bridged_name, shortcut2, standard_protocol_name};
use crate::words::WordList;

/// Parses one type token, including a trailing run of `Sg` optional-wrapping suffixes.
///
/// `depth` counts nesting already consumed (containers, word-substitution chains); parsing stops
/// rather than recursing once it exceeds [`swift_reflect_common::MAX_RECURSION_DEPTH`] (§4.1's
/// container recursion cap).
pub fn parse_type<'a>(
    input: &'a [u8],
    words: &mut WordList,
    depth: usize,
) -> Option<(String, &'a [u8])> {
    if depth > swift_reflect_common::MAX_RECURSION_DEPTH {
        return None;
    }

    let (mut rendered, mut rest) = parse_type_base(input, words, depth)?;
    while let Some(after_sg) = take_prefix(rest, b"Sg") {
        rendered = format!("{rendered}?");
        rest = after_sg;
    }
    Some((rendered, rest))
}

fn parse_type_base<'a>(
    input: &'a [u8],
    words: &mut WordList,
    depth: usize,
) -> Option<(String, &'a [u8])> {
    parse_container(input, words, depth)
        .or_else(|| parse_objc_imported(input, words, depth))
        .or_else(|| parse_builtin(input))
        .or_else(|| parse_shortcut2(input))
        .or_else(|| parse_standard_protocol(input))
        .or_else(|| parse_qualified(input, words, depth))
}

/// `s<len><name>P`: a standard-library protocol named via the compact `s`-module encoding rather
/// than the general qualified-name grammar (§4.1).
fn parse_standard_protocol(input: &[u8]) -> Option<(String, &[u8])> {
    let rest = take_prefix(input, b"s")?;
    let (name, rest) = take_length_prefixed(rest)?;
    let rest = take_prefix(rest, b"P")?;
    let rendered = standard_protocol_name(name)?;
    Some((rendered.to_string(), rest))
}

/// `Say<T>G` / `SDy<K><V>G` / `Shy<T>G`: the fast-path container spellings for `Array`,
/// `Dictionary`, and `Set`.
fn parse_container<'a>(
    input: &'a [u8],
    words: &mut WordList,
    depth: usize,
) -> Option<(String, &'a [u8])> {
    let (name, arity, rest) = if let Some(rest) = take_prefix(input, b"Say") {
        ("Array", 1, rest)
    } else if let Some(rest) = take_prefix(input, b"SDy") {
        ("Dictionary", 2, rest)
    } else if let Some(rest) = take_prefix(input, b"Shy") {
        ("Set", 1, rest)
    } else {
        return None;
    };

    let mut rest = rest;
    let mut args = Vec::with_capacity(arity);
    for _ in 0..arity {
        let mut branch_words = words.clone();
        let (arg, next) = parse_type(rest, &mut branch_words, depth + 1)?;
        *words = branch_words;
        args.push(arg);
        rest = next;
    }
    let rest = take_prefix(rest, b"G")?;

    let rendered = match name {
        "Array" => format!("[{}]", args[0]),
        "Set" => format!("Set<{}>", args[0]),
        "Dictionary" => format!("[{}: {}]", args[0], args[1]),
        _ => unreachable!(),
    };
    Some((rendered, rest))
}

/// `So<len><name>[C|V|O|P_]`: an Objective-C-imported type, bridged to its Swift name when known.
fn parse_objc_imported<'a>(
    input: &'a [u8],
    _words: &mut WordList,
    _depth: usize,
) -> Option<(String, &'a [u8])> {
    let rest = take_prefix(input, b"So")?;
    let (name, rest) = take_length_prefixed(rest)?;

    let (is_protocol, rest) = if let Some(rest) = take_prefix(rest, b"P_") {
        (true, rest)
    } else if let Some(rest) = take_n(rest, 1).filter(|(b, _)| matches!(b[0], b'C' | b'V' | b'O')) {
        (false, rest.1)
    } else {
        (false, rest)
    };

    let bridged = objc_bridged_name(name);
    let rendered = if is_protocol {
        format!("any {bridged}")
    } else {
        bridged.to_string()
    };
    Some((rendered, rest))
}

fn parse_builtin(input: &[u8]) -> Option<(String, &[u8])> {
    let (token, rest) = take_n(input, 2)?;
    let name = builtin(token)?;
    Some((name.to_string(), rest))
}

fn parse_shortcut2(input: &[u8]) -> Option<(String, &[u8])> {
    let (token, rest) = take_n(input, 2)?;
    let name = shortcut2(token)?;
    Some((name.to_string(), rest))
}

/// One or more length-prefixed name components, each optionally suffixed with a `C`/`V`/`O`
/// nominal-kind marker (discarded), joined with `.`. A component beginning with `0` is a
/// word-substitution reference chain rather than a literal.
fn parse_qualified<'a>(
    input: &'a [u8],
    words: &mut WordList,
    depth: usize,
) -> Option<(String, &'a [u8])> {
    if depth > swift_reflect_common::MAX_RECURSION_DEPTH {
        return None;
    }

    let mut components = Vec::new();
    let mut rest = input;

    loop {
        let (component, next) = parse_identifier_component(rest, words)?;
        components.push(component);
        rest = next;

        // A nominal-kind marker may follow any component (innermost nested type usually carries
        // it); it's consumed and discarded regardless of whether another component follows.
        if let Some((_, after_marker)) =
            take_n(rest, 1).filter(|(b, _)| matches!(b[0], b'C' | b'V' | b'O'))
        {
            rest = after_marker;
        }

        match rest.first() {
            Some(b) if b.is_ascii_digit() || *b == b'0' => continue,
            _ => break,
        }
    }

    if components.is_empty() {
        return None;
    }
    Some((components.join("."), rest))
}

/// A single identifier component: either a plain length-prefixed literal, or (when it starts
/// with `0`) a word-substitution reference chain (§4.1).
fn parse_identifier_component<'a>(
    input: &'a [u8],
    words: &mut WordList,
) -> Option<(String, &'a [u8])> {
    if input.first() == Some(&b'0') {
        return parse_word_substitution(&input[1..], words);
    }

    let (literal, rest) = take_length_prefixed(input)?;
    words.push_literal(literal);
    Some((literal.to_string(), rest))
}

/// A run of word-substitution references: lowercase `a..z` are non-final back-references,
/// terminated by one uppercase `A..Z` final reference, optionally followed by a trailing
/// length-prefixed literal.
fn parse_word_substitution<'a>(
    input: &'a [u8],
    words: &mut WordList,
) -> Option<(String, &'a [u8])> {
    let mut rendered = String::new();
    let mut rest = input;

    loop {
        let b = *rest.first()?;
        if b.is_ascii_lowercase() {
            let word = words.resolve((b - b'a') as usize)?;
            rendered.push_str(word);
            rest = &rest[1..];
            continue;
        }
        if b.is_ascii_uppercase() {
            let word = words.resolve((b - b'A') as usize)?;
            rendered.push_str(word);
            rest = &rest[1..];
            break;
        }
        return None;
    }

    if let Some((literal, next)) = take_length_prefixed(rest) {
        rendered.push_str(literal);
        words.push_literal(literal);
        rest = next;
    }

    words.push_literal(&rendered);
    Some((rendered, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Option<String> {
        let mut words = WordList::new();
        parse_type(input.as_bytes(), &mut words, 0).map(|(rendered, rest)| {
            assert!(rest.is_empty(), "leftover input: {:?}", rest);
            rendered
        })
    }

    #[test]
    fn parses_bare_shortcut() {
        assert_eq!(parse("Si"), Some("Int".to_string()));
    }

    #[test]
    fn parses_optional_wrapped_string() {
        assert_eq!(parse("SSSg"), Some("String?".to_string()));
    }

    #[test]
    fn parses_array_of_int() {
        assert_eq!(parse("SaySiG"), Some("[Int]".to_string()));
    }

    #[test]
    fn parses_dictionary_of_string_to_int() {
        assert_eq!(parse("SDySSSiG"), Some("[String: Int]".to_string()));
    }

    #[test]
    fn parses_set_of_int() {
        assert_eq!(parse("ShySiG"), Some("Set<Int>".to_string()));
    }

    #[test]
    fn parses_qualified_module_type() {
        assert_eq!(parse("4Test6WidgetV"), Some("Test.Widget".to_string()));
    }

    #[test]
    fn parses_objc_imported_bridged_name() {
        assert_eq!(parse("So8NSStringC"), Some("String".to_string()));
    }

    #[test]
    fn parses_objc_imported_protocol() {
        assert_eq!(parse("So8NSObjectP_"), Some("any NSObject".to_string()));
    }

    #[test]
    fn parses_standard_protocol_sendable() {
        assert_eq!(parse("s8SendableP"), Some("Sendable".to_string()));
    }

    #[test]
    fn rejects_standard_protocol_with_unknown_name() {
        assert_eq!(parse("s7UnknownP"), None);
    }
}

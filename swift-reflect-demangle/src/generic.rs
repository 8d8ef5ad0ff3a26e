//! Generic-signature demangling (§4.1, `demangleGenericSignature`).
//!
//! Best-effort: generic parameters are rendered with single-letter placeholder names (`A`, `B`,
//! `C`, ...) rather than recovering the declaration's actual parameter names, which aren't present
//! in the mangling. Requirements follow Swift's `x`/`y`/`z`/`q<n>_` parameter-reference scheme.

use crate::cursor::{take_digits, take_length_prefixed};
use crate::grammar::parse_type;
use crate::tables::protocol_shortcut2;
use crate::words::WordList;

/// The kind of constraint a [`GenericRequirement`] expresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericRequirementKind {
    /// `Param: Protocol`.
    Conformance,
    /// `Param == Type`.
    SameType,
    /// `Param: AnyObject` (a class-layout constraint).
    Layout,
    /// `Param: SuperclassType`.
    BaseClass,
    /// `Param.AssocType: Protocol` — a conformance requirement on a dependent member type rather
    /// than directly on a generic parameter.
    AssociatedConformance,
}

/// One constraint in a generic signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRequirement {
    /// The constrained generic parameter's placeholder name.
    pub parameter: String,
    /// The kind of constraint.
    pub kind: GenericRequirementKind,
    /// The right-hand side of the constraint, rendered as Swift source would show it.
    pub constraint: String,
}

/// A demangled generic signature: its parameter list and requirement clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSignature {
    /// Generic parameter placeholder names, in declaration order.
    pub parameters: Vec<String>,
    /// Requirement clauses, in encounter order.
    pub requirements: Vec<GenericRequirement>,
}

/// Renders the `n`th (zero-based) generic parameter using Swift's conventional placeholder
/// names: `T`, `U`, `V`, `W` for the first four, then `T0`, `T1`, ... (§4.1, §4.3).
fn param_name(n: usize) -> String {
    match n {
        0 => "T".to_string(),
        1 => "U".to_string(),
        2 => "V".to_string(),
        3 => "W".to_string(),
        _ => format!("T{}", n - 4),
    }
}

/// Parses a single parameter reference (`x`, `y`, `z`, or `q<digits>_`), returning its
/// placeholder name and the remainder.
fn parse_param_ref(input: &[u8]) -> Option<(String, &[u8])> {
    match input.first()? {
        b'x' => Some((param_name(0), &input[1..])),
        b'y' => Some((param_name(1), &input[1..])),
        b'z' => Some((param_name(2), &input[1..])),
        b'q' => {
            let (index, rest) = take_digits(&input[1..])?;
            let rest = rest.strip_prefix(b"_")?;
            Some((param_name(index + 3), rest))
        }
        _ => None,
    }
}

/// Parses a protocol-conformance target: either a two-character protocol shortcut or a full
/// structural type.
fn parse_protocol_name<'a>(input: &'a [u8], words: &mut WordList) -> Option<(String, &'a [u8])> {
    if input.len() >= 2 {
        if let Some(name) = protocol_shortcut2(&input[..2]) {
            return Some((name.to_string(), &input[2..]));
        }
    }
    parse_type(input, words, 0)
}

/// Demangles a generic-signature mangling into its parameter list and requirements.
///
/// Scans parameter-depth markers followed by `R`-prefixed requirement clauses, stopping at a
/// bare top-level `l` (the generic-signature terminator) that doesn't immediately follow an `R`.
pub fn demangle_generic_signature(mangled: &str) -> Option<GenericSignature> {
    let mut input = mangled.as_bytes();
    let mut words = WordList::new();
    let mut parameter_count = 0usize;
    let mut parameters = Vec::new();
    let mut requirements = Vec::new();

    while !input.is_empty() {
        match input[0] {
            b'R' => {
                let kind_marker = *input.get(1)?;
                let rest = &input[2..];
                let (parameter, kind, constraint, next) = match kind_marker {
                    b'z' => {
                        let (lhs, rest) = parse_param_ref(rest)?;
                        let (protocol, rest) = parse_protocol_name(rest, &mut words)?;
                        (lhs, GenericRequirementKind::Conformance, protocol, rest)
                    }
                    b's' => {
                        let (lhs, rest) = parse_param_ref(rest)?;
                        let (rhs, rest) = parse_param_ref(rest)?;
                        (lhs, GenericRequirementKind::SameType, rhs, rest)
                    }
                    b'l' => {
                        let (lhs, rest) = parse_param_ref(rest)?;
                        let rest = rest.strip_prefix(b"C")?;
                        (lhs, GenericRequirementKind::Layout, "AnyObject".to_string(), rest)
                    }
                    b'b' => {
                        let (lhs, rest) = parse_param_ref(rest)?;
                        let (superclass, rest) = parse_type(rest, &mut words, 0)?;
                        (lhs, GenericRequirementKind::BaseClass, superclass, rest)
                    }
                    b'_' => {
                        let (lhs, rest) = parse_param_ref(rest)?;
                        let (assoc_name, rest) = take_length_prefixed(rest)?;
                        let (protocol, rest) = parse_protocol_name(rest, &mut words)?;
                        (
                            format!("{lhs}.{assoc_name}"),
                            GenericRequirementKind::AssociatedConformance,
                            protocol,
                            rest,
                        )
                    }
                    _ => return None,
                };
                requirements.push(GenericRequirement {
                    parameter,
                    kind,
                    constraint,
                });
                input = next;
            }
            b'x' | b'y' | b'z' | b'q' => {
                let (_, rest) = parse_param_ref(input)?;
                parameters.push(param_name(parameter_count));
                parameter_count += 1;
                input = rest;
            }
            b'l' => {
                input = &input[1..];
                break;
            }
            _ => return None,
        }
    }

    Some(GenericSignature {
        parameters,
        requirements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_parameters_with_same_type_requirement() {
        let sig = demangle_generic_signature("xyRsxyl").unwrap();
        assert_eq!(sig.parameters, vec!["T".to_string(), "U".to_string()]);
        assert_eq!(sig.requirements.len(), 1);
        assert_eq!(sig.requirements[0].kind, GenericRequirementKind::SameType);
        assert_eq!(sig.requirements[0].parameter, "T");
        assert_eq!(sig.requirements[0].constraint, "U");
    }

    #[test]
    fn parses_conformance_requirement_with_protocol_shortcut() {
        let sig = demangle_generic_signature("xRzxSHl").unwrap();
        assert_eq!(sig.parameters, vec!["T".to_string()]);
        assert_eq!(sig.requirements.len(), 1);
        assert_eq!(sig.requirements[0].kind, GenericRequirementKind::Conformance);
        assert_eq!(sig.requirements[0].constraint, "Hashable");
    }

    #[test]
    fn parses_associated_type_conformance_requirement() {
        let sig = demangle_generic_signature("xR_x1ASHl").unwrap();
        assert_eq!(sig.parameters, vec!["T".to_string()]);
        assert_eq!(sig.requirements.len(), 1);
        assert_eq!(
            sig.requirements[0].kind,
            GenericRequirementKind::AssociatedConformance
        );
        assert_eq!(sig.requirements[0].parameter, "T.A");
        assert_eq!(sig.requirements[0].constraint, "Hashable");
    }

    #[test]
    fn param_name_follows_t_u_v_w_then_indexed() {
        assert_eq!(param_name(0), "T");
        assert_eq!(param_name(3), "W");
        assert_eq!(param_name(4), "T0");
        assert_eq!(param_name(5), "T1");
    }
}

//! Dereferences Swift's inline binary symbolic references into rendered type names.
//!
//! A Swift mangled-name byte sequence pulled out of a reflection section isn't always pure text:
//! it can carry 5-byte symbolic-reference markers pointing at context descriptors elsewhere in
//! the image, at indirect pointer slots, or at chained-fixup bind/rebase targets. This crate
//! walks those markers via a [`Resolver`] bound to a [`swift_reflect_common::BinaryImage`] and
//! hands the non-binary remainder to [`swift_reflect_demangle`].
//!
//! This module is part of the `swift-reflect` crate family.

#![warn(missing_docs)]

mod marker;
mod resolver;

pub use marker::{is_symbolic_marker, MarkerKind};
pub use resolver::Resolver;

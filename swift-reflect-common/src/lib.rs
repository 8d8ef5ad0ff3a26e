//! Shared types for `swift-reflect`.
//!
//! This crate holds the pieces that both the resolver and the decoder need but that belong to
//! neither: the external-collaborator traits a Mach-O loader implements to hand a binary image to
//! this crate ([`BinaryImage`] and friends), the diagnostic placeholders spliced into rendered
//! names when a reference can't be resolved ([`Diagnostic`]), and the primitive relative-pointer
//! reading helpers both of them build on.
//!
//! This module is part of the `swift-reflect` crate family.

#![warn(missing_docs)]

mod diagnostic;
mod error;
mod image;
mod relptr;

pub use diagnostic::Diagnostic;
pub use error::CommonError;
pub use image::{BinaryImage, ChainedFixups, FixupResult, Section, Segment};
pub use relptr::{read_cstr_at, read_i32, read_rel32, read_u16, read_u32, MAX_RECURSION_DEPTH};

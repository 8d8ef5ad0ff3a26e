//! Walks a Mach-O image's `__swift5_*` reflection sections and assembles a typed model of Swift
//! types, fields, protocols, conformances, and extensions.
//!
//! This crate owns none of the binary-container logic — callers implement [`BinaryImage`] over
//! their own Mach-O (or Mach-O-shaped) container and hand it to [`Decoder::decode`]. Symbolic
//! references and mangled names encountered along the way are resolved through
//! `swift-reflect-resolver`, which in turn demangles through `swift-reflect-demangle`.
//!
//! ```no_run
//! use swift_reflect::Decoder;
//! # use swift_reflect_common::BinaryImage;
//! # fn example<'d>(image: &dyn BinaryImage<'d>) -> Result<(), swift_reflect::DecodeError> {
//! let metadata = Decoder::decode(image)?;
//! for ty in metadata.types() {
//!     println!("{}: {} field(s)", ty.name, ty.fields.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod conformances;
mod decoder;
mod error;
mod fields;
mod flags;
mod generic;
mod mangled;
mod model;
mod protocols;
mod types;
mod util;

pub use decoder::Decoder;
pub use error::DecodeError;
pub use flags::{
    ConformanceFlags, ContextDescriptorFlags, ContextKind, MetadataInitializationKind, TypeKind,
    TypeReferenceKind,
};
pub use model::{
    Conformance, Extension, Field, FieldDescriptor, FieldDescriptorKind, GenericRequirement,
    GenericRequirementKind, Metadata, Protocol, Requirement, RequirementKind, Type,
};

pub use swift_reflect_common::BinaryImage;

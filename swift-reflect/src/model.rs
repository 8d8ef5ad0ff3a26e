//! The immutable value model assembled by the decoder (§3).
//!
//! Every record here is built once, during a single `Decoder` run, and is immutable thereafter.
//! None of them borrow the image's byte buffer: every rendered name is an owned `String`, so a
//! `Metadata` value outlives the decoding session that produced it.

use indexmap::IndexMap;

use crate::flags::{ContextDescriptorFlags, ContextKind, ConformanceFlags, TypeKind};

/// A field of a [`Type`] or [`FieldDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field's name.
    pub name: String,
    /// The field's raw mangled-type bytes, as stored in the image.
    pub mangled_type: Vec<u8>,
    /// File offset of the mangled-type bytes, for lazy resolution.
    pub mangled_type_offset: i64,
    /// The rendered type name, if resolution was attempted eagerly.
    pub type_name: String,
    /// `true` if declared `var` (mutable); `false` for `let`.
    pub is_var: bool,
    /// `true` if this is an indirect enum-case payload.
    pub is_indirect: bool,
}

/// A generic requirement's kind (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericRequirementKind {
    /// `T: P` — a protocol conformance requirement.
    Protocol,
    /// `T == U` — a same-type requirement.
    SameType,
    /// `T: C` — a superclass requirement.
    BaseClass,
    /// A same-conformance requirement (shared conformance across associated types).
    SameConformance,
    /// `T: AnyObject` (or another layout constraint).
    Layout,
    /// Any other low-nibble value.
    Other(u8),
}

impl GenericRequirementKind {
    /// Decodes the low nibble of a generic requirement record's flags word.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x0F {
            0 => GenericRequirementKind::Protocol,
            1 => GenericRequirementKind::SameType,
            2 => GenericRequirementKind::BaseClass,
            3 => GenericRequirementKind::SameConformance,
            4 => GenericRequirementKind::Layout,
            other => GenericRequirementKind::Other(other as u8),
        }
    }
}

/// A single generic requirement attached to a generic [`Type`] or [`Extension`] (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRequirement {
    /// The requirement's kind.
    pub kind: GenericRequirementKind,
    /// The constrained generic parameter's rendered name (e.g. `"T"`).
    pub param: String,
    /// The rendered constraint (a protocol name, a type name, or `"AnyObject"` for an empty
    /// layout target).
    pub constraint: String,
    /// The record's raw flags word, carrying the key-argument and extra-argument bits verbatim.
    pub raw_flags: u32,
}

/// A nominal type: a class, struct, or enum declaration (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    /// File offset of the type's context descriptor; serves as its stable identity.
    pub offset: i64,
    /// Which of the three nominal kinds this is.
    pub kind: TypeKind,
    /// The type's unqualified name.
    pub name: String,
    /// The enclosing context's rendered name (module, type, or extension).
    pub parent_name: String,
    /// The enclosing context's kind.
    pub parent_kind: ContextKind,
    /// The rendered superclass name, for classes that declare one.
    pub superclass_name: Option<String>,
    /// The type's stored properties (or enum cases), in declaration order.
    pub fields: Vec<Field>,
    /// Rendered generic parameter names (`T`, `U`, ... or as many as could be read).
    pub generic_parameters: Vec<String>,
    /// The number of generic parameters the context descriptor declares.
    pub generic_param_count: u16,
    /// Generic requirements attached to this type, if generic.
    pub generic_requirements: Vec<GenericRequirement>,
    /// The raw context-descriptor flags word.
    pub raw_flags: u32,
    /// A decoded view over [`Type::raw_flags`].
    pub flags: ContextDescriptorFlags,
    /// The address of a linked Objective-C class, for classes that bridge to one.
    pub objc_class_address: Option<u64>,
}

impl Type {
    /// `true` iff this type declares one or more generic parameters.
    pub fn is_generic(&self) -> bool {
        self.generic_param_count > 0
    }
}

/// A protocol requirement's kind (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    /// An inherited protocol.
    BaseProtocol,
    /// An instance or static method.
    Method,
    /// An initializer.
    Initializer,
    /// A property getter.
    Getter,
    /// A property setter.
    Setter,
    /// A property's `read` coroutine accessor.
    ReadCoroutine,
    /// A property's `modify` coroutine accessor.
    ModifyCoroutine,
    /// An associated type's witness accessor.
    AssociatedTypeAccessFunction,
    /// An associated conformance's witness accessor.
    AssociatedConformanceAccessFunction,
    /// Any other low-nibble value.
    Other(u8),
}

impl RequirementKind {
    /// Decodes the low nibble of a protocol requirement record's flags word.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x0F {
            0 => RequirementKind::BaseProtocol,
            1 => RequirementKind::Method,
            2 => RequirementKind::Initializer,
            3 => RequirementKind::Getter,
            4 => RequirementKind::Setter,
            5 => RequirementKind::ReadCoroutine,
            6 => RequirementKind::ModifyCoroutine,
            7 => RequirementKind::AssociatedTypeAccessFunction,
            8 => RequirementKind::AssociatedConformanceAccessFunction,
            other => RequirementKind::Other(other as u8),
        }
    }
}

/// One entry in a [`Protocol`]'s requirement sequence (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The requirement's kind.
    pub kind: RequirementKind,
    /// The requirement's name. Empty for methods, initializers, getters, setters, and coroutine
    /// accessors — their names live in witness tables this crate doesn't interpret (§7).
    pub name: String,
    /// `true` for an instance (rather than static) requirement.
    pub is_instance: bool,
    /// `true` for an `async` requirement.
    pub is_async: bool,
    /// `true` if the requirement carries a default implementation. Always `false` for
    /// [`RequirementKind::BaseProtocol`], whose `defaultImpl` slot is reused to point at the
    /// inherited protocol instead.
    pub has_default_implementation: bool,
}

/// A protocol declaration (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    /// File offset of the protocol's context descriptor.
    pub offset: i64,
    /// The protocol's unqualified name.
    pub name: String,
    /// The enclosing context's rendered name.
    pub parent_name: String,
    /// Associated-type names, in declaration order.
    pub associated_type_names: Vec<String>,
    /// Names of protocols this one inherits from, discovered via
    /// [`RequirementKind::BaseProtocol`] requirements.
    pub inherited_protocol_names: Vec<String>,
    /// The protocol's requirement sequence, in declaration order.
    pub requirements: Vec<Requirement>,
}

/// A Swift-runtime protocol conformance (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conformance {
    /// File offset of the conformance record.
    pub offset: i64,
    /// File offset of the conforming type's context descriptor, when resolvable.
    pub conforming_type_offset: Option<i64>,
    /// The conforming type's rendered name.
    pub type_name: String,
    /// The conforming type's raw mangled name, when the type reference carries one.
    pub mangled_type_name: String,
    /// The protocol's rendered name.
    pub protocol_name: String,
    /// File offset of the protocol's context descriptor, when resolvable.
    pub protocol_offset: Option<i64>,
    /// The record's raw flags word.
    pub raw_flags: u32,
    /// A decoded view over [`Conformance::raw_flags`].
    pub flags: ConformanceFlags,
}

/// The kind of a [`FieldDescriptor`]'s owner (§3, §4.3).
///
/// Numeric values mirror the Swift ABI's own `FieldDescriptorKind` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDescriptorKind {
    /// A struct's stored properties.
    Struct,
    /// A class's stored properties.
    Class,
    /// A single-payload enum's cases.
    Enum,
    /// A multi-payload enum's cases.
    MultiPayloadEnum,
    /// A protocol's associated-value placeholder (rare; carries no real fields).
    Protocol,
    /// A class-constrained protocol's placeholder.
    ClassProtocol,
    /// An `@objc` protocol's placeholder.
    ObjcProtocol,
    /// An `@objc` class's placeholder (fields live in ObjC metadata instead).
    ObjcClass,
    /// Any other value.
    Other(u16),
}

impl FieldDescriptorKind {
    /// Decodes a field descriptor's 16-bit kind field.
    pub fn from_bits(bits: u16) -> Self {
        match bits {
            0 => FieldDescriptorKind::Struct,
            1 => FieldDescriptorKind::Class,
            2 => FieldDescriptorKind::Enum,
            3 => FieldDescriptorKind::MultiPayloadEnum,
            4 => FieldDescriptorKind::Protocol,
            5 => FieldDescriptorKind::ClassProtocol,
            6 => FieldDescriptorKind::ObjcProtocol,
            7 => FieldDescriptorKind::ObjcClass,
            other => FieldDescriptorKind::Other(other),
        }
    }
}

/// A raw field-descriptor record, as read directly out of `__swift5_fieldmd` (§3, §4.3).
///
/// This is the section-native counterpart to [`Type::fields`]: every [`Type`] with fields has a
/// matching `FieldDescriptor`, but `FieldDescriptor`s also exist for kinds (protocols, ObjC
/// classes) that never produce a [`Type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// File offset of the field-descriptor record.
    pub offset: i64,
    /// The kind of entity this descriptor describes.
    pub kind: FieldDescriptorKind,
    /// The rendered name of the owning type's mangled-name field.
    pub mangled_type_name: String,
    /// The owning type's raw mangled-name bytes.
    pub mangled_type_name_raw: Vec<u8>,
    /// The rendered superclass name, if the record's `superclass` field is non-zero.
    pub superclass_name: Option<String>,
    /// The descriptor's field records, in declaration order.
    pub fields: Vec<Field>,
}

/// An extension declaration (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// File offset of the extension's context descriptor.
    pub offset: i64,
    /// The rendered name of the type being extended.
    pub extended_type_name: String,
    /// The raw mangled name of the type being extended.
    pub extended_type_mangled_name: String,
    /// The module the extension is declared in, if determinable.
    pub module_name: Option<String>,
    /// Names of protocol conformances added by this extension, discovered by cross-referencing
    /// the conformance index against this extension's descriptor offset.
    pub added_conformances: Vec<String>,
    /// Rendered generic parameter names, for a constrained extension.
    pub generic_parameters: Vec<String>,
    /// The number of generic parameters the context descriptor declares.
    pub generic_param_count: u16,
    /// Generic requirements attached to this extension.
    pub generic_requirements: Vec<GenericRequirement>,
    /// The raw context-descriptor flags word.
    pub raw_flags: u32,
}

/// The complete decoded result of one [`crate::Decoder::decode`] run (§3).
///
/// Every sequence is in section-encounter order; every index is first-wins on duplicate keys and
/// surjective onto its backing sequence (§8).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// All decoded nominal types, in section-encounter order.
    pub types: Vec<Type>,
    /// All decoded protocols, in section-encounter order.
    pub protocols: Vec<Protocol>,
    /// All decoded conformances, in section-encounter order.
    pub conformances: Vec<Conformance>,
    /// All raw field descriptors, in section-encounter order.
    pub field_descriptors: Vec<FieldDescriptor>,
    /// All decoded extensions, in section-encounter order.
    pub extensions: Vec<Extension>,

    /// `Type.name -> index into `types``, first-wins.
    pub types_by_name: IndexMap<String, usize>,
    /// `"parent.name" -> index into `types``, first-wins.
    pub types_by_full_name: IndexMap<String, usize>,
    /// `Type.offset -> index into `types``, first-wins.
    pub types_by_offset: IndexMap<i64, usize>,
    /// `Conformance.type_name -> indices into `conformances``.
    pub conformances_by_type_name: IndexMap<String, Vec<usize>>,
    /// `Conformance.protocol_name -> indices into `conformances``.
    pub conformances_by_protocol_name: IndexMap<String, Vec<usize>>,
    /// `Extension.extended_type_name -> indices into `extensions``.
    pub extensions_by_type_name: IndexMap<String, Vec<usize>>,
}

impl Metadata {
    /// Looks up a type by its unqualified name.
    pub fn type_by_name(&self, name: &str) -> Option<&Type> {
        self.types_by_name.get(name).map(|&i| &self.types[i])
    }

    /// Looks up a type by its fully-qualified (`Parent.Name`) name.
    pub fn type_by_full_name(&self, name: &str) -> Option<&Type> {
        self.types_by_full_name.get(name).map(|&i| &self.types[i])
    }

    /// Looks up a type by its context descriptor's source offset.
    pub fn type_by_offset(&self, offset: i64) -> Option<&Type> {
        self.types_by_offset.get(&offset).map(|&i| &self.types[i])
    }

    /// All conformances declared for the type named `name`.
    pub fn conformances_for_type(&self, name: &str) -> Vec<&Conformance> {
        self.conformances_by_type_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.conformances[i]).collect())
            .unwrap_or_default()
    }

    /// All conformances to the protocol named `name`.
    pub fn conformances_for_protocol(&self, name: &str) -> Vec<&Conformance> {
        self.conformances_by_protocol_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.conformances[i]).collect())
            .unwrap_or_default()
    }

    /// All extensions of the type named `name`.
    pub fn extensions_for_type(&self, name: &str) -> Vec<&Extension> {
        self.extensions_by_type_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.extensions[i]).collect())
            .unwrap_or_default()
    }

    /// Iterates over every decoded type.
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    /// Iterates over every decoded protocol.
    pub fn protocols(&self) -> impl Iterator<Item = &Protocol> {
        self.protocols.iter()
    }

    /// Iterates over every decoded conformance.
    pub fn conformances(&self) -> impl Iterator<Item = &Conformance> {
        self.conformances.iter()
    }

    /// Iterates over every raw field descriptor.
    pub fn field_descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.field_descriptors.iter()
    }

    /// Iterates over every decoded extension.
    pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }
}

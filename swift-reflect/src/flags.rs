//! Decoded views over the raw flag words carried by context descriptors and conformance
//! records (§3 "Context-kind flags", §6 "Context descriptor flag bits" / "Conformance flag
//! bits").

/// The 5-bit context kind stored in the low bits of every context descriptor's flags word.
///
/// `isType` holds for any variant in `[16, 31]`; only [`ContextKind::Class`],
/// [`ContextKind::Struct`], and [`ContextKind::Enum`] are decoded into a [`crate::Type`] — the
/// rest (including any unrecognized value in the type range) are surfaced only as a parent's
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// A module context: the root of a qualified name chain.
    Module,
    /// An extension context, yielding an [`crate::Extension`] rather than a [`crate::Type`].
    Extension,
    /// An anonymous context (e.g. a local function's scope).
    Anonymous,
    /// A protocol context, yielding a [`crate::Protocol`].
    Protocol,
    /// An opaque result type (`some P`).
    OpaqueType,
    /// A class type.
    Class,
    /// A struct type.
    Struct,
    /// An enum type.
    Enum,
    /// Any other 5-bit value; preserved so callers can at least see the raw kind.
    Other(u8),
}

impl ContextKind {
    /// Decodes the low 5 bits of a context descriptor's flags word.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x1F {
            0 => ContextKind::Module,
            1 => ContextKind::Extension,
            2 => ContextKind::Anonymous,
            3 => ContextKind::Protocol,
            4 => ContextKind::OpaqueType,
            16 => ContextKind::Class,
            17 => ContextKind::Struct,
            18 => ContextKind::Enum,
            other => ContextKind::Other(other),
        }
    }

    /// `true` for the three nominal-type kinds (`[16, 31]` in the ABI's own terms; here, the
    /// three kinds this crate actually recognizes as types).
    pub fn is_type(self) -> bool {
        matches!(self, ContextKind::Class | ContextKind::Struct | ContextKind::Enum)
    }
}

/// The kind of a decoded [`crate::Type`] — the subset of [`ContextKind`] that `isType` admits
/// and that this crate materializes as a full record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A class declaration.
    Class,
    /// A struct declaration.
    Struct,
    /// An enum declaration.
    Enum,
}

impl TypeKind {
    /// Narrows a [`ContextKind`] to a [`TypeKind`], if it names one of the three nominal kinds.
    pub fn from_context_kind(kind: ContextKind) -> Option<Self> {
        match kind {
            ContextKind::Class => Some(TypeKind::Class),
            ContextKind::Struct => Some(TypeKind::Struct),
            ContextKind::Enum => Some(TypeKind::Enum),
            _ => None,
        }
    }
}

/// How a class context descriptor's metadata is initialized (bits 8-9 of the flags word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataInitializationKind {
    /// No special initialization is required.
    None,
    /// A single shared metadata instance is lazily created.
    Singleton,
    /// Metadata is vended by a foreign-metadata runtime hook.
    Foreign,
    /// Any other 2-bit value.
    Other(u8),
}

impl MetadataInitializationKind {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => MetadataInitializationKind::None,
            1 => MetadataInitializationKind::Singleton,
            2 => MetadataInitializationKind::Foreign,
            other => MetadataInitializationKind::Other(other),
        }
    }
}

/// A decoded view over a context descriptor's raw 32-bit flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextDescriptorFlags {
    raw: u32,
}

impl ContextDescriptorFlags {
    /// Wraps a raw flags word.
    pub fn new(raw: u32) -> Self {
        ContextDescriptorFlags { raw }
    }

    /// The raw, undecoded flags word.
    pub fn raw(self) -> u32 {
        self.raw
    }

    /// The 5-bit context kind.
    pub fn kind(self) -> ContextKind {
        ContextKind::from_bits(self.raw as u8)
    }

    /// Bit 7: the context is generic.
    pub fn is_generic(self) -> bool {
        self.raw & (1 << 7) != 0
    }

    /// Bit 6: this is the unique canonical descriptor for its context.
    pub fn is_unique(self) -> bool {
        self.raw & (1 << 6) != 0
    }

    /// Bits 8-9: how metadata for this (class) context is initialized.
    pub fn metadata_initialization_kind(self) -> MetadataInitializationKind {
        MetadataInitializationKind::from_bits((self.raw >> 8) as u8)
    }

    /// Bit 12: class has a static VTable entry.
    pub fn has_static_vtable(self) -> bool {
        self.raw & (1 << 12) != 0
    }

    /// Bit 13: class declares a resilient superclass, shifting the generic-context header.
    pub fn has_resilient_superclass(self) -> bool {
        self.raw & (1 << 13) != 0
    }

    /// Bit 14: class has an override table.
    pub fn has_override_table(self) -> bool {
        self.raw & (1 << 14) != 0
    }

    /// Bit 15: class has a vtable.
    pub fn has_vtable(self) -> bool {
        self.raw & (1 << 15) != 0
    }
}

/// How a conformance record's type reference should be interpreted (low 3 bits of a
/// conformance record's flags word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeReferenceKind {
    /// The type reference points directly at a type context descriptor.
    DirectTypeDescriptor,
    /// The type reference points at a pointer to a type context descriptor.
    IndirectTypeDescriptor,
    /// The type reference points directly at an Objective-C class object.
    DirectObjCClass,
    /// The type reference points at a pointer to an Objective-C class object.
    IndirectObjCClass,
    /// Any other 3-bit value.
    Other(u8),
}

impl TypeReferenceKind {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            0 => TypeReferenceKind::DirectTypeDescriptor,
            1 => TypeReferenceKind::IndirectTypeDescriptor,
            2 => TypeReferenceKind::DirectObjCClass,
            3 => TypeReferenceKind::IndirectObjCClass,
            other => TypeReferenceKind::Other(other),
        }
    }
}

/// A decoded view over a conformance record's raw 32-bit flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformanceFlags {
    raw: u32,
}

impl ConformanceFlags {
    /// Wraps a raw flags word.
    pub fn new(raw: u32) -> Self {
        ConformanceFlags { raw }
    }

    /// The raw, undecoded flags word.
    pub fn raw(self) -> u32 {
        self.raw
    }

    /// Bits 0-2: how the conforming type is referenced.
    pub fn type_reference_kind(self) -> TypeReferenceKind {
        TypeReferenceKind::from_bits(self.raw as u8)
    }

    /// Bit 3: the conformance is declared in a module that owns neither the type nor the
    /// protocol.
    pub fn is_retroactive(self) -> bool {
        self.raw & (1 << 3) != 0
    }

    /// Bit 4: the conformance was synthesized and may not be unique.
    pub fn is_synthesized_non_unique(self) -> bool {
        self.raw & (1 << 4) != 0
    }

    /// Bit 5: the witness table has resilient witnesses.
    pub fn has_resilient_witnesses(self) -> bool {
        self.raw & (1 << 5) != 0
    }

    /// Bit 6: the witness table itself is generic.
    pub fn has_generic_witness_table(self) -> bool {
        self.raw & (1 << 6) != 0
    }

    /// Bits 8-15: the number of conditional requirements the conformance carries.
    pub fn num_conditional_requirements(self) -> u8 {
        ((self.raw >> 8) & 0xFF) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_kind_decodes_low_five_bits() {
        assert_eq!(ContextKind::from_bits(17), ContextKind::Struct);
        assert_eq!(ContextKind::from_bits(16 | 0x80), ContextKind::Class);
    }

    #[test]
    fn is_type_holds_only_for_nominal_kinds() {
        assert!(ContextKind::Class.is_type());
        assert!(!ContextKind::Module.is_type());
        assert!(!ContextKind::Protocol.is_type());
    }

    #[test]
    fn context_descriptor_flags_decode_class_bits() {
        let flags = ContextDescriptorFlags::new(
            16 | (1 << 6) | (1 << 7) | (1 << 12) | (1 << 13) | (1 << 14) | (1 << 15) | (1 << 8),
        );
        assert_eq!(flags.kind(), ContextKind::Class);
        assert!(flags.is_unique());
        assert!(flags.is_generic());
        assert!(flags.has_static_vtable());
        assert!(flags.has_resilient_superclass());
        assert!(flags.has_override_table());
        assert!(flags.has_vtable());
        assert_eq!(
            flags.metadata_initialization_kind(),
            MetadataInitializationKind::Singleton
        );
    }

    #[test]
    fn conformance_flags_decode_type_reference_kind_and_counts() {
        let flags = ConformanceFlags::new(1 | (1 << 3) | (5 << 8));
        assert_eq!(flags.type_reference_kind(), TypeReferenceKind::IndirectTypeDescriptor);
        assert!(flags.is_retroactive());
        assert!(!flags.is_synthesized_non_unique());
        assert_eq!(flags.num_conditional_requirements(), 5);
    }
}

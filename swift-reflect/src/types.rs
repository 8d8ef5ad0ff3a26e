//! Decodes the `__swift5_types` section: a dense array of relative pointers to type-context
//! descriptors (§4.3). Each descriptor yields either a [`Type`] (class/struct/enum) or an
//! [`Extension`]; any other context kind found here is skipped.

use std::collections::HashMap;

use swift_reflect_common::{read_rel32, read_u32, BinaryImage};
use swift_reflect_resolver::Resolver;

use crate::flags::{ContextDescriptorFlags, ContextKind, TypeKind};
use crate::generic::{decode_generic_requirements, generic_parameter_names, read_generic_header};
use crate::mangled::read_mangled_name;
use crate::model::{Extension, Field, FieldDescriptor, Type};
use crate::util::{checked_offset, resolve_name_at};

const COMMON_HEADER_LEN: usize = 12;
const CLASS_BODY_LEN: usize = 44;
const NOMINAL_BODY_LEN: usize = 20;
const EXTENSION_BODY_LEN: usize = 16;

/// One decoded entry from the type-descriptor section.
pub enum DecodedContext {
    /// A class, struct, or enum declaration.
    Type(Type),
    /// An extension declaration (its added conformances are filled in later, once the
    /// conformance section has been decoded).
    Extension(Extension),
}

/// Reads the dense `rel32` array at `[start, end)` and decodes every entry that names a type or
/// extension context. Entries pointing at corrupt or unsupported descriptors are skipped.
pub fn decode_type_section<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    start: usize,
    end: usize,
    field_descriptors_by_offset: &HashMap<i64, usize>,
    field_descriptors_by_owner: &HashMap<i64, usize>,
    field_descriptors: &[FieldDescriptor],
) -> Vec<DecodedContext> {
    let data = image.data();
    let mut out = Vec::new();
    let mut entry_offset = start;

    while entry_offset + 4 <= end {
        if let Ok(Some(target)) = read_rel32(data, entry_offset) {
            if let Some(decoded) = decode_context(
                image,
                resolver,
                target,
                field_descriptors_by_offset,
                field_descriptors_by_owner,
                field_descriptors,
            ) {
                out.push(decoded);
            }
        }
        entry_offset += 4;
    }

    out
}

pub(crate) fn context_kind_at<'d>(image: &dyn BinaryImage<'d>, offset: i64) -> ContextKind {
    let data = image.data();
    checked_offset(offset, data.len())
        .and_then(|o| read_u32(data, o).ok())
        .map(|flags| ContextKind::from_bits(flags as u8))
        .unwrap_or(ContextKind::Other(0))
}

/// Recursively composes a context descriptor's fully-qualified name by walking its parent chain,
/// mirroring the resolver's own `directContext` marker-decode algorithm (§4.2) applied to a
/// context reached directly through the type-descriptor array rather than through a symbolic
/// marker.
pub(crate) fn describe_context_chain<'d>(image: &dyn BinaryImage<'d>, offset: i64) -> String {
    let data = image.data();
    let Some(field_offset) = checked_offset(offset, data.len()) else {
        return String::new();
    };
    let Ok(flags) = read_u32(data, field_offset) else {
        return String::new();
    };
    let kind = flags & 0x1F;

    let name = read_rel32(data, field_offset + 8)
        .ok()
        .flatten()
        .and_then(|t| checked_offset(t, data.len()))
        .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
        .unwrap_or("");

    if kind == 0 {
        return name.to_string();
    }

    match read_rel32(data, field_offset + 4).ok().flatten() {
        Some(parent_target) => {
            let parent_name = describe_context_chain(image, parent_target);
            if parent_name.is_empty() || parent_name == "Swift" {
                name.to_string()
            } else {
                format!("{parent_name}.{name}")
            }
        }
        None => name.to_string(),
    }
}

fn decode_context<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: i64,
    field_descriptors_by_offset: &HashMap<i64, usize>,
    field_descriptors_by_owner: &HashMap<i64, usize>,
    field_descriptors: &[FieldDescriptor],
) -> Option<DecodedContext> {
    let data = image.data();
    let field_offset = checked_offset(offset, data.len())?;

    let raw_flags = read_u32(data, field_offset).ok()?;
    let flags = ContextDescriptorFlags::new(raw_flags);
    let kind = flags.kind();

    let parent_target = read_rel32(data, field_offset + 4).ok().flatten();
    let name = read_rel32(data, field_offset + 8)
        .ok()
        .flatten()
        .and_then(|t| checked_offset(t, data.len()))
        .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
        .unwrap_or("")
        .to_string();

    let parent_name = parent_target
        .map(|t| describe_context_chain(image, t))
        .unwrap_or_default();
    let parent_kind = parent_target.map(|t| context_kind_at(image, t)).unwrap_or(ContextKind::Module);

    if kind == ContextKind::Extension {
        return decode_extension_body(
            image,
            resolver,
            offset,
            field_offset,
            raw_flags,
            flags,
            parent_name,
            parent_kind,
        )
        .map(DecodedContext::Extension);
    }

    let type_kind = TypeKind::from_context_kind(kind)?;
    decode_type_body(
        image,
        resolver,
        offset,
        field_offset,
        type_kind,
        raw_flags,
        flags,
        name,
        parent_name,
        parent_kind,
        field_descriptors_by_offset,
        field_descriptors_by_owner,
        field_descriptors,
    )
    .map(DecodedContext::Type)
}

fn lookup_fields(
    fields_target: Option<i64>,
    type_offset: i64,
    field_descriptors_by_offset: &HashMap<i64, usize>,
    field_descriptors_by_owner: &HashMap<i64, usize>,
    field_descriptors: &[FieldDescriptor],
) -> Vec<Field> {
    let index = fields_target
        .and_then(|t| field_descriptors_by_offset.get(&t))
        .or_else(|| field_descriptors_by_owner.get(&type_offset));

    index.map(|&i| field_descriptors[i].fields.clone()).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn decode_type_body<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: i64,
    field_offset: usize,
    type_kind: TypeKind,
    raw_flags: u32,
    flags: ContextDescriptorFlags,
    name: String,
    parent_name: String,
    parent_kind: ContextKind,
    field_descriptors_by_offset: &HashMap<i64, usize>,
    field_descriptors_by_owner: &HashMap<i64, usize>,
    field_descriptors: &[FieldDescriptor],
) -> Option<Type> {
    let data = image.data();
    let is_class = matches!(type_kind, TypeKind::Class);

    let (fields_target, superclass_target, generic_base) = if is_class {
        let fields_target = read_rel32(data, field_offset + 16).ok().flatten();
        let superclass_target = read_rel32(data, field_offset + 20).ok().flatten();
        // bound-check the rest of the fixed body even though we don't retain every field.
        read_u32(data, field_offset + 40).ok()?;

        let mut base = field_offset + CLASS_BODY_LEN;
        if flags.has_resilient_superclass() {
            base += 4;
        }
        (fields_target, superclass_target, base)
    } else {
        read_u32(data, field_offset + COMMON_HEADER_LEN + 4).ok()?;
        (None, None, field_offset + NOMINAL_BODY_LEN)
    };

    let (generic_param_count, generic_parameters, generic_requirements) = if flags.is_generic() {
        match read_generic_header(data, generic_base) {
            Some(header) => (
                header.num_params,
                generic_parameter_names(header.num_params),
                decode_generic_requirements(
                    image,
                    resolver,
                    generic_base + 8,
                    header.num_requirements,
                ),
            ),
            None => (1, vec!["T".to_string()], Vec::new()),
        }
    } else {
        (0, Vec::new(), Vec::new())
    };

    let superclass_name = if is_class {
        superclass_target.map(|t| resolve_name_at(image, resolver, t))
    } else {
        None
    };

    let fields = lookup_fields(
        fields_target,
        offset,
        field_descriptors_by_offset,
        field_descriptors_by_owner,
        field_descriptors,
    );

    Some(Type {
        offset,
        kind: type_kind,
        name,
        parent_name,
        parent_kind,
        superclass_name,
        fields,
        generic_parameters,
        generic_param_count,
        generic_requirements,
        raw_flags,
        flags,
        objc_class_address: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn decode_extension_body<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: i64,
    field_offset: usize,
    raw_flags: u32,
    flags: ContextDescriptorFlags,
    parent_name: String,
    parent_kind: ContextKind,
) -> Option<Extension> {
    let data = image.data();
    let extended_type_target = read_rel32(data, field_offset + COMMON_HEADER_LEN).ok().flatten();

    let extended_type_mangled_name = extended_type_target
        .and_then(|t| checked_offset(t, data.len()))
        .map(|o| String::from_utf8_lossy(read_mangled_name(data, o)).into_owned())
        .unwrap_or_default();
    let extended_type_name = extended_type_target
        .map(|t| resolve_name_at(image, resolver, t))
        .unwrap_or_default();

    let generic_base = field_offset + EXTENSION_BODY_LEN;
    let (generic_param_count, generic_parameters, generic_requirements) = if flags.is_generic() {
        match read_generic_header(data, generic_base) {
            Some(header) => (
                header.num_params,
                generic_parameter_names(header.num_params),
                decode_generic_requirements(
                    image,
                    resolver,
                    generic_base + 8,
                    header.num_requirements,
                ),
            ),
            None => (1, vec!["T".to_string()], Vec::new()),
        }
    } else {
        (0, Vec::new(), Vec::new())
    };

    let module_name = (parent_kind == ContextKind::Module).then(|| parent_name.clone());

    Some(Extension {
        offset,
        extended_type_name,
        extended_type_mangled_name,
        module_name,
        added_conformances: Vec::new(),
        generic_parameters,
        generic_param_count,
        generic_requirements,
        raw_flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_reflect_common::{ChainedFixups, Segment};

    struct FakeImage<'d> {
        data: &'d [u8],
    }

    impl<'d> BinaryImage<'d> for FakeImage<'d> {
        fn data(&self) -> &'d [u8] {
            self.data
        }
        fn segments(&self) -> &[Segment] {
            &[]
        }
        fn is_little_endian(&self) -> bool {
            true
        }
        fn is_64_bit(&self) -> bool {
            true
        }
        fn chained_fixups(&self) -> Option<&dyn ChainedFixups> {
            None
        }
    }

    fn write_module(buf: &mut Vec<u8>, offset: usize, name: &str) {
        buf.resize(buf.len().max(offset + 12), 0);
        let name_field = offset + 8;
        let name_offset = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        let rel = name_offset as i64 - name_field as i64;
        buf[name_field..name_field + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }

    fn write_struct(buf: &mut Vec<u8>, offset: usize, parent_offset: usize, name: &str) {
        buf.resize(buf.len().max(offset + NOMINAL_BODY_LEN), 0);
        buf[offset..offset + 4].copy_from_slice(&17u32.to_le_bytes()); // kind=struct, non-generic
        let parent_field = offset + 4;
        let rel = parent_offset as i64 - parent_field as i64;
        buf[parent_field..parent_field + 4].copy_from_slice(&(rel as i32).to_le_bytes());
        let name_field = offset + 8;
        let name_offset = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        let rel = name_offset as i64 - name_field as i64;
        buf[name_field..name_field + 4].copy_from_slice(&(rel as i32).to_le_bytes());
        // numFields/fieldOffsetVectorOffset left zeroed.
    }

    #[test]
    fn decodes_a_nested_struct_with_module_parent() {
        let mut buf = Vec::new();
        write_module(&mut buf, 0, "MyApp");
        buf.resize(0x100, 0);
        write_struct(&mut buf, 0x100, 0, "Widget");

        // The type-descriptor array is one 4-byte entry, prepended before `buf`; every offset
        // inside `buf` shifts forward by the array's length.
        const ARRAY_LEN: usize = 4;
        let mut data = vec![0u8; ARRAY_LEN];
        let target = 0x100i64 + ARRAY_LEN as i64;
        data[0..4].copy_from_slice(&(target as i32).to_le_bytes());
        data.extend_from_slice(&buf);

        let image = FakeImage { data: &data };
        let mut resolver = Resolver::new(&image);
        let empty_map = HashMap::new();
        let decoded = decode_type_section(&image, &mut resolver, 0, 4, &empty_map, &empty_map, &[]);

        assert_eq!(decoded.len(), 1);
        match &decoded[0] {
            DecodedContext::Type(t) => {
                assert_eq!(t.kind, TypeKind::Struct);
                assert_eq!(t.name, "Widget");
                assert_eq!(t.parent_name, "MyApp");
                assert_eq!(t.parent_kind, ContextKind::Module);
                assert!(!t.is_generic());
            }
            DecodedContext::Extension(_) => panic!("expected a type"),
        }
    }
}

//! Decodes the `__swift5_proto` section: a dense array of 16-byte protocol conformance records
//! (§4.3). Unlike the type and protocol sections, conformance records carry no relative-pointer
//! indirection between the array and the record itself — each 16-byte slot *is* a record.

use scroll::{Pread, LE};

use swift_reflect_common::{read_rel32, read_u32, BinaryImage, Diagnostic};

use crate::flags::{ConformanceFlags, TypeReferenceKind};
use crate::model::Conformance;
use crate::types::describe_context_chain;
use crate::util::checked_offset;

const RECORD_LEN: usize = 16;

/// Walks every 16-byte conformance record in `[start, end)`. A record is dropped (not merely
/// skipped-and-retried, since every record here is fixed-width) when neither its type nor its
/// protocol name could be resolved (§4.3: "Produce a Conformance only when at least one of type
/// or protocol name is non-empty").
pub fn decode_conformance_section<'d>(image: &dyn BinaryImage<'d>, start: usize, end: usize) -> Vec<Conformance> {
    let mut out = Vec::new();
    let mut offset = start;

    while offset + RECORD_LEN <= end {
        if let Some(conformance) = decode_one(image, offset) {
            out.push(conformance);
        }
        offset += RECORD_LEN;
    }

    out
}

fn decode_one<'d>(image: &dyn BinaryImage<'d>, offset: usize) -> Option<Conformance> {
    let data = image.data();

    let protocol_offset = read_rel32(data, offset).ok()?;
    let type_ref_target = read_rel32(data, offset + 4).ok()?;
    // witnessTablePattern isn't interpreted by this crate (§1: "executing witness tables" is a
    // non-goal), but its presence is still bounds-checked so a truncated record is rejected.
    read_u32(data, offset + 8).ok()?;
    let raw_flags = read_u32(data, offset + 12).ok()?;
    let flags = ConformanceFlags::new(raw_flags);

    let protocol_name = protocol_offset.map(|t| descriptor_simple_name(image, t)).unwrap_or_default();

    let (conforming_type_offset, type_name, mangled_type_name) = match type_ref_target {
        Some(target) => decode_type_reference(image, flags.type_reference_kind(), target),
        None => (None, String::new(), String::new()),
    };

    if protocol_name.is_empty() && type_name.is_empty() {
        return None;
    }

    Some(Conformance {
        offset: offset as i64,
        conforming_type_offset,
        type_name,
        mangled_type_name,
        protocol_name,
        protocol_offset,
        raw_flags,
        flags,
    })
}

/// Reads a context descriptor's own `name` field (the `flags:u32 | parent:rel32 | name:rel32`
/// header's third word) without walking its parent chain — the unqualified spelling used
/// elsewhere for [`crate::Protocol::name`] and [`crate::Type::name`].
fn descriptor_simple_name<'d>(image: &dyn BinaryImage<'d>, descriptor_offset: i64) -> String {
    let data = image.data();
    checked_offset(descriptor_offset, data.len())
        .and_then(|field_offset| read_rel32(data, field_offset + 8).ok().flatten())
        .and_then(|t| checked_offset(t, data.len()))
        .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
        .unwrap_or("")
        .to_string()
}

/// Dereferences a conformance record's type reference per the low 3 bits of its flags word
/// (§4.3, §6 "Conformance flag bits"), returning the conforming type's context-descriptor offset
/// (when the reference ultimately lands on one), its fully-qualified rendered name, and its raw
/// unqualified name.
fn decode_type_reference<'d>(
    image: &dyn BinaryImage<'d>,
    kind: TypeReferenceKind,
    target: i64,
) -> (Option<i64>, String, String) {
    match kind {
        TypeReferenceKind::DirectTypeDescriptor => {
            let type_name = describe_context_chain(image, target);
            let mangled_type_name = descriptor_simple_name(image, target);
            (Some(target), type_name, mangled_type_name)
        }
        TypeReferenceKind::IndirectTypeDescriptor => match read_indirect_pointer(image, target) {
            Some(resolved) => decode_type_reference(image, TypeReferenceKind::DirectTypeDescriptor, resolved),
            None => (None, String::new(), String::new()),
        },
        TypeReferenceKind::DirectObjCClass | TypeReferenceKind::IndirectObjCClass => {
            let name = read_objc_class_name(image, kind, target)
                .unwrap_or_else(|| Diagnostic::UnresolvedIndirect.to_string());
            (None, name.clone(), name)
        }
        TypeReferenceKind::Other(_) => (None, String::new(), String::new()),
    }
}

/// Reads a pointer-sized value at `target` and translates it into a file offset: via the image's
/// virtual-address map first, falling back to treating the raw value as already being a file
/// offset (mirroring the resolver's own indirect-context fallback chain, §4.2).
fn read_indirect_pointer<'d>(image: &dyn BinaryImage<'d>, target: i64) -> Option<i64> {
    let data = image.data();
    let offset = checked_offset(target, data.len())?;

    let raw_pointer: u64 = if image.is_64_bit() {
        data.pread_with::<u64>(offset, LE).ok()?
    } else {
        data.pread_with::<u32>(offset, LE).ok()? as u64
    };

    if let Some(file_offset) = image.file_offset(raw_pointer) {
        return Some(file_offset as i64);
    }
    if (raw_pointer as usize) < data.len() {
        return Some(raw_pointer as i64);
    }
    None
}

/// Best-effort Objective-C class name lookup. The Objective-C metadata processor is out of scope
/// (§1); this reads only as far as a plain C-string name when one is reachable through the same
/// pointer/relative-pointer shapes the resolver already knows, and gives up otherwise.
fn read_objc_class_name<'d>(image: &dyn BinaryImage<'d>, kind: TypeReferenceKind, target: i64) -> Option<String> {
    let data = image.data();

    let direct_offset = match kind {
        TypeReferenceKind::DirectObjCClass => Some(target),
        TypeReferenceKind::IndirectObjCClass => read_indirect_pointer(image, target),
        _ => None,
    }?;
    let offset = checked_offset(direct_offset, data.len())?;

    if let Ok(ptr) = data.pread_with::<u64>(offset, LE) {
        if let Some(file_offset) = image.file_offset(ptr) {
            if let Some(string_offset) = checked_offset(file_offset as i64, data.len()) {
                if let Ok(name) = swift_reflect_common::read_cstr_at(data, string_offset) {
                    return Some(name.to_string());
                }
            }
        }
    }

    if let Ok(Some(string_target)) = read_rel32(data, offset) {
        if let Some(string_offset) = checked_offset(string_target, data.len()) {
            if let Ok(name) = swift_reflect_common::read_cstr_at(data, string_offset) {
                return Some(name.to_string());
            }
        }
    }

    None
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

    fn put_rel32(buf: &mut Vec<u8>, field_offset: usize, target: usize) {
        buf.resize(buf.len().max(field_offset + 4), 0);
        let rel = target as i64 - field_offset as i64;
        buf[field_offset..field_offset + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }

    fn write_descriptor(buf: &mut Vec<u8>, offset: usize, name: &str) {
        buf.resize(buf.len().max(offset + 12), 0);
        buf[offset..offset + 4].copy_from_slice(&17u32.to_le_bytes()); // kind=struct
        let name_field = offset + 8;
        let name_offset = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        put_rel32(buf, name_field, name_offset);
    }

    #[test]
    fn decodes_a_direct_conformance_record() {
        let mut buf = vec![0u8; 0x100];
        write_descriptor(&mut buf, 0x10, "Hashable"); // protocol descriptor
        write_descriptor(&mut buf, 0x40, "Widget"); // conforming type descriptor

        let record_offset = buf.len();
        buf.resize(record_offset + RECORD_LEN, 0);
        put_rel32(&mut buf, record_offset, 0x10);
        put_rel32(&mut buf, record_offset + 4, 0x40);
        // witnessTablePattern left absent/zero.
        buf[record_offset + 12..record_offset + 16].copy_from_slice(&(1u32 << 3).to_le_bytes()); // isRetroactive

        let image = FakeImage { data: &buf };
        let decoded = decode_conformance_section(&image, record_offset, record_offset + RECORD_LEN);

        assert_eq!(decoded.len(), 1);
        let c = &decoded[0];
        assert_eq!(c.protocol_name, "Hashable");
        assert_eq!(c.type_name, "Widget");
        assert_eq!(c.conforming_type_offset, Some(0x40));
        assert!(c.flags.is_retroactive());
        assert_eq!(c.flags.type_reference_kind(), TypeReferenceKind::DirectTypeDescriptor);
    }

    #[test]
    fn empty_record_is_dropped() {
        let buf = vec![0u8; RECORD_LEN];
        let image = FakeImage { data: &buf };
        let decoded = decode_conformance_section(&image, 0, RECORD_LEN);
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_trailing_record_is_skipped() {
        let buf = vec![0u8; RECORD_LEN + 4];
        let image = FakeImage { data: &buf };
        let decoded = decode_conformance_section(&image, 0, buf.len());
        assert!(decoded.is_empty());
    }
}

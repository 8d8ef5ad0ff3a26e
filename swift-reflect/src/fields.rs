//! Decodes the `__swift5_fieldmd` section (§4.3's field-descriptor table).
//!
//! Unlike the type/protocol sections (dense arrays of 4-byte relative pointers), field
//! descriptors are variable-length: each 16-byte header is immediately followed by
//! `numFields * fieldRecordSize` bytes of field records, and the next descriptor starts right
//! after. The section is walked sequentially rather than indexed.

use swift_reflect_common::{read_rel32, read_u16, read_u32, BinaryImage};
use swift_reflect_resolver::Resolver;

use crate::mangled::read_mangled_name;
use crate::model::{Field, FieldDescriptor, FieldDescriptorKind};
use crate::util::{checked_offset, resolve_name_at};

/// Minimal safe stride to advance by when a descriptor header can't be read at all, so a run of
/// corrupt bytes doesn't stall the walk (§7).
const MIN_HEADER_STRIDE: usize = 16;

/// A decoded field descriptor, plus the file offset its `mangledTypeName` marker points at, when
/// that marker is a direct-context symbolic reference — the link the decoder uses to attach
/// fields back onto the [`crate::Type`] the descriptor describes.
pub struct DecodedFieldDescriptor {
    /// The decoded record.
    pub descriptor: FieldDescriptor,
    /// File offset of the owning type's context descriptor, if the descriptor's mangled-name
    /// field leads with a direct-context symbolic reference (0x01) pointing at one.
    pub owner_offset: Option<i64>,
}

/// Walks every field-descriptor record in `[start, end)`, skipping corrupt records by advancing
/// a minimal safe stride rather than aborting the whole section (§7).
pub fn decode_field_descriptors<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    start: usize,
    end: usize,
) -> Vec<DecodedFieldDescriptor> {
    let data = image.data();
    let mut offset = start;
    let mut out = Vec::new();

    while offset + MIN_HEADER_STRIDE <= end {
        match decode_one(image, resolver, offset) {
            Some((decoded, record_len)) => {
                offset += record_len.max(MIN_HEADER_STRIDE);
                out.push(decoded);
            }
            None => offset += MIN_HEADER_STRIDE,
        }
    }

    out
}

fn decode_one<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: usize,
) -> Option<(DecodedFieldDescriptor, usize)> {
    let data = image.data();

    let mangled_type_rel = read_rel32(data, offset).ok()?;
    let superclass_rel = read_rel32(data, offset + 4).ok()?;
    let kind_bits = read_u16(data, offset + 8).ok()?;
    let field_record_size = read_u16(data, offset + 10).ok()? as usize;
    let num_fields = read_u32(data, offset + 12).ok()? as usize;

    if field_record_size < 12 {
        return None;
    }
    let body_len = num_fields.checked_mul(field_record_size)?;
    let record_len = MIN_HEADER_STRIDE.checked_add(body_len)?;
    if offset.checked_add(record_len)? > data.len() {
        return None;
    }

    let owner_offset = mangled_type_rel.and_then(|target| {
        let target_offset = checked_offset(target, data.len())?;
        matches!(data.get(target_offset), Some(0x01)).then_some(target)
    });

    let mangled_type_name_raw = mangled_type_rel
        .and_then(|target| checked_offset(target, data.len()))
        .map(|o| read_mangled_name(data, o).to_vec())
        .unwrap_or_default();
    let mangled_type_name = mangled_type_rel
        .map(|target| resolve_name_at(image, resolver, target))
        .unwrap_or_default();
    let superclass_name = superclass_rel.map(|target| resolve_name_at(image, resolver, target));

    let fields = decode_field_records(
        image,
        resolver,
        offset + MIN_HEADER_STRIDE,
        num_fields,
        field_record_size,
    );

    let descriptor = FieldDescriptor {
        offset: offset as i64,
        kind: FieldDescriptorKind::from_bits(kind_bits),
        mangled_type_name,
        mangled_type_name_raw,
        superclass_name,
        fields,
    };

    Some((DecodedFieldDescriptor { descriptor, owner_offset }, record_len))
}

/// Decodes `count` field records of `stride` bytes each, starting at `offset`. Each record is
/// `flags:u32 | mangledTypeName:rel32 | fieldName:rel32`; bit 0 of `flags` is `isIndirect`, bit 1
/// is `isVar`. Corrupt trailing records are dropped, not fatal to the descriptor as a whole.
fn decode_field_records<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: usize,
    count: usize,
    stride: usize,
) -> Vec<Field> {
    let data = image.data();
    let mut fields = Vec::with_capacity(count);

    for i in 0..count {
        let record_offset = offset + i * stride;
        let Ok(flags) = read_u32(data, record_offset) else {
            break;
        };
        let Ok(mangled_type_rel) = read_rel32(data, record_offset + 4) else {
            break;
        };
        let Ok(field_name_rel) = read_rel32(data, record_offset + 8) else {
            break;
        };

        let name = field_name_rel
            .and_then(|target| checked_offset(target, data.len()))
            .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
            .unwrap_or("")
            .to_string();

        let mangled_type = mangled_type_rel
            .and_then(|target| checked_offset(target, data.len()))
            .map(|o| read_mangled_name(data, o).to_vec())
            .unwrap_or_default();
        let mangled_type_offset = mangled_type_rel.unwrap_or(0);
        let type_name = mangled_type_rel
            .map(|target| resolve_name_at(image, resolver, target))
            .unwrap_or_default();

        fields.push(Field {
            name,
            mangled_type,
            mangled_type_offset,
            type_name,
            is_var: flags & (1 << 1) != 0,
            is_indirect: flags & 1 != 0,
        });
    }

    fields
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

    #[test]
    fn decodes_a_single_struct_descriptor_with_two_fields() {
        let mut buf = vec![0u8; 16];
        // header: mangledTypeName=0 (absent), superclass=0, kind=0 (struct), fieldRecordSize=12, numFields=2
        buf[8..10].copy_from_slice(&0u16.to_le_bytes());
        buf[10..12].copy_from_slice(&12u16.to_le_bytes());
        buf[12..16].copy_from_slice(&2u32.to_le_bytes());

        // field 0 at offset 16: flags=0 (let, direct), mangledTypeName=absent, fieldName -> "a"
        buf.resize(16 + 24, 0);
        let name_a_offset = buf.len();
        buf.extend_from_slice(b"a\0");
        put_rel32(&mut buf, 16 + 8, name_a_offset);

        // field 1 at offset 28: flags=2 (var), fieldName -> "b"
        buf[28..32].copy_from_slice(&2u32.to_le_bytes());
        let name_b_offset = buf.len();
        buf.extend_from_slice(b"b\0");
        put_rel32(&mut buf, 28 + 8, name_b_offset);

        let image = FakeImage { data: &buf };
        let mut resolver = Resolver::new(&image);
        let decoded = decode_field_descriptors(&image, &mut resolver, 0, buf.len());

        assert_eq!(decoded.len(), 1);
        let d = &decoded[0].descriptor;
        assert_eq!(d.kind, FieldDescriptorKind::Struct);
        assert_eq!(d.fields.len(), 2);
        assert_eq!(d.fields[0].name, "a");
        assert!(!d.fields[0].is_var);
        assert_eq!(d.fields[1].name, "b");
        assert!(d.fields[1].is_var);
    }

    #[test]
    fn corrupt_header_is_skipped_by_minimal_stride() {
        let buf = vec![0xFFu8; 32];
        let image = FakeImage { data: &buf };
        let mut resolver = Resolver::new(&image);
        // field_record_size reads as 0xFFFF, numFields huge -> rejected as corrupt each time.
        let decoded = decode_field_descriptors(&image, &mut resolver, 0, buf.len());
        assert!(decoded.is_empty());
    }
}

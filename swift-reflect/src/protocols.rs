//! Decodes the `__swift5_protos` section: a dense array of relative pointers to protocol
//! descriptors (§4.3).

use swift_reflect_common::{read_rel32, read_u32, BinaryImage};
use swift_reflect_resolver::Resolver;

use crate::model::{Protocol, Requirement, RequirementKind};
use crate::types::describe_context_chain;
use crate::util::checked_offset;

const HEADER_LEN: usize = 28;
/// When `numRequirements` reads back implausibly large, the decoder assumes the alternate
/// (older) layout and retries two fields over (§4.3, §9 open question).
const IMPLAUSIBLE_REQUIREMENT_COUNT: u32 = 1000;
const LAYOUT_SHIFT: usize = 8;

/// Reads the dense `rel32` array at `[start, end)` and decodes every protocol descriptor it
/// points at. Corrupt entries are skipped.
pub fn decode_protocol_section<'d>(
    image: &dyn BinaryImage<'d>,
    start: usize,
    end: usize,
) -> Vec<Protocol> {
    let data = image.data();
    let mut out = Vec::new();
    let mut entry_offset = start;

    while entry_offset + 4 <= end {
        if let Ok(Some(target)) = read_rel32(data, entry_offset) {
            if let Some(protocol) = decode_one(image, target) {
                out.push(protocol);
            }
        }
        entry_offset += 4;
    }

    out
}

fn read_cstr_name<'d>(image: &dyn BinaryImage<'d>, target: Option<i64>) -> String {
    let data = image.data();
    target
        .and_then(|t| checked_offset(t, data.len()))
        .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
        .unwrap_or("")
        .to_string()
}

fn decode_one<'d>(image: &dyn BinaryImage<'d>, offset: i64) -> Option<Protocol> {
    let data = image.data();
    let field_offset = checked_offset(offset, data.len())?;

    let _flags = read_u32(data, field_offset).ok()?;
    let parent = read_rel32(data, field_offset + 4).ok().flatten();
    let name = read_rel32(data, field_offset + 8).ok().flatten();

    let mut num_requirements = read_u32(data, field_offset + 16).ok()?;
    let mut requirements_field = field_offset + 20;
    let mut assoc_types_field = field_offset + 24;

    if num_requirements > IMPLAUSIBLE_REQUIREMENT_COUNT {
        num_requirements = read_u32(data, field_offset + 16 + LAYOUT_SHIFT).ok()?;
        requirements_field += LAYOUT_SHIFT;
        assoc_types_field += LAYOUT_SHIFT;
    }

    let requirements_target = read_rel32(data, requirements_field).ok().flatten();
    let assoc_types_target = read_rel32(data, assoc_types_field).ok().flatten();

    let associated_type_names: Vec<String> = assoc_types_target
        .and_then(|t| checked_offset(t, data.len()))
        .and_then(|o| swift_reflect_common::read_cstr_at(data, o).ok())
        .map(|s| s.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    let mut inherited_protocol_names = Vec::new();
    let mut assoc_type_cursor = 0usize;

    let mut requirements = Vec::new();
    if let Some(req_target) = requirements_target {
        if let Some(req_offset) = checked_offset(req_target, data.len()) {
            for i in 0..num_requirements as usize {
                let record_offset = req_offset + i * 8;
                let Ok(req_flags) = read_u32(data, record_offset) else {
                    break;
                };
                let kind = RequirementKind::from_bits(req_flags);
                let default_impl = read_rel32(data, record_offset + 4).ok().flatten();

                let mut requirement_name = String::new();
                let mut has_default_implementation = default_impl.is_some();

                match kind {
                    RequirementKind::BaseProtocol => {
                        has_default_implementation = false;
                        if let Some(inherited_offset) = default_impl {
                            inherited_protocol_names
                                .push(describe_context_chain(image, inherited_offset));
                        }
                    }
                    RequirementKind::AssociatedTypeAccessFunction => {
                        if let Some(n) = associated_type_names.get(assoc_type_cursor) {
                            requirement_name = n.clone();
                        }
                        assoc_type_cursor += 1;
                    }
                    _ => {}
                }

                requirements.push(Requirement {
                    kind,
                    name: requirement_name,
                    is_instance: req_flags & (1 << 4) != 0,
                    is_async: req_flags & (1 << 5) != 0,
                    has_default_implementation,
                });
            }
        }
    }

    Some(Protocol {
        offset,
        name: read_cstr_name(image, name),
        parent_name: parent.map(|t| describe_context_chain(image, t)).unwrap_or_default(),
        associated_type_names,
        inherited_protocol_names,
        requirements,
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

    fn put_rel32(buf: &mut Vec<u8>, field_offset: usize, target: usize) {
        buf.resize(buf.len().max(field_offset + 4), 0);
        let rel = target as i64 - field_offset as i64;
        buf[field_offset..field_offset + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }

    #[test]
    fn decodes_a_protocol_with_one_method_requirement() {
        let mut buf = vec![0u8; HEADER_LEN];
        let name_offset = buf.len();
        buf.extend_from_slice(b"Flyable\0");
        put_rel32(&mut buf, 8, name_offset);

        buf[16..20].copy_from_slice(&1u32.to_le_bytes()); // numRequirements

        let requirements_offset = buf.len();
        put_rel32(&mut buf, 20, requirements_offset);
        // one method requirement: kind=1 (method), isInstance bit set, no default impl
        buf.extend_from_slice(&(1u32 | (1 << 4)).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());

        let image = FakeImage { data: &buf };
        let protocol = decode_one(&image, 0).unwrap();

        assert_eq!(protocol.name, "Flyable");
        assert_eq!(protocol.requirements.len(), 1);
        assert_eq!(protocol.requirements[0].kind, RequirementKind::Method);
        assert!(protocol.requirements[0].is_instance);
        assert!(!protocol.requirements[0].has_default_implementation);
    }
}

//! The top-level orchestration entry point (§4.3, §8).
//!
//! `Decoder::decode` walks the four `__swift5_*` sections in a fixed order — field descriptors,
//! types, protocols, conformances — because later sections lean on indices the earlier ones
//! build: types need field descriptors to attach their stored properties, and extensions need the
//! conformance list to report what they add.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use swift_reflect_common::BinaryImage;
use swift_reflect_resolver::Resolver;

use crate::conformances::decode_conformance_section;
use crate::error::DecodeError;
use crate::fields::decode_field_descriptors;
use crate::model::Metadata;
use crate::protocols::decode_protocol_section;
use crate::types::{decode_type_section, DecodedContext};

const SECTION_NAMES: [&str; 4] = [
    "__swift5_fieldmd",
    "__swift5_types",
    "__swift5_protos",
    "__swift5_proto",
];

/// Walks a [`BinaryImage`]'s Swift reflection sections and assembles a [`Metadata`] value.
///
/// Holds no state of its own between calls — every run starts from a fresh [`Resolver`], so
/// repeated calls against the same image are independent and produce identical results.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    /// Decodes every recognized reflection section of `image` into a [`Metadata`] value.
    ///
    /// A section that's absent from the image contributes nothing and is not an error (§4.3); a
    /// section whose declared extent doesn't fit inside the image's data buffer is the one case
    /// this returns [`DecodeError`] for — everything else (truncated records, dangling pointers,
    /// implausible counts) is corruption the section decoders skip over internally (§7).
    pub fn decode<'d>(image: &dyn BinaryImage<'d>) -> Result<Metadata, DecodeError> {
        let mut resolver = Resolver::new(image);

        let field_mds = section_bounds(image, "__swift5_fieldmd")?;
        let types_bounds = section_bounds(image, "__swift5_types")?;
        let protos_bounds = section_bounds(image, "__swift5_protos")?;
        let proto_bounds = section_bounds(image, "__swift5_proto")?;

        let decoded_fields = match field_mds {
            Some((start, end)) => decode_field_descriptors(image, &mut resolver, start, end),
            None => Vec::new(),
        };
        debug!(count = decoded_fields.len(), "decoded field descriptors");

        let mut field_descriptors = Vec::with_capacity(decoded_fields.len());
        let mut field_descriptors_by_offset = HashMap::new();
        let mut field_descriptors_by_owner = HashMap::new();
        for decoded in decoded_fields {
            let index = field_descriptors.len();
            field_descriptors_by_offset.insert(decoded.descriptor.offset, index);
            if let Some(owner_offset) = decoded.owner_offset {
                field_descriptors_by_owner.entry(owner_offset).or_insert(index);
            }
            field_descriptors.push(decoded.descriptor);
        }

        let decoded_contexts = match types_bounds {
            Some((start, end)) => decode_type_section(
                image,
                &mut resolver,
                start,
                end,
                &field_descriptors_by_offset,
                &field_descriptors_by_owner,
                &field_descriptors,
            ),
            None => Vec::new(),
        };

        let mut types = Vec::new();
        let mut extensions = Vec::new();
        for context in decoded_contexts {
            match context {
                DecodedContext::Type(t) => types.push(t),
                DecodedContext::Extension(e) => extensions.push(e),
            }
        }
        debug!(types = types.len(), extensions = extensions.len(), "decoded type contexts");

        let protocols = match protos_bounds {
            Some((start, end)) => decode_protocol_section(image, start, end),
            None => Vec::new(),
        };
        debug!(count = protocols.len(), "decoded protocols");

        let conformances = match proto_bounds {
            Some((start, end)) => decode_conformance_section(image, start, end),
            None => Vec::new(),
        };
        debug!(count = conformances.len(), "decoded conformances");

        Ok(assemble(types, protocols, conformances, field_descriptors, extensions))
    }
}

/// Resolves a section's declared extent into a `[start, end)` file-offset range, or `None` when
/// the image simply doesn't carry that section.
fn section_bounds<'d>(
    image: &dyn BinaryImage<'d>,
    name: &str,
) -> Result<Option<(usize, usize)>, DecodeError> {
    let Some(section) = image.section(name) else {
        return Ok(None);
    };

    let start = section.file_offset;
    let end = start.checked_add(section.size).unwrap_or(u64::MAX);
    let data_len = image.data().len();

    if end > data_len as u64 {
        return Err(DecodeError::SectionOutOfBounds {
            section: name.to_string(),
            file_offset: start,
            end,
            data_len,
        });
    }

    Ok(Some((start as usize, end as usize)))
}

/// Builds the final [`Metadata`], including every first-wins index and the name-based
/// extension-conformance cross-reference (§4.3, §8).
fn assemble(
    types: Vec<crate::model::Type>,
    protocols: Vec<crate::model::Protocol>,
    conformances: Vec<crate::model::Conformance>,
    field_descriptors: Vec<crate::model::FieldDescriptor>,
    mut extensions: Vec<crate::model::Extension>,
) -> Metadata {
    let mut types_by_name = IndexMap::new();
    let mut types_by_full_name = IndexMap::new();
    let mut types_by_offset = IndexMap::new();
    for (i, t) in types.iter().enumerate() {
        types_by_name.entry(t.name.clone()).or_insert(i);
        let full_name = if t.parent_name.is_empty() {
            t.name.clone()
        } else {
            format!("{}.{}", t.parent_name, t.name)
        };
        types_by_full_name.entry(full_name).or_insert(i);
        types_by_offset.entry(t.offset).or_insert(i);
    }

    let mut conformances_by_type_name: IndexMap<String, Vec<usize>> = IndexMap::new();
    let mut conformances_by_protocol_name: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, c) in conformances.iter().enumerate() {
        if !c.type_name.is_empty() {
            conformances_by_type_name.entry(c.type_name.clone()).or_default().push(i);
        }
        if !c.protocol_name.is_empty() {
            conformances_by_protocol_name.entry(c.protocol_name.clone()).or_default().push(i);
        }
    }

    // Conformance records always reference a nominal type's own context descriptor, never a
    // declaring extension's — there is no ABI field that names "the extension that added this
    // conformance". Cross-referencing by the extended type's rendered name is the only
    // correspondence that exists in the binary, so that's what stands in for §4.3's
    // offset-matching description.
    for extension in &mut extensions {
        if let Some(indices) = conformances_by_type_name.get(&extension.extended_type_name) {
            extension.added_conformances =
                indices.iter().map(|&i| conformances[i].protocol_name.clone()).collect();
        }
    }

    let mut extensions_by_type_name: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, e) in extensions.iter().enumerate() {
        if !e.extended_type_name.is_empty() {
            extensions_by_type_name.entry(e.extended_type_name.clone()).or_default().push(i);
        }
    }

    Metadata {
        types,
        protocols,
        conformances,
        field_descriptors,
        extensions,
        types_by_name,
        types_by_full_name,
        types_by_offset,
        conformances_by_type_name,
        conformances_by_protocol_name,
        extensions_by_type_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_reflect_common::{ChainedFixups, Section, Segment};

    struct FakeImage<'d> {
        data: &'d [u8],
        sections: Vec<Segment>,
    }

    impl<'d> BinaryImage<'d> for FakeImage<'d> {
        fn data(&self) -> &'d [u8] {
            self.data
        }
        fn segments(&self) -> &[Segment] {
            &self.sections
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

    fn image_with_no_sections(data: &[u8]) -> FakeImage<'_> {
        FakeImage { data, sections: Vec::new() }
    }

    #[test]
    fn decoding_an_image_with_no_reflection_sections_yields_empty_metadata() {
        let data = vec![0u8; 16];
        let image = image_with_no_sections(&data);
        let metadata = Decoder::decode(&image).unwrap();

        assert!(metadata.types.is_empty());
        assert!(metadata.protocols.is_empty());
        assert!(metadata.conformances.is_empty());
        assert!(metadata.extensions.is_empty());
        assert!(metadata.field_descriptors.is_empty());
    }

    #[test]
    fn out_of_bounds_section_is_a_hard_error() {
        let data = vec![0u8; 16];
        let segment = Segment {
            name: "__TEXT".into(),
            vmaddr: 0,
            vmsize: 0,
            file_offset: 0,
            file_size: 0,
            sections: vec![Section {
                segment_name: "__TEXT".into(),
                section_name: "__swift5_types".into(),
                file_offset: 8,
                size: 100,
            }],
        };
        let image = FakeImage { data: &data, sections: vec![segment] };

        let err = Decoder::decode(&image).unwrap_err();
        match err {
            DecodeError::SectionOutOfBounds { section, .. } => assert_eq!(section, "__swift5_types"),
        }
    }

    #[test]
    fn extension_conformances_cross_reference_by_extended_type_name() {
        let mut metadata = Metadata::default();
        metadata.conformances.push(crate::model::Conformance {
            offset: 0,
            conforming_type_offset: None,
            type_name: "Widget".to_string(),
            mangled_type_name: String::new(),
            protocol_name: "Hashable".to_string(),
            protocol_offset: None,
            raw_flags: 0,
            flags: crate::flags::ConformanceFlags::new(0),
        });
        let mut conformances_by_type_name = IndexMap::new();
        conformances_by_type_name.insert("Widget".to_string(), vec![0usize]);
        metadata.conformances_by_type_name = conformances_by_type_name;

        let mut extensions = vec![crate::model::Extension {
            offset: 0,
            extended_type_name: "Widget".to_string(),
            extended_type_mangled_name: String::new(),
            module_name: None,
            added_conformances: Vec::new(),
            generic_parameters: Vec::new(),
            generic_param_count: 0,
            generic_requirements: Vec::new(),
            raw_flags: 0,
        }];

        for extension in &mut extensions {
            if let Some(indices) = metadata.conformances_by_type_name.get(&extension.extended_type_name) {
                extension.added_conformances =
                    indices.iter().map(|&i| metadata.conformances[i].protocol_name.clone()).collect();
            }
        }

        assert_eq!(extensions[0].added_conformances, vec!["Hashable".to_string()]);
    }
}

//! Parses a `GenericContextDescriptorHeader` and the generic requirement records that follow it
//! (§4.3). Shared between nominal-type and extension context descriptors, which place an
//! identically-shaped generic context at different base offsets.

use swift_reflect_common::{read_u16, read_u32, read_rel32, BinaryImage};
use swift_reflect_resolver::Resolver;

use crate::model::{GenericRequirement, GenericRequirementKind};
use crate::util::{generic_param_name, resolve_name_at};

/// The 8-byte header preceding a generic context's requirement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericHeaderCounts {
    /// Declared number of generic parameters.
    pub num_params: u16,
    /// Declared number of generic requirements.
    pub num_requirements: u16,
    /// Number of generic arguments carried as key arguments in the metadata instantiation
    /// pattern. Not otherwise interpreted by this crate.
    pub num_key_arguments: u16,
    /// Number of additional (non-key) generic arguments. Not otherwise interpreted by this
    /// crate.
    pub num_extra_arguments: u16,
}

/// Reads a `GenericContextDescriptorHeader` at `offset`, applying the corruption gate from
/// §4.3 ("Generic header gates"): `numParams > 16` or `numRequirements > 32` is rejected as
/// corrupt.
pub fn read_generic_header(data: &[u8], offset: usize) -> Option<GenericHeaderCounts> {
    let num_params = read_u16(data, offset).ok()?;
    let num_requirements = read_u16(data, offset + 2).ok()?;
    let num_key_arguments = read_u16(data, offset + 4).ok()?;
    let num_extra_arguments = read_u16(data, offset + 6).ok()?;

    if num_params > 16 || num_requirements > 32 {
        return None;
    }

    Some(GenericHeaderCounts {
        num_params,
        num_requirements,
        num_key_arguments,
        num_extra_arguments,
    })
}

/// Renders the conventional `T, U, V, W, T0, T1, ...` placeholder names for `num_params`
/// generic parameters.
pub fn generic_parameter_names(num_params: u16) -> Vec<String> {
    (0..num_params as usize).map(generic_param_name).collect()
}

/// Decodes `count` 12-byte generic requirement records (`flags:u32 | param:rel32 |
/// constraint:rel32`) starting at `offset`. Stops at the first record that doesn't fit in
/// bounds, returning whatever was decoded so far (§7: skip corrupt data, never abort the whole
/// traversal).
pub fn decode_generic_requirements<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    offset: usize,
    count: u16,
) -> Vec<GenericRequirement> {
    let data = image.data();
    let mut requirements = Vec::with_capacity(count as usize);

    for i in 0..count as usize {
        let record_offset = offset + i * 12;
        let Ok(flags) = read_u32(data, record_offset) else {
            break;
        };
        let kind = GenericRequirementKind::from_bits(flags);

        let param = match read_rel32(data, record_offset + 4) {
            Ok(Some(target)) => resolve_name_at(image, resolver, target),
            _ => String::new(),
        };

        let constraint = match read_rel32(data, record_offset + 8) {
            Ok(Some(target)) => resolve_name_at(image, resolver, target),
            Ok(None) if matches!(kind, GenericRequirementKind::Layout) => "AnyObject".to_string(),
            _ => String::new(),
        };

        requirements.push(GenericRequirement {
            kind,
            param,
            constraint,
            raw_flags: flags,
        });
    }

    requirements
}

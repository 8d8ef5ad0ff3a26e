//! Small helpers shared across the section decoders.

use swift_reflect_common::{BinaryImage, Diagnostic};
use swift_reflect_resolver::Resolver;

use crate::mangled::read_mangled_name;

/// Translates a non-negative, in-bounds `i64` offset into a `usize`, or `None` otherwise.
pub fn checked_offset(offset: i64, len: usize) -> Option<usize> {
    if offset < 0 {
        return None;
    }
    let offset = offset as usize;
    (offset < len).then_some(offset)
}

/// Resolves the mangled name starting at file offset `target` into a rendered string, via the
/// resolver. Used for every rel32 field across the section decoders that points at a mangled
/// name rather than at a nested record.
pub fn resolve_name_at<'d>(
    image: &dyn BinaryImage<'d>,
    resolver: &mut Resolver<'_, 'd>,
    target: i64,
) -> String {
    let data = image.data();
    match checked_offset(target, data.len()) {
        Some(offset) => {
            let bytes = read_mangled_name(data, offset);
            resolver.resolve(bytes, target)
        }
        None => Diagnostic::InvalidOffset(target).to_string(),
    }
}

/// Renders the `n`th (zero-based) generic parameter using Swift's conventional placeholder
/// names: `T`, `U`, `V`, `W` for the first four, then `T0`, `T1`, ... (§3, §4.3).
pub fn generic_param_name(n: usize) -> String {
    match n {
        0 => "T".to_string(),
        1 => "U".to_string(),
        2 => "V".to_string(),
        3 => "W".to_string(),
        _ => format!("T{}", n - 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_param_name_follows_t_u_v_w_then_indexed() {
        assert_eq!(generic_param_name(0), "T");
        assert_eq!(generic_param_name(3), "W");
        assert_eq!(generic_param_name(4), "T0");
        assert_eq!(generic_param_name(5), "T1");
    }

    #[test]
    fn checked_offset_rejects_negative_and_out_of_range() {
        assert_eq!(checked_offset(-1, 10), None);
        assert_eq!(checked_offset(10, 10), None);
        assert_eq!(checked_offset(9, 10), Some(9));
    }
}

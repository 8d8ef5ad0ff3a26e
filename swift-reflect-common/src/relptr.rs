//! Reading primitives shared by the resolver and decoder.
//!
//! All relative pointers in the `__swift5_*` sections are 32-bit signed, little-endian; the
//! target of a relative pointer is `(the pointer field's own file offset) + (the signed value)`.
//! A value of `0` means "absent" (§6).

use scroll::ctx::{StrCtx, NULL};
use scroll::{Pread, LE};

use crate::error::CommonError;

/// The recursion cap applied throughout the resolver and demangler for generic-argument and
/// container-type nesting (§4.1, §4.2).
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Reads a 32-bit relative pointer at `field_offset` and resolves it to an absolute target
/// offset, or `None` if the stored value is zero ("absent").
pub fn read_rel32(data: &[u8], field_offset: usize) -> Result<Option<i64>, CommonError> {
    let raw: i32 = data.pread_with(field_offset, LE)?;
    if raw == 0 {
        Ok(None)
    } else {
        Ok(Some(field_offset as i64 + raw as i64))
    }
}

/// Reads a null-terminated UTF-8 string starting at `offset`.
pub fn read_cstr_at(data: &[u8], offset: usize) -> Result<&str, CommonError> {
    let s: &str = data.pread_with(offset, StrCtx::Delimiter(NULL))?;
    Ok(s)
}

/// Reads a little-endian `u32` at `offset`, bounds-checked via `scroll`.
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, CommonError> {
    Ok(data.pread_with(offset, LE)?)
}

/// Reads a little-endian `u16` at `offset`, bounds-checked via `scroll`.
pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, CommonError> {
    Ok(data.pread_with(offset, LE)?)
}

/// Reads a little-endian `i32` at `offset`, bounds-checked via `scroll`.
pub fn read_i32(data: &[u8], offset: usize) -> Result<i32, CommonError> {
    Ok(data.pread_with(offset, LE)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_relative_pointer_is_absent() {
        let data = [0u8, 0, 0, 0];
        assert_eq!(read_rel32(&data, 0).unwrap(), None);
    }

    #[test]
    fn relative_pointer_targets_field_offset_plus_value() {
        // field at offset 4, value = 0x10 -> target = 4 + 16 = 20
        let mut data = vec![0u8; 8];
        data[4..8].copy_from_slice(&16i32.to_le_bytes());
        assert_eq!(read_rel32(&data, 4).unwrap(), Some(20));
    }

    #[test]
    fn negative_relative_pointer_is_supported() {
        let mut data = vec![0u8; 8];
        data[4..8].copy_from_slice(&(-4i32).to_le_bytes());
        assert_eq!(read_rel32(&data, 4).unwrap(), Some(0));
    }

    #[test]
    fn out_of_bounds_read_is_an_error() {
        let data = [0u8; 2];
        assert!(read_rel32(&data, 0).is_err());
    }
}

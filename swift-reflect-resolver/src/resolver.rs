//! The symbolic resolver (§4.2): dereferences the binary markers embedded in mangled byte
//! sequences into concrete, rendered type names.

use std::collections::HashMap;

use scroll::{Pread, LE};
use tracing::trace;

use swift_reflect_common::{
    read_cstr_at, read_i32, read_rel32, read_u32, BinaryImage, Diagnostic, FixupResult,
    MAX_RECURSION_DEPTH,
};

use crate::marker::{is_symbolic_marker, MarkerKind};

/// Translates a non-negative, in-bounds `i64` offset into a `usize`, or `None` otherwise.
fn checked_offset(offset: i64, len: usize) -> Option<usize> {
    if offset < 0 {
        return None;
    }
    let offset = offset as usize;
    (offset < len).then_some(offset)
}

/// Dereferences symbolic references inside mangled byte sequences into rendered type names.
///
/// Holds the binary image by reference and two offset-keyed memoization caches (§4.2's
/// "resolved-type-by-target-offset" and "resolved-module-by-descriptor-offset"). A `Resolver` is
/// confined to one decoding session: per §5, its caches are owned exclusively by this instance
/// and are never evicted, so a `Resolver` should be dropped along with the `Decoder` run that
/// created it rather than reused across binaries.
pub struct Resolver<'img, 'd> {
    image: &'img dyn BinaryImage<'d>,
    type_cache: HashMap<i64, String>,
    context_cache: HashMap<i64, String>,
}

impl<'img, 'd> Resolver<'img, 'd> {
    /// Creates a resolver over the given binary image.
    pub fn new(image: &'img dyn BinaryImage<'d>) -> Self {
        Resolver {
            image,
            type_cache: HashMap::new(),
            context_cache: HashMap::new(),
        }
    }

    /// Resolves a byte slice `m`, found at source offset `src`, into a rendered type name.
    ///
    /// Implements the resolution algorithm of §4.2: the container fast path is tried first, then
    /// (1) empty input renders empty, (2) a leading symbolic marker is decoded, (3) embedded
    /// markers elsewhere in `m` are resolved in place, (4) otherwise `m` is handed to the
    /// demangler as plain UTF-8. Never panics; bounds and decode failures become diagnostic
    /// placeholders spliced into the output.
    pub fn resolve(&mut self, bytes: &[u8], src_offset: i64) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        if let Some((rendered, _consumed)) = self.try_resolve_container(bytes, src_offset, 0) {
            return rendered;
        }
        if is_symbolic_marker(bytes[0]) {
            return self
                .resolve_marker(bytes, src_offset)
                .unwrap_or_else(|d| d.to_string());
        }
        if bytes[1..].iter().any(|&b| b == 0x01 || b == 0x02) {
            return self.resolve_embedded(bytes, src_offset);
        }
        swift_reflect_demangle::demangle(&String::from_utf8_lossy(bytes))
    }

    /// Decodes the 5-byte marker at the front of `bytes` (a 1-byte kind plus a 4-byte signed
    /// little-endian relative offset), dispatching on its kind and applying the generic-suffix
    /// pass to any bytes following it.
    fn resolve_marker(&mut self, bytes: &[u8], src_offset: i64) -> Result<String, Diagnostic> {
        if bytes.len() < 5 {
            return Err(Diagnostic::InvalidOffset(src_offset));
        }
        let marker = bytes[0];
        let rel = read_i32(bytes, 1).map_err(|_| Diagnostic::InvalidOffset(src_offset))?;
        let target = src_offset + 1 + rel as i64;

        if let Some(cached) = self.type_cache.get(&target) {
            return Ok(cached.clone());
        }

        let suffix = &bytes[5..];
        let suffix_offset = src_offset + 5;

        let rendered = match MarkerKind::classify(marker) {
            Some(MarkerKind::DirectContext) => {
                self.resolve_direct_context(target, suffix, suffix_offset)
            }
            Some(MarkerKind::IndirectContext) => {
                self.resolve_indirect_context(target, suffix, suffix_offset)
            }
            Some(MarkerKind::DirectObjCProtocol) => self.resolve_direct_objc_protocol(target),
            Some(MarkerKind::Unknown(m)) => Err(Diagnostic::UnknownMarker(m)),
            None => Err(Diagnostic::UnknownMarker(marker)),
        }?;

        self.type_cache.insert(target, rendered.clone());
        Ok(rendered)
    }

    /// `directContext`: parses a context descriptor at file offset `target` and composes its
    /// qualified name, then applies the generic-suffix pass to `suffix`.
    fn resolve_direct_context(
        &mut self,
        target: i64,
        suffix: &[u8],
        suffix_offset: i64,
    ) -> Result<String, Diagnostic> {
        let base = self.describe_context(target);
        let (decorated, _consumed) = self.apply_generic_suffix(&base, suffix, suffix_offset, 0);
        Ok(decorated)
    }

    /// `indirectContext`: reads a pointer at `target` and tries, in order, chained-fixup
    /// decoding, VM-address translation, a direct-file-offset interpretation, and (implicitly,
    /// via the image's declared pointer width) the 32-bit fallback; a null pointer with leftover
    /// suffix bytes falls through to demangling the suffix directly.
    fn resolve_indirect_context(
        &mut self,
        target: i64,
        suffix: &[u8],
        suffix_offset: i64,
    ) -> Result<String, Diagnostic> {
        let data = self.image.data();
        let offset = checked_offset(target, data.len()).ok_or(Diagnostic::InvalidOffset(target))?;

        let raw_pointer: u64 = if self.image.is_64_bit() {
            data.pread_with::<u64>(offset, LE)
                .map_err(|_| Diagnostic::InvalidOffset(target))?
        } else {
            data.pread_with::<u32>(offset, LE)
                .map_err(|_| Diagnostic::InvalidOffset(target))? as u64
        };

        if let Some(fixups) = self.image.chained_fixups() {
            match fixups.decode_pointer(raw_pointer) {
                FixupResult::Bind { ordinal, .. } => {
                    if let Some(symbol) = fixups.symbol_name(ordinal) {
                        return Ok(swift_reflect_demangle::demangle_swift_name(symbol).into_owned());
                    }
                }
                FixupResult::Rebase { target: rebased } => {
                    if let Some(file_offset) = self.image.file_offset(rebased) {
                        return self.resolve_direct_context(file_offset as i64, suffix, suffix_offset);
                    }
                }
                FixupResult::NotFixup => {}
            }
        }

        if let Some(file_offset) = self.image.file_offset(raw_pointer) {
            return self.resolve_direct_context(file_offset as i64, suffix, suffix_offset);
        }

        if (raw_pointer as usize) < data.len() {
            return self.resolve_direct_context(raw_pointer as i64, suffix, suffix_offset);
        }

        if raw_pointer == 0 && !suffix.is_empty() {
            return Ok(swift_reflect_demangle::demangle(&String::from_utf8_lossy(
                suffix,
            )));
        }

        trace!(target, "unresolved indirect symbolic reference");
        Err(Diagnostic::UnresolvedIndirect)
    }

    /// `directObjCProtocol`: reads a pointer to a C string, falling back to a relative pointer
    /// to a C string.
    fn resolve_direct_objc_protocol(&mut self, target: i64) -> Result<String, Diagnostic> {
        let data = self.image.data();
        let offset = checked_offset(target, data.len()).ok_or(Diagnostic::InvalidOffset(target))?;

        if let Ok(ptr) = data.pread_with::<u64>(offset, LE) {
            if let Some(file_offset) = self.image.file_offset(ptr) {
                if let Some(string_offset) = checked_offset(file_offset as i64, data.len()) {
                    if let Ok(name) = read_cstr_at(data, string_offset) {
                        return Ok(name.to_string());
                    }
                }
            }
        }

        if let Ok(Some(string_target)) = read_rel32(data, offset) {
            if let Some(string_offset) = checked_offset(string_target, data.len()) {
                if let Ok(name) = read_cstr_at(data, string_offset) {
                    return Ok(name.to_string());
                }
            }
        }

        Err(Diagnostic::UnresolvedIndirect)
    }

    /// Parses a context descriptor at `offset` (`flags:u32 | parent:rel32 | name:rel32`) and
    /// composes its fully-qualified name, memoized by descriptor offset.
    fn describe_context(&mut self, offset: i64) -> String {
        if let Some(cached) = self.context_cache.get(&offset) {
            return cached.clone();
        }
        let rendered = self.describe_context_uncached(offset);
        self.context_cache.insert(offset, rendered.clone());
        rendered
    }

    fn describe_context_uncached(&mut self, offset: i64) -> String {
        let data = self.image.data();
        let field_offset = match checked_offset(offset, data.len()) {
            Some(o) => o,
            None => return Diagnostic::InvalidOffset(offset).to_string(),
        };

        let flags = match read_u32(data, field_offset) {
            Ok(v) => v,
            Err(_) => return Diagnostic::InvalidOffset(offset).to_string(),
        };
        let kind = flags & 0x1F;

        let parent = read_rel32(data, field_offset + 4).ok().flatten();
        let name = read_rel32(data, field_offset + 8)
            .ok()
            .flatten()
            .and_then(|target| checked_offset(target, data.len()))
            .and_then(|o| read_cstr_at(data, o).ok())
            .unwrap_or("");

        // kind 0 is the module context; it has no parent to compose with.
        if kind == 0 {
            return name.to_string();
        }

        match parent {
            Some(parent_target) => {
                let parent_name = self.describe_context(parent_target);
                if parent_name.is_empty() || parent_name == "Swift" {
                    name.to_string()
                } else {
                    format!("{parent_name}.{name}")
                }
            }
            None => name.to_string(),
        }
    }

    /// Applies the generic-suffix pass (§4.2) to a resolved context name, given the bytes
    /// immediately following a 5-byte marker. Returns the decorated name and how many suffix
    /// bytes were consumed, so a caller parsing a type-argument list (the container fast path)
    /// knows where the next argument begins.
    ///
    /// Recognizes, recursively: a further embedded symbolic reference, an `y...G` generic-
    /// argument list (rendered `<...>`), and a trailing `Sg` (rendered `?`).
    fn apply_generic_suffix(
        &mut self,
        base: &str,
        suffix: &[u8],
        src_offset: i64,
        depth: usize,
    ) -> (String, usize) {
        if suffix.is_empty() || depth > MAX_RECURSION_DEPTH {
            return (base.to_string(), 0);
        }

        if suffix[0] == 0x01 || suffix[0] == 0x02 {
            if suffix.len() < 5 {
                return (base.to_string(), 0);
            }
            let resolved = self
                .resolve_marker(&suffix[0..5], src_offset)
                .unwrap_or_else(|d| d.to_string());
            let combined = format!("{base}{resolved}");
            let (decorated, trailing) =
                self.apply_generic_suffix(&combined, &suffix[5..], src_offset + 5, depth + 1);
            return (decorated, 5 + trailing);
        }

        if let Some(rest) = suffix.strip_prefix(b"y") {
            if let Some(g_pos) = rest.iter().position(|&b| b == b'G') {
                let middle = &rest[..g_pos];
                let args = swift_reflect_demangle::demangle_type_list(&String::from_utf8_lossy(middle));
                let decorated = if args.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}<{}>", args.join(", "))
                };
                let consumed = 1 + g_pos + 1;
                let (decorated, trailing) = self.apply_generic_suffix(
                    &decorated,
                    &suffix[consumed..],
                    src_offset + consumed as i64,
                    depth + 1,
                );
                return (decorated, consumed + trailing);
            }
        }

        if let Some(rest) = suffix.strip_prefix(b"Sg") {
            let decorated = format!("{base}?");
            let (decorated, trailing) =
                self.apply_generic_suffix(&decorated, rest, src_offset + 2, depth + 1);
            return (decorated, 2 + trailing);
        }

        (base.to_string(), 0)
    }

    /// The embedded-refs pass (§4.2): scans `bytes` left to right, dereferencing each inline
    /// symbolic marker it finds and passing literal ASCII text through unchanged, then hands the
    /// assembled string to the demangler.
    fn resolve_embedded(&mut self, bytes: &[u8], src_offset: i64) -> String {
        let mut assembled = String::new();
        let mut i = 0usize;

        while i < bytes.len() {
            let b = bytes[i];
            if (b == 0x01 || b == 0x02) && i + 5 <= bytes.len() {
                match self.resolve_marker(&bytes[i..i + 5], src_offset + i as i64) {
                    Ok(name) => assembled.push_str(&name),
                    Err(_) => assembled.push('?'),
                }
                i += 5;
                continue;
            }
            if b == 0x00 {
                let in_offset_window =
                    (1..=i.min(4)).any(|back| matches!(bytes[i - back], 0x01 | 0x02));
                if !in_offset_window {
                    break;
                }
                i += 1;
                continue;
            }
            if b.is_ascii_graphic() || b == b' ' {
                assembled.push(b as char);
            }
            i += 1;
        }

        swift_reflect_demangle::demangle(&assembled)
    }

    /// The container fast path (§4.2): recognizes `Say...G`/`SDy...G`/`Shy...G` at the front of
    /// `bytes` and resolves each type argument with the resolver (not the demangler) so embedded
    /// markers inside them are dereferenced too. Returns the rendered container and the number
    /// of bytes consumed, including a trailing `Sg`.
    fn try_resolve_container(
        &mut self,
        bytes: &[u8],
        src_offset: i64,
        depth: usize,
    ) -> Option<(String, usize)> {
        if depth > MAX_RECURSION_DEPTH {
            return None;
        }

        let (name, arity) = if bytes.starts_with(b"Say") {
            ("Array", 1usize)
        } else if bytes.starts_with(b"SDy") {
            ("Dictionary", 2usize)
        } else if bytes.starts_with(b"Shy") {
            ("Set", 1usize)
        } else {
            return None;
        };

        let mut consumed = 3;
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            let (arg, arg_len) =
                self.resolve_type_arg(&bytes[consumed..], src_offset + consumed as i64, depth + 1)?;
            args.push(arg);
            consumed += arg_len;
        }

        if bytes.get(consumed) != Some(&b'G') {
            return None;
        }
        consumed += 1;

        let rendered = match name {
            "Array" => format!("[{}]", args[0]),
            "Set" => format!("Set<{}>", args[0]),
            "Dictionary" => format!("[{}: {}]", args[0], args[1]),
            _ => unreachable!(),
        };

        if bytes[consumed..].starts_with(b"Sg") {
            consumed += 2;
            return Some((format!("{rendered}?"), consumed));
        }
        Some((rendered, consumed))
    }

    /// Resolves one type argument out of a byte cursor (used by the container fast path),
    /// returning the rendered type and how many bytes it consumed so the caller can continue
    /// parsing the next argument.
    fn resolve_type_arg(
        &mut self,
        cursor: &[u8],
        offset: i64,
        depth: usize,
    ) -> Option<(String, usize)> {
        if depth > MAX_RECURSION_DEPTH || cursor.is_empty() {
            return None;
        }

        if let Some(result) = self.try_resolve_container(cursor, offset, depth) {
            return Some(result);
        }

        if is_symbolic_marker(cursor[0]) {
            if cursor.len() < 5 {
                return None;
            }
            let base = self
                .resolve_marker(&cursor[0..5], offset)
                .unwrap_or_else(|d| d.to_string());
            let (decorated, suffix_len) =
                self.apply_generic_suffix(&base, &cursor[5..], offset + 5, depth);
            return Some((decorated, 5 + suffix_len));
        }

        let text = std::str::from_utf8(cursor).ok()?;
        swift_reflect_demangle::parse_one_type(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_reflect_common::{ChainedFixups, Segment};

    struct FakeImage<'d> {
        data: &'d [u8],
        segments: Vec<Segment>,
    }

    impl<'d> BinaryImage<'d> for FakeImage<'d> {
        fn data(&self) -> &'d [u8] {
            self.data
        }
        fn segments(&self) -> &[Segment] {
            &self.segments
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

    /// Builds a minimal module-kind context descriptor (`flags=0 (module) | parent=0 | name`)
    /// at `offset`, with `name` written immediately after the 12-byte header.
    fn write_module_descriptor(buf: &mut Vec<u8>, offset: usize, name: &str) {
        buf.resize(buf.len().max(offset + 12), 0);
        buf[offset..offset + 4].copy_from_slice(&0u32.to_le_bytes()); // flags: kind=module
        buf[offset + 4..offset + 8].copy_from_slice(&0i32.to_le_bytes()); // parent: absent
        let name_field = offset + 8;
        let name_offset = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        let rel = name_offset as i64 - name_field as i64;
        buf[name_field..name_field + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }

    /// Builds a nominal-type context descriptor (kind=17, struct) with a parent pointer to
    /// `parent_offset` and `name` written after the header.
    fn write_type_descriptor(buf: &mut Vec<u8>, offset: usize, parent_offset: usize, name: &str) {
        buf.resize(buf.len().max(offset + 12), 0);
        buf[offset..offset + 4].copy_from_slice(&17u32.to_le_bytes()); // kind=struct
        let parent_field = offset + 4;
        let parent_rel = parent_offset as i64 - parent_field as i64;
        buf[parent_field..parent_field + 4].copy_from_slice(&(parent_rel as i32).to_le_bytes());
        let name_field = offset + 8;
        let name_offset = buf.len();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        let rel = name_offset as i64 - name_field as i64;
        buf[name_field..name_field + 4].copy_from_slice(&(rel as i32).to_le_bytes());
    }

    #[test]
    fn resolves_empty_input_to_empty_string() {
        let data = [0u8; 0];
        let image = FakeImage {
            data: &data,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);
        assert_eq!(resolver.resolve(&[], 0), "");
    }

    #[test]
    fn resolves_type_with_no_markers_like_the_demangler() {
        let data = *b"Si";
        let image = FakeImage {
            data: &data,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);
        assert_eq!(resolver.resolve(&data, 0), swift_reflect_demangle::demangle("Si"));
    }

    #[test]
    fn resolves_direct_context_marker_to_qualified_name() {
        let mut buf = Vec::new();
        write_module_descriptor(&mut buf, 0, "MyApp");
        buf.resize(0x1000, 0);
        write_type_descriptor(&mut buf, 0x1000, 0, "Widget");

        let image = FakeImage {
            data: &buf,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let src: i64 = 2000;
        let rel = (0x1000i64) - (src + 1);
        let mut marker = vec![0x01u8];
        marker.extend_from_slice(&(rel as i32).to_le_bytes());

        assert_eq!(resolver.resolve(&marker, src), "MyApp.Widget");
    }

    #[test]
    fn resolves_direct_context_marker_with_optional_suffix() {
        let mut buf = Vec::new();
        write_module_descriptor(&mut buf, 0, "MyApp");
        buf.resize(0x1000, 0);
        write_type_descriptor(&mut buf, 0x1000, 0, "Widget");

        let image = FakeImage {
            data: &buf,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let src: i64 = 2000;
        let rel = (0x1000i64) - (src + 1);
        let mut marker = vec![0x01u8];
        marker.extend_from_slice(&(rel as i32).to_le_bytes());
        marker.extend_from_slice(b"Sg");

        assert_eq!(resolver.resolve(&marker, src), "MyApp.Widget?");
    }

    #[test]
    fn resolves_direct_context_marker_with_generic_argument_list() {
        let mut buf = Vec::new();
        write_module_descriptor(&mut buf, 0, "MyApp");
        buf.resize(0x1000, 0);
        write_type_descriptor(&mut buf, 0x1000, 0, "Widget");

        let image = FakeImage {
            data: &buf,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let src: i64 = 2000;
        let rel = (0x1000i64) - (src + 1);
        let mut marker = vec![0x01u8];
        marker.extend_from_slice(&(rel as i32).to_le_bytes());
        marker.extend_from_slice(b"ySiG");

        assert_eq!(resolver.resolve(&marker, src), "MyApp.Widget<Int>");
    }

    #[test]
    fn out_of_range_marker_becomes_a_diagnostic_placeholder() {
        let data = [0u8; 4];
        let image = FakeImage {
            data: &data,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let marker = [0x01u8, 0xFF, 0xFF, 0xFF, 0x7F]; // absurd offset
        let rendered = resolver.resolve(&marker, 0);
        assert!(rendered.starts_with("/*"), "got {rendered:?}");
    }

    #[test]
    fn unknown_marker_byte_becomes_a_diagnostic_placeholder() {
        let data = [0u8; 8];
        let image = FakeImage {
            data: &data,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let marker = [0x05u8, 0, 0, 0, 0];
        assert_eq!(
            resolver.resolve(&marker, 0),
            Diagnostic::UnknownMarker(0x05).to_string()
        );
    }

    #[test]
    fn resolving_twice_yields_identical_strings_cache_hit_or_miss() {
        let mut buf = Vec::new();
        write_module_descriptor(&mut buf, 0, "MyApp");
        buf.resize(0x1000, 0);
        write_type_descriptor(&mut buf, 0x1000, 0, "Widget");

        let image = FakeImage {
            data: &buf,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let src: i64 = 2000;
        let rel = (0x1000i64) - (src + 1);
        let mut marker = vec![0x01u8];
        marker.extend_from_slice(&(rel as i32).to_le_bytes());

        let first = resolver.resolve(&marker, src);
        let second = resolver.resolve(&marker, src);
        assert_eq!(first, second);
    }

    #[test]
    fn container_fast_path_resolves_array_of_resolved_type() {
        let mut buf = Vec::new();
        write_module_descriptor(&mut buf, 0, "MyApp");
        buf.resize(0x1000, 0);
        write_type_descriptor(&mut buf, 0x1000, 0, "Widget");

        let image = FakeImage {
            data: &buf,
            segments: vec![],
        };
        let mut resolver = Resolver::new(&image);

        let src: i64 = 2000;
        let rel = (0x1000i64) - (src + 3 + 1);
        let mut bytes = b"Say".to_vec();
        bytes.push(0x01);
        bytes.extend_from_slice(&(rel as i32).to_le_bytes());
        bytes.push(b'G');

        assert_eq!(resolver.resolve(&bytes, src), "[MyApp.Widget]");
    }
}

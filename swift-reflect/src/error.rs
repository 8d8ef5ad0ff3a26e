//! The one error this crate can return: a violation of the `BinaryImage` contract itself.
//!
//! Everything inside a `__swift5_*` section — a truncated record, an out-of-range relative
//! pointer, an implausible count — is corruption the decoder skips over (§7, taxonomy 1). A
//! [`DecodeError`] is reserved for the container collaborator handing over a section whose
//! declared extent doesn't even fit inside its own byte buffer, which the decoder has no safe
//! way to partially tolerate.

use thiserror::Error;

/// A violation of the `BinaryImage` contract that the decoder cannot safely route around.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A section's declared `file_offset`/`size` extends past the end of the image's data
    /// buffer.
    #[error(
        "section {section} ({file_offset}..{end}) extends past the end of a {data_len}-byte image"
    )]
    SectionOutOfBounds {
        /// The offending section's name, e.g. `"__swift5_types"`.
        section: String,
        /// The section's declared file offset.
        file_offset: u64,
        /// The offset just past the section's declared end.
        end: u64,
        /// The length of the image's data buffer.
        data_len: usize,
    },
}

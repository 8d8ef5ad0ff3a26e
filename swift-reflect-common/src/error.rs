use thiserror::Error;

/// Errors raised when the external [`BinaryImage`](crate::BinaryImage) contract itself is
/// violated, as opposed to corruption *within* a reflection section.
///
/// Per-record corruption inside a `__swift5_*` section is never surfaced through this type: it is
/// silently skipped by the decoder, per the error taxonomy of the core. `CommonError` exists for
/// the much narrower set of cases where a primitive read underflows the buffer the caller handed
/// us, which the decoder treats as "stop trying to read this one thing" rather than "abort the
/// whole decode".
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommonError {
    /// A read went past the end of the buffer, or the requested offset was negative.
    #[error("out of bounds read at offset {0}")]
    OutOfBounds(i64),

    /// A lower-level `scroll` read failed (malformed UTF-8, misaligned read, etc).
    #[error("malformed binary data")]
    Malformed(#[source] scroll::Error),
}

impl From<scroll::Error> for CommonError {
    fn from(source: scroll::Error) -> Self {
        CommonError::Malformed(source)
    }
}

//! Custom error types for the orthrus-reader crate.

use super::models::CardRole;
use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every variant is fatal: a failed check aborts the run before (or
/// during) decryption, with no partial-output recovery. A short read on
/// a data sector is *not* an error; it is the normal end-of-volume
/// condition and never surfaces here.
#[derive(Debug, Error)]
pub enum OrthrusError {
    /// An error originating from I/O operations on a card stream or the
    /// output sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The first sector of a card does not start with a known magic
    /// constant.
    #[error("card {card} is not an Orthrus volume (bad magic)")]
    BadMagic { card: u8 },

    /// A card ended before a full keyblock sector could be read.
    #[error("card {card}: keyblock truncated: expected {expected} bytes, got {got}")]
    TruncatedKeyblock {
        card: u8,
        expected: usize,
        got: usize,
    },

    /// A keyblock buffer handed to the parser was not exactly one sector.
    #[error("keyblock buffer has wrong length: expected {expected} bytes, got {got}")]
    BadSectorLength { expected: usize, got: usize },

    /// The two cards carry different volume IDs and cannot be paired.
    #[error("cards are not paired: volume IDs differ")]
    VolumeIdMismatch,

    /// Both cards claim the same role; a valid pair has one A and one B.
    #[error("both cards are flagged {role}; a pair needs one A and one B")]
    DuplicateRole { role: CardRole },

    /// The underlying cipher or MAC primitive rejected a key. Should not
    /// occur with well-formed fixed-length keys; treated as an
    /// unrecoverable internal fault.
    #[error("cipher initialization failed: {0}")]
    CipherInit(String),
}

/// A convenience `Result` type alias using the crate's `OrthrusError` type.
pub type Result<T> = std::result::Result<T, OrthrusError>;

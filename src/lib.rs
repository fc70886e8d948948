//! # orthrus-reader
//!
//! Offline decoder for Orthrus dual-card encrypted volumes.
//!
//! An Orthrus volume is mirrored across two physical cards. Each card
//! starts with a fixed-layout keyblock sector holding half of the key
//! material plus a shared volume identifier; every sector after that is
//! ciphertext, and the logical plaintext stream alternates between the
//! two cards sector by sector. Given dumps of a genuine card pair, this
//! crate reassembles and decrypts the logical stream, which is how a
//! hardware/firmware pair is verified to implement the scheme correctly.
//!
//! The scheme is confidentiality-only: there is no authentication tag,
//! and tampered ciphertext silently decrypts to garbage. This decoder
//! preserves that behavior instead of pretending to detect corruption.

pub mod orthrus;

// Re-export the main types for convenience
pub use orthrus::{
    error::{OrthrusError, Result},
    models::{CardRole, FormatVersion, Keyblock, VolumeKey, SECTOR_SIZE},
    OrthrusVolume,
};

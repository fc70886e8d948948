//! Keyblock parsing: the fixed-layout first sector of each card.

use std::io::Read;

use log::debug;

use super::error::{OrthrusError, Result};
use super::models::{
    CardRole, FormatVersion, Keyblock, KEY_HALF_LEN, NONCE_LEN, SECTOR_SIZE, VOLUME_ID_LEN,
};
use super::utils::read_full;

/// Read exactly one keyblock sector from the start of a card stream and
/// parse it.
///
/// `slot` is the 1-based position the card was supplied in (used only
/// for error messages and diagnostics). A short read here is a format
/// error: a card shorter than one sector cannot be a volume at all.
pub fn read<R: Read>(reader: &mut R, slot: u8) -> Result<Keyblock> {
    let mut sector = [0u8; SECTOR_SIZE];
    let got = read_full(reader, &mut sector)?;
    if got < SECTOR_SIZE {
        return Err(OrthrusError::TruncatedKeyblock {
            card: slot,
            expected: SECTOR_SIZE,
            got,
        });
    }
    parse(&sector, slot)
}

/// Parse one keyblock from a buffer of exactly one sector.
///
/// Validates the magic constant, selects the matching field layout and
/// copies the fields out. Bytes past the card flag are unused padding
/// and ignored.
pub fn parse(sector: &[u8], slot: u8) -> Result<Keyblock> {
    if sector.len() != SECTOR_SIZE {
        return Err(OrthrusError::BadSectorLength {
            expected: SECTOR_SIZE,
            got: sector.len(),
        });
    }

    let version =
        FormatVersion::from_magic(sector).ok_or(OrthrusError::BadMagic { card: slot })?;
    let layout = version.layout();

    let mut volume_id = [0u8; VOLUME_ID_LEN];
    volume_id.copy_from_slice(layout.volume_id.slice(sector));
    let mut key_half = [0u8; KEY_HALF_LEN];
    key_half.copy_from_slice(layout.key_half.slice(sector));
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(layout.nonce.slice(sector));
    let role = CardRole::from_flag(sector[layout.card_flag]);

    debug!(
        "card {}: {:?} keyblock, role {}, volume id {}",
        slot,
        version,
        role,
        hex::encode(volume_id)
    );

    Ok(Keyblock {
        version,
        volume_id,
        key_half,
        nonce,
        role,
    })
}

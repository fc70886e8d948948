//! Core Orthrus volume reader module.

pub mod crypto;
pub mod error;
pub mod keyblock;
pub mod models;
pub mod pairing;
pub mod xex;
mod utils;

use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder};
use log::{debug, info};

pub use error::{OrthrusError, Result};
use models::{FormatVersion, SECTOR_SIZE, VOLUME_ID_LEN};
use pairing::{Card, CardPair};
use xex::SectorCipher;

/// A validated, key-derived Orthrus volume ready for sequential
/// decryption.
///
/// The logical plaintext stream is striped across two physical cards:
/// even logical sectors live on card A, odd ones on card B, both offset
/// by one keyblock sector. `open` performs the whole fixed-cost setup
/// (parse both keyblocks, validate the pairing, derive the volume key);
/// after that, sectors are decrypted strictly in logical order, one at a
/// time, with no read-ahead.
pub struct OrthrusVolume<R> {
    pair: CardPair<R>,
    cipher: SectorCipher,
    next_block: u32,
    exhausted: bool,
}

impl<R> std::fmt::Debug for OrthrusVolume<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrthrusVolume")
            .field("next_block", &self.next_block)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<R: Read> OrthrusVolume<R> {
    /// Open a volume from two card streams, supplied in either order.
    ///
    /// Reads exactly one sector from each stream. All validation runs
    /// before any key material is derived; any failure aborts the run.
    pub fn open(mut first: R, mut second: R) -> Result<Self> {
        let kb1 = keyblock::read(&mut first, 1)?;
        let kb2 = keyblock::read(&mut second, 2)?;
        let pair = pairing::pair(
            Card {
                keyblock: kb1,
                stream: first,
            },
            Card {
                keyblock: kb2,
                stream: second,
            },
        )?;

        info!(
            "opened {:?} volume, id {}",
            pair.card_a.keyblock.version,
            hex::encode(pair.card_a.keyblock.volume_id)
        );
        debug!(
            "nonce A {}, nonce B {}",
            hex::encode(pair.card_a.keyblock.nonce),
            hex::encode(pair.card_b.keyblock.nonce)
        );

        let volume_key = crypto::derive_volume_key(&pair.card_a.keyblock, &pair.card_b.keyblock)?;
        let cipher = SectorCipher::new(&volume_key)?;

        Ok(Self {
            pair,
            cipher,
            next_block: 0,
            exhausted: false,
        })
    }

    /// The shared volume identifier both cards carry.
    pub fn volume_id(&self) -> &[u8; VOLUME_ID_LEN] {
        &self.pair.card_a.keyblock.volume_id
    }

    /// The keyblock format version the volume was written with.
    pub fn format_version(&self) -> FormatVersion {
        self.pair.card_a.keyblock.version
    }

    /// Decrypt the next logical sector, or `Ok(None)` at end of volume.
    ///
    /// Even block indices read from card A, odd from card B. The
    /// per-block nonce is the *opposite* card's stored nonce with its
    /// last four bytes replaced by the block index, big-endian. A short
    /// read on either stream (including zero bytes) ends the volume; it
    /// is the sole termination condition and not an error. Once ended,
    /// every further call returns `Ok(None)`.
    pub fn next_sector(&mut self) -> Result<Option<[u8; SECTOR_SIZE]>> {
        if self.exhausted {
            return Ok(None);
        }

        let n = self.next_block;
        let even = n % 2 == 0;
        let (stream, tweak_nonce) = if even {
            (
                &mut self.pair.card_a.stream,
                &self.pair.card_b.keyblock.nonce,
            )
        } else {
            (
                &mut self.pair.card_b.stream,
                &self.pair.card_a.keyblock.nonce,
            )
        };

        let mut sector = [0u8; SECTOR_SIZE];
        let got = utils::read_full(stream, &mut sector)?;
        if got < SECTOR_SIZE {
            debug!(
                "card {} ran short ({} bytes) at logical block {}; end of volume",
                if even { "A" } else { "B" },
                got,
                n
            );
            self.exhausted = true;
            return Ok(None);
        }

        let mut nonce = *tweak_nonce;
        BigEndian::write_u32(&mut nonce[12..], n);
        self.cipher.decrypt_sector(&nonce, &mut sector);

        self.next_block = n.wrapping_add(1);
        Ok(Some(sector))
    }

    /// Decrypt the whole remaining volume into `sink`, sector by sector.
    /// Returns the number of sectors written.
    pub fn decrypt_to<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        let mut sectors = 0u64;
        while let Some(sector) = self.next_sector()? {
            sink.write_all(&sector)?;
            sectors += 1;
        }
        info!(
            "decrypted {} sectors ({} bytes)",
            sectors,
            sectors * SECTOR_SIZE as u64
        );
        Ok(sectors)
    }
}

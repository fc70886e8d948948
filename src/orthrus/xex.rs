//! AES-256 XEX sector cipher with GF(2^128) tweak chaining.
//!
//! Each 512-byte sector is processed as 32 independent 16-byte blocks.
//! The initial tweak is the AES encryption of the per-block nonce under
//! the volume key; between blocks the tweak is doubled in GF(2^128).
//!
//! Unlike IEEE 1619 XTS, the tweak here is doubled as a *big-endian*
//! 128-bit integer (the reduction byte 0x87 lands in the last byte, not
//! the first) and the same key drives both the tweak and the data. The
//! standard XTS crates cannot express that, so the mode is built
//! directly on the block cipher.
//!
//! The mode is confidentiality-only: corrupted ciphertext blocks decrypt
//! to garbage with no error. That matches the on-card scheme and must
//! not be "fixed" here.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use zeroize::Zeroize;

use super::error::{OrthrusError, Result};
use super::models::{VolumeKey, NONCE_LEN, SECTOR_SIZE};

/// AES block size in bytes; also the tweak size.
pub const BLOCK_SIZE: usize = 16;

/// The keyed sector cipher. Each sector operation is a pure function of
/// `(key, nonce, sector)`; the struct only caches the key schedule.
pub struct SectorCipher {
    cipher: Aes256,
}

impl SectorCipher {
    pub fn new(key: &VolumeKey) -> Result<Self> {
        let cipher = Aes256::new_from_slice(key.as_bytes())
            .map_err(|e| OrthrusError::CipherInit(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// `T0 = Encrypt(key, nonce)`, single block, no chaining.
    fn initial_tweak(&self, nonce: &[u8; NONCE_LEN]) -> [u8; BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(nonce);
        self.cipher.encrypt_block(&mut block);
        block.into()
    }

    /// Decrypt one sector in place: `P_i = Decrypt(C_i ^ T_i) ^ T_i`,
    /// with `T_{i+1} = 2 * T_i` in GF(2^128).
    pub fn decrypt_sector(&self, nonce: &[u8; NONCE_LEN], sector: &mut [u8; SECTOR_SIZE]) {
        let mut tweak = self.initial_tweak(nonce);
        for chunk in sector.chunks_exact_mut(BLOCK_SIZE) {
            xor_block(chunk, &tweak);
            let mut block = GenericArray::clone_from_slice(chunk);
            self.cipher.decrypt_block(&mut block);
            chunk.copy_from_slice(&block);
            xor_block(chunk, &tweak);
            gf128_double(&mut tweak);
        }
        tweak.zeroize();
    }

    /// Encrypt one sector in place: the exact forward direction of
    /// `decrypt_sector`. The verification decoder never writes back to
    /// cards; this exists for the round-trip property and for building
    /// test volumes.
    pub fn encrypt_sector(&self, nonce: &[u8; NONCE_LEN], sector: &mut [u8; SECTOR_SIZE]) {
        let mut tweak = self.initial_tweak(nonce);
        for chunk in sector.chunks_exact_mut(BLOCK_SIZE) {
            xor_block(chunk, &tweak);
            let mut block = GenericArray::clone_from_slice(chunk);
            self.cipher.encrypt_block(&mut block);
            chunk.copy_from_slice(&block);
            xor_block(chunk, &tweak);
            gf128_double(&mut tweak);
        }
        tweak.zeroize();
    }
}

#[inline]
fn xor_block(block: &mut [u8], tweak: &[u8; BLOCK_SIZE]) {
    for (b, t) in block.iter_mut().zip(tweak.iter()) {
        *b ^= t;
    }
}

/// Double the tweak in GF(2^128) with the AES reduction polynomial.
///
/// The buffer is treated as a big-endian 128-bit integer: shifted left
/// one bit across the whole buffer, and if a bit falls out of byte 0 the
/// constant 0x87 is XORed into the last (least significant) byte.
pub(crate) fn gf128_double(tweak: &mut [u8; BLOCK_SIZE]) {
    let mut carry = 0u8;
    for byte in tweak.iter_mut().rev() {
        let next_carry = *byte >> 7;
        *byte = (*byte << 1) | carry;
        carry = next_carry;
    }
    if carry != 0 {
        tweak[BLOCK_SIZE - 1] ^= 0x87;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(seed: u8) -> SectorCipher {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = seed ^ i as u8;
        }
        SectorCipher::new(&VolumeKey::new(key)).unwrap()
    }

    #[test]
    fn doubling_without_carry_is_a_shift() {
        let mut t = [0u8; 16];
        t[15] = 0x01;
        gf128_double(&mut t);
        assert_eq!(t[15], 0x02);
        assert_eq!(&t[..15], &[0u8; 15]);

        // a bit shifting across a byte boundary
        let mut t = [0u8; 16];
        t[15] = 0x80;
        gf128_double(&mut t);
        assert_eq!(t[14], 0x01);
        assert_eq!(t[15], 0x00);
    }

    #[test]
    fn doubling_with_carry_folds_in_the_polynomial() {
        let mut t = [0u8; 16];
        t[0] = 0x80;
        gf128_double(&mut t);
        let mut expected = [0u8; 16];
        expected[15] = 0x87;
        assert_eq!(t, expected);

        let mut t = [0xFFu8; 16];
        gf128_double(&mut t);
        let mut expected = [0xFFu8; 16];
        expected[15] = 0xFE ^ 0x87;
        assert_eq!(t, expected);
    }

    #[test]
    fn sector_round_trip() {
        let cipher = cipher(0x42);
        let nonce = [0x11u8; 16];
        let mut sector = [0u8; SECTOR_SIZE];
        for (i, b) in sector.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let plaintext = sector;

        cipher.encrypt_sector(&nonce, &mut sector);
        assert_ne!(sector, plaintext);
        cipher.decrypt_sector(&nonce, &mut sector);
        assert_eq!(sector, plaintext);
    }

    #[test]
    fn nonce_changes_the_whole_sector() {
        let cipher = cipher(0x42);
        let mut with_first = [0u8; SECTOR_SIZE];
        let mut with_second = [0u8; SECTOR_SIZE];
        cipher.encrypt_sector(&[0u8; 16], &mut with_first);
        cipher.encrypt_sector(&[1u8; 16], &mut with_second);
        // every 16-byte block must differ, not just the first
        for (a, b) in with_first
            .chunks_exact(BLOCK_SIZE)
            .zip(with_second.chunks_exact(BLOCK_SIZE))
        {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn identical_blocks_encrypt_differently_within_a_sector() {
        let cipher = cipher(0x42);
        let mut sector = [0xABu8; SECTOR_SIZE];
        cipher.encrypt_sector(&[7u8; 16], &mut sector);
        let first = &sector[..BLOCK_SIZE];
        for chunk in sector[BLOCK_SIZE..].chunks_exact(BLOCK_SIZE) {
            assert_ne!(chunk, first);
        }
    }

    #[test]
    fn corrupted_ciphertext_decrypts_to_garbage_without_error() {
        let cipher = cipher(0x42);
        let nonce = [3u8; 16];
        let mut sector = [0x5Au8; SECTOR_SIZE];
        cipher.encrypt_sector(&nonce, &mut sector);
        sector[100] ^= 0xFF; // tamper inside block 6
        cipher.decrypt_sector(&nonce, &mut sector);
        // block 6 is garbage, every other block is intact
        assert_ne!(&sector[96..112], &[0x5Au8; 16][..]);
        assert_eq!(&sector[..96], &[0x5Au8; 96][..]);
        assert_eq!(&sector[112..], &[0x5Au8; SECTOR_SIZE - 112][..]);
    }
}

//! Volume key derivation: the two-level AES-CMAC chain.

use aes::Aes256;
use cmac::{Cmac, Mac};
use log::debug;
use zeroize::Zeroize;

use super::error::{OrthrusError, Result};
use super::models::{Keyblock, VolumeKey, KEY_HALF_LEN};

/// Compute a single AES-256-CMAC tag over `data`.
fn cmac_tag(key: &[u8; 32], data: &[u8]) -> Result<[u8; 16]> {
    let mut mac = <Cmac<Aes256> as Mac>::new_from_slice(key)
        .map_err(|e| OrthrusError::CipherInit(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Derive the single volume key from both cards' key halves and the
/// shared volume ID.
///
/// Algorithm, exact and order-sensitive:
/// 1. Interleave the key halves bytewise: `buf[2i] = A[i]`,
///    `buf[2i+1] = B[i]`. Reconstructing this buffer requires both
///    halves; it is deliberately not a plain concatenation.
/// 2. Level 0: CMAC each 32-byte half of the interleaved buffer under an
///    all-zero key; the two 16-byte tags concatenated are the
///    intermediate key.
/// 3. Level 1: CMAC each 32-byte half of the volume ID under the
///    intermediate key; the two tags concatenated are the volume key.
///
/// Pure and deterministic: the same pair always yields the same key.
/// Run exactly once per volume, before any sector is touched.
pub fn derive_volume_key(card_a: &Keyblock, card_b: &Keyblock) -> Result<VolumeKey> {
    let mut interleaved = [0u8; KEY_HALF_LEN * 2];
    for i in 0..KEY_HALF_LEN {
        interleaved[2 * i] = card_a.key_half[i];
        interleaved[2 * i + 1] = card_b.key_half[i];
    }

    let result: Result<VolumeKey> = (|| {
        let zero_key = [0u8; 32];
        let mut intermediate = [0u8; 32];
        intermediate[..16].copy_from_slice(&cmac_tag(&zero_key, &interleaved[..32])?);
        intermediate[16..].copy_from_slice(&cmac_tag(&zero_key, &interleaved[32..])?);

        let volume_id = &card_a.volume_id;
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(&cmac_tag(&intermediate, &volume_id[..32])?);
        key[16..].copy_from_slice(&cmac_tag(&intermediate, &volume_id[32..])?);
        intermediate.zeroize();

        let volume_key = VolumeKey::new(key);
        key.zeroize();
        Ok(volume_key)
    })();

    interleaved.zeroize();
    if result.is_ok() {
        debug!("volume key derived");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orthrus::models::{CardRole, FormatVersion};

    fn keyblock(role: CardRole, key_half: [u8; 32], volume_id: [u8; 64]) -> Keyblock {
        Keyblock {
            version: FormatVersion::V2,
            volume_id,
            key_half,
            nonce: [0u8; 16],
            role,
        }
    }

    fn sample_pair() -> (Keyblock, Keyblock) {
        let mut half_a = [0u8; 32];
        let mut half_b = [0u8; 32];
        let mut volume_id = [0u8; 64];
        for i in 0..32 {
            half_a[i] = i as u8;
            half_b[i] = 0x80 | i as u8;
        }
        for (i, b) in volume_id.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(3);
        }
        (
            keyblock(CardRole::A, half_a, volume_id),
            keyblock(CardRole::B, half_b, volume_id),
        )
    }

    #[test]
    fn derivation_is_deterministic() {
        let (a, b) = sample_pair();
        let k1 = derive_volume_key(&a, &b).unwrap();
        let k2 = derive_volume_key(&a, &b).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn halves_are_order_sensitive() {
        // Swapping which card holds which half interleaves differently
        // and must change the key.
        let (a, b) = sample_pair();
        let swapped_a = keyblock(CardRole::A, b.key_half, a.volume_id);
        let swapped_b = keyblock(CardRole::B, a.key_half, a.volume_id);
        let k = derive_volume_key(&a, &b).unwrap();
        let k_swapped = derive_volume_key(&swapped_a, &swapped_b).unwrap();
        assert_ne!(k.as_bytes(), k_swapped.as_bytes());
    }

    #[test]
    fn volume_id_feeds_the_key() {
        let (a, b) = sample_pair();
        let mut other_id = a.volume_id;
        other_id[63] ^= 0x01;
        let a2 = keyblock(CardRole::A, a.key_half, other_id);
        let b2 = keyblock(CardRole::B, b.key_half, other_id);
        let k = derive_volume_key(&a, &b).unwrap();
        let k2 = derive_volume_key(&a2, &b2).unwrap();
        assert_ne!(k.as_bytes(), k2.as_bytes());
    }
}

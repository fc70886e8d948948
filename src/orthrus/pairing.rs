//! Card pairing validation and canonical (A, B) ordering.

use log::debug;

use super::error::{OrthrusError, Result};
use super::models::{CardRole, Keyblock};

/// One card: its parsed keyblock plus the byte stream, positioned just
/// past the keyblock at the first data sector.
pub struct Card<R> {
    pub keyblock: Keyblock,
    pub stream: R,
}

impl<R> std::fmt::Debug for Card<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("role", &self.keyblock.role)
            .finish_non_exhaustive()
    }
}

/// A validated card pair in canonical order.
///
/// Owns both streams for the remainder of the run; they are read
/// sequentially and never rewound.
pub struct CardPair<R> {
    pub card_a: Card<R>,
    pub card_b: Card<R>,
}

impl<R> std::fmt::Debug for CardPair<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPair")
            .field("card_a", &self.card_a)
            .field("card_b", &self.card_b)
            .finish()
    }
}

/// Cross-check two cards and order them canonically.
///
/// The cards may be supplied in either order; the result is always
/// `(A, B)`. Both checks are hard preconditions of key derivation:
/// the volume IDs must match byte for byte, and exactly one card must
/// be flagged A and the other B.
pub fn pair<R>(first: Card<R>, second: Card<R>) -> Result<CardPair<R>> {
    if first.keyblock.volume_id != second.keyblock.volume_id {
        return Err(OrthrusError::VolumeIdMismatch);
    }
    match (first.keyblock.role, second.keyblock.role) {
        (CardRole::A, CardRole::B) => Ok(CardPair {
            card_a: first,
            card_b: second,
        }),
        (CardRole::B, CardRole::A) => {
            debug!("cards supplied B-first; swapping to canonical order");
            Ok(CardPair {
                card_a: second,
                card_b: first,
            })
        }
        (role @ CardRole::A, CardRole::A) | (role @ CardRole::B, CardRole::B) => {
            Err(OrthrusError::DuplicateRole { role })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orthrus::models::FormatVersion;

    fn keyblock(role: CardRole, volume_id_seed: u8, key_seed: u8) -> Keyblock {
        Keyblock {
            version: FormatVersion::V2,
            volume_id: [volume_id_seed; 64],
            key_half: [key_seed; 32],
            nonce: [key_seed ^ 0xFF; 16],
            role,
        }
    }

    fn card(role: CardRole, volume_id_seed: u8, key_seed: u8) -> Card<()> {
        Card {
            keyblock: keyblock(role, volume_id_seed, key_seed),
            stream: (),
        }
    }

    #[test]
    fn orders_canonically_either_way() {
        let pair_ab = pair(card(CardRole::A, 1, 2), card(CardRole::B, 1, 3)).unwrap();
        assert_eq!(pair_ab.card_a.keyblock.key_half, [2u8; 32]);
        assert_eq!(pair_ab.card_b.keyblock.key_half, [3u8; 32]);

        let pair_ba = pair(card(CardRole::B, 1, 3), card(CardRole::A, 1, 2)).unwrap();
        assert_eq!(pair_ba.card_a.keyblock.key_half, [2u8; 32]);
        assert_eq!(pair_ba.card_b.keyblock.key_half, [3u8; 32]);
    }

    #[test]
    fn rejects_volume_id_mismatch() {
        let err = pair(card(CardRole::A, 1, 2), card(CardRole::B, 9, 3)).unwrap_err();
        assert!(matches!(err, OrthrusError::VolumeIdMismatch));
    }

    #[test]
    fn rejects_two_a_cards() {
        let err = pair(card(CardRole::A, 1, 2), card(CardRole::A, 1, 3)).unwrap_err();
        assert!(matches!(
            err,
            OrthrusError::DuplicateRole { role: CardRole::A }
        ));
    }

    #[test]
    fn rejects_two_b_cards() {
        let err = pair(card(CardRole::B, 1, 2), card(CardRole::B, 1, 3)).unwrap_err();
        assert!(matches!(
            err,
            OrthrusError::DuplicateRole { role: CardRole::B }
        ));
    }

    #[test]
    fn volume_id_checked_before_roles() {
        // Both broken: mismatched IDs and duplicate roles. The ID check
        // runs first.
        let err = pair(card(CardRole::A, 1, 2), card(CardRole::A, 9, 3)).unwrap_err();
        assert!(matches!(err, OrthrusError::VolumeIdMismatch));
    }
}

//! Data structures representing Orthrus volume components.

use std::fmt;
use zeroize::Zeroize;

/// Size in bytes of one physical (and logical) sector.
pub const SECTOR_SIZE: usize = 512;

/// Length of the shared volume identifier in the current format.
pub const VOLUME_ID_LEN: usize = 64;

/// Length of each card's key-half contribution.
pub const KEY_HALF_LEN: usize = 32;

/// Length of each card's stored nonce.
pub const NONCE_LEN: usize = 16;

/// Offset and length of one keyblock field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub offset: usize,
    pub len: usize,
}

impl FieldSpec {
    /// Slice this field out of a keyblock sector.
    pub fn slice<'a>(&self, sector: &'a [u8]) -> &'a [u8] {
        &sector[self.offset..self.offset + self.len]
    }
}

/// Field layout of the keyblock sector for one format version.
///
/// Keeping the layout table-driven means a future format version is a
/// new table entry, not a parser rewrite. The retired V1 layout
/// (32-byte volume ID, 10-byte nonce, counter mode) would slot in here.
#[derive(Debug)]
pub struct KeyblockLayout {
    /// Leading bytes of the sector; exact match required.
    pub magic: &'static [u8],
    pub volume_id: FieldSpec,
    pub key_half: FieldSpec,
    pub nonce: FieldSpec,
    /// Offset of the single-byte card flag (0 = A, nonzero = B).
    pub card_flag: usize,
}

static V2_LAYOUT: KeyblockLayout = KeyblockLayout {
    magic: b"OrthrusVolumeV02",
    volume_id: FieldSpec {
        offset: 0x10,
        len: VOLUME_ID_LEN,
    },
    key_half: FieldSpec {
        offset: 0x50,
        len: KEY_HALF_LEN,
    },
    nonce: FieldSpec {
        offset: 0x70,
        len: NONCE_LEN,
    },
    card_flag: 0x80,
};

/// Keyblock format version, selected by the magic constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V2,
}

impl FormatVersion {
    /// Identify the format version from the leading bytes of a keyblock
    /// sector. Returns `None` if no known magic matches.
    pub fn from_magic(sector: &[u8]) -> Option<Self> {
        [Self::V2]
            .into_iter()
            .find(|v| sector.starts_with(v.layout().magic))
    }

    /// Get the field layout for this format version.
    pub fn layout(self) -> &'static KeyblockLayout {
        match self {
            FormatVersion::V2 => &V2_LAYOUT,
        }
    }
}

/// Which half of the pair a card claims to be.
///
/// Even logical blocks live on card A, odd blocks on card B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRole {
    A,
    B,
}

impl CardRole {
    /// Decode the keyblock flag byte: 0 = A, anything else = B.
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 {
            CardRole::A
        } else {
            CardRole::B
        }
    }
}

impl fmt::Display for CardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardRole::A => write!(f, "A"),
            CardRole::B => write!(f, "B"),
        }
    }
}

/// The parsed first sector of one card.
///
/// Immutable once parsed; it holds no handle to the underlying stream.
/// The key half is wiped when the keyblock is dropped.
pub struct Keyblock {
    pub version: FormatVersion,
    /// Shared identifier, identical on both cards of a pair.
    pub volume_id: [u8; VOLUME_ID_LEN],
    /// This card's contribution to the volume key.
    pub key_half: [u8; KEY_HALF_LEN],
    /// Tweak-derivation nonce, used for the *opposite* card's sectors.
    pub nonce: [u8; NONCE_LEN],
    pub role: CardRole,
}

impl Drop for Keyblock {
    fn drop(&mut self) {
        self.key_half.zeroize();
    }
}

impl std::fmt::Debug for Keyblock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyblock")
            .field("version", &self.version)
            .field("volume_id", &self.volume_id)
            .field("key_half", &"<redacted>")
            .field("nonce", &self.nonce)
            .field("role", &self.role)
            .finish()
    }
}

/// The single derived volume key. Never persisted; wiped on drop.
pub struct VolumeKey([u8; 32]);

impl VolumeKey {
    pub(crate) fn new(bytes: [u8; 32]) -> Self {
        VolumeKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Drop for VolumeKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

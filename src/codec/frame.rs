//! Chunk framer (§4.4): wraps one FEC block into the on-frame wire record,
//! and parses it back.
//!
//! ```text
//! magic="QDV2" (4) | idx(4, BE) | total(4, BE) | length(2, BE) | kind(1) | payload(length) | crc32(payload, 4, BE)
//! ```
//!
//! A CRC mismatch on unwrap is a silent drop, not an error: a corrupted
//! tile detection must shrink the *candidate* set, never inject bad data
//! into it.

const MAGIC: &[u8] = b"QDV2";
const HEADER_LEN: usize = 4 + 4 + 4 + 2 + 1;
const MIN_LEN: usize = HEADER_LEN + 4; // + trailing crc32, zero-length payload

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Data,
    Parity,
}

impl Kind {
    fn to_byte(self) -> u8 {
        match self {
            Self::Data => 0,
            Self::Parity => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Data),
            1 => Some(Self::Parity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedChunk {
    pub idx: u32,
    pub total: u32,
    pub kind: Kind,
    pub payload: Vec<u8>,
}

/// Wraps a block's payload into the on-frame record. Fails if `payload` is
/// too large for the 16-bit `length` field (a shared wire-format limit with
/// the original system's own `to_bytes(2, 'big')` encoding).
pub fn wrap(idx: u32, total: u32, kind: Kind, payload: &[u8]) -> crate::error::Result<Vec<u8>> {
    let length = u16::try_from(payload.len())
        .map_err(|_| crate::error::Error::Format(format!(
            "block payload of {} bytes exceeds the 16-bit length field",
            payload.len()
        )))?;
    let crc = crc32fast::hash(payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&idx.to_be_bytes());
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(&length.to_be_bytes());
    out.push(kind.to_byte());
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc.to_be_bytes());
    Ok(out)
}

/// Parses a candidate tile byte-string. Returns `None` on any format defect
/// or CRC mismatch — both are silent drops at this layer.
pub fn unwrap(bytes: &[u8]) -> Option<WrappedChunk> {
    if bytes.len() < MIN_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return None;
    }

    let mut offset = MAGIC.len();
    let idx = u32::from_be_bytes(bytes[offset..offset + 4].try_into().ok()?);
    offset += 4;
    let total = u32::from_be_bytes(bytes[offset..offset + 4].try_into().ok()?);
    offset += 4;
    let length = u16::from_be_bytes(bytes[offset..offset + 2].try_into().ok()?) as usize;
    offset += 2;
    let kind = Kind::from_byte(bytes[offset])?;
    offset += 1;

    if idx >= total {
        return None;
    }
    if HEADER_LEN + length + 4 > bytes.len() {
        return None;
    }

    let payload = &bytes[offset..offset + length];
    offset += length;
    let crc_received = u32::from_be_bytes(bytes[offset..offset + 4].try_into().ok()?);

    if crc32fast::hash(payload) != crc_received {
        return None;
    }

    Some(WrappedChunk {
        idx,
        total,
        kind,
        payload: payload.to_vec(),
    })
}

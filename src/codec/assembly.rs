//! Frame assembler / disassembler (§4.5, §4.6).
//!
//! A [`Frame`] here is a logical page: an ordered list of tile payloads,
//! each one either a "QDV2" wrapped chunk or a metadata/key/obfuscation
//! record. Rendering a frame to an actual image and muxing frames to video
//! is the external boundary (`crate::boundary`); this module only ever
//! produces and consumes `Vec<u8>` tile payloads.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::cipher::{envelope, privkey};
use crate::codec::{chunk, fec, frame};
use crate::error::{Error, Result};
use crate::manifest::{FecInfo, Manifest};

const META2_MAGIC: &[u8] = b"META2";
const FEC_INFO_MAGIC: &[u8] = b"FEC_INFO";
const PRIVKEY_MAGIC: &[u8] = b"PRIVKEY_AES";
const OBFS_MAGIC: &[u8] = b"OBFS1";

/// One logical frame: an ordered list of tile payloads, each up to `G^2` of
/// them.
pub type Frame = Vec<Vec<u8>>;

/// Everything about the assembled sequence the caller needs to build a
/// manifest, beyond the frames themselves.
pub struct Assembly {
    pub frames: Vec<Frame>,
    /// Final position of the sealed-private-key frame in `frames`, matching
    /// the manifest's `privkey_frame_index` field bit-for-bit (see §9).
    pub privkey_frame_index: usize,
    pub obfuscation: bool,
}

/// Builds the "META2" metadata tile: the public key, DER-encoded.
pub fn meta_record(pubkey_der: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(META2_MAGIC.len() + pubkey_der.len());
    out.extend_from_slice(META2_MAGIC);
    out.extend_from_slice(pubkey_der);
    out
}

/// Builds the "FEC_INFO" metadata tile: the FEC parameters, as JSON.
pub fn fec_info_record(info: &FecInfo) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(info)?;
    let mut out = Vec::with_capacity(FEC_INFO_MAGIC.len() + json.len());
    out.extend_from_slice(FEC_INFO_MAGIC);
    out.extend_from_slice(&json);
    Ok(out)
}

/// Derives the obfuscation seed from an auxiliary file's bytes: the first 4
/// bytes of SHA-256, big-endian.
pub fn obfuscation_seed(source: &[u8]) -> u32 {
    let digest = Sha256::digest(source);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn obfuscation_record(seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(OBFS_MAGIC.len() + 4);
    out.extend_from_slice(OBFS_MAGIC);
    out.extend_from_slice(&seed.to_be_bytes());
    out
}

/// Pulls the seed out of an "OBFS1" tile among `tiles`, if one is present.
/// Used only by the decoder's optional, non-fatal obfuscation-check.
pub fn find_obfuscation_seed(tiles: &[Vec<u8>]) -> Option<u32> {
    tiles.iter().find_map(|tile| {
        let rest = tile.strip_prefix(OBFS_MAGIC)?;
        let bytes: [u8; 4] = rest.get(0..4)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    })
}

/// Assembles wrapped chunks into the ordered frame sequence described in
/// §4.5.
///
/// `privkey_frame` is the caller's requested insertion position; it is
/// clamped to `[0, len(data_frames)]` against the data-frame list as it
/// stands *before* the metadata/private-key frames are inserted, exactly as
/// the original encoder does. If an obfuscation frame is also prepended,
/// the accounting is bumped to match — see the module-level comment and
/// SPEC_FULL.md §9 for why this arithmetic is preserved bit-for-bit rather
/// than simplified.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    wrapped_chunks: &[Vec<u8>],
    grid: u32,
    privkey_frame: usize,
    pubkey_der: &[u8],
    fec_info: &FecInfo,
    sealed_private_key: &[u8],
    obfuscation_source: Option<&[u8]>,
) -> Result<Assembly> {
    let tiles_per_frame = (grid.max(1) as usize).pow(2);
    let mut frames: Vec<Frame> = wrapped_chunks
        .chunks(tiles_per_frame)
        .map(<[Vec<u8>]>::to_vec)
        .collect();

    let meta_frame = vec![meta_record(pubkey_der), fec_info_record(fec_info)?];

    // Clamp against the data-frame list *before* any insertion, matching
    // the original encoder's `max(0, min(len(frames), privkey_frame))`.
    let mut pk_idx = privkey_frame.min(frames.len());

    frames.insert(pk_idx, meta_frame);
    frames.insert(pk_idx + 1, vec![sealed_private_key.to_vec()]);

    let mut obfuscation = false;
    if let Some(source) = obfuscation_source {
        let seed = obfuscation_seed(source);
        frames.insert(0, vec![obfuscation_record(seed)]);
        pk_idx += 1; // every existing frame shifted right by the prepend
        obfuscation = true;
    }

    // `pk_idx` now points at the metadata frame's final position; the
    // private-key frame sits immediately after it, which is what the
    // manifest's `privkey_frame_index` records.
    let privkey_frame_index = pk_idx + 1;

    Ok(Assembly {
        frames,
        privkey_frame_index,
        obfuscation,
    })
}

/// Disassembles a multiset of recovered tile byte-strings back into the
/// original plaintext (§4.6), including the final unseal (§4.1) that step 5
/// of the original algorithm folds into this stage.
///
/// `manifest` supplies `original_chunks`/`chunk_size` fallbacks when the
/// in-band "FEC_INFO" record is absent, per §4.6 step 3.
pub fn disassemble<I>(tiles: I, privkey_passphrase: &[u8], manifest: Option<&Manifest>) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let tiles: Vec<Vec<u8>> = tiles.into_iter().collect();

    // First pass: metadata, FEC parameters, the sealed private key, and the
    // (ignored) obfuscation seed, across every tile.
    let mut pubkey_der: Option<Vec<u8>> = None;
    let mut fec_info: Option<FecInfo> = None;
    let mut private_key_der: Option<secrecy::SecretSlice<u8>> = None;

    for tile in &tiles {
        if let Some(rest) = tile.strip_prefix(META2_MAGIC) {
            if pubkey_der.is_none() {
                pubkey_der = Some(rest.to_vec());
            }
        } else if let Some(rest) = tile.strip_prefix(FEC_INFO_MAGIC) {
            if fec_info.is_none() {
                fec_info = serde_json::from_slice(rest).ok();
            }
        } else if tile.starts_with(PRIVKEY_MAGIC) && private_key_der.is_none() {
            if let Ok(der) = privkey::unseal(tile, privkey_passphrase) {
                private_key_der = Some(der);
            }
        }
        // "OBFS1" tiles carry no data path information; they are only
        // consulted by the optional obfuscation-check, outside this module.
    }

    let pubkey_der =
        pubkey_der.ok_or_else(|| Error::Format("missing META2 public key record".into()))?;
    let private_key_der = private_key_der.ok_or_else(|| {
        Error::KeyUnwrap("missing, or un-unsealable, PRIVKEY_AES record".into())
    })?;

    // Second pass: QDV2 data/parity records. First accepted index wins.
    let mut received: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    let mut total: Option<u32> = None;
    for tile in &tiles {
        if let Some(wrapped) = frame::unwrap(tile) {
            if total.is_none() {
                total = Some(wrapped.total);
            }
            received.entry(wrapped.idx as usize).or_insert(wrapped.payload);
        }
    }

    let total = total.ok_or_else(|| Error::Format("no QDV2 records found".into()))?;
    let n = total as usize;

    let fec_info = fec_info.or_else(|| manifest.map(Manifest::fec_info));

    let original_chunks = fec_info.map(|info| info.original_chunks).unwrap_or(n);

    let chunk_size_fallback = fec_info
        .map(|info| info.chunk_size)
        .unwrap_or(chunk::DEFAULT_CHUNK_SIZE);

    let data_chunks = if original_chunks < n {
        fec::decode(&received, original_chunks, n, chunk_size_fallback)?
    } else {
        let mut out = Vec::with_capacity(original_chunks);
        for idx in 0..original_chunks {
            let block = received.get(&idx).cloned().ok_or_else(|| {
                Error::InsufficientBlocks {
                    have: received.len(),
                    need: original_chunks,
                }
            })?;
            out.push(block);
        }
        out
    };

    let payload = chunk::join(&data_chunks);

    let _ = crate::keys::public_key_from_der(&pubkey_der)?; // validates the META2 record parses
    let private_key = crate::keys::private_key_from_der(
        secrecy::ExposeSecret::expose_secret(&private_key_der),
    )?;
    envelope::unseal(&payload, &private_key)
}

//! Cross-chunk Reed–Solomon erasure coding (§4.3).
//!
//! Each FEC block is one shard in the `reed-solomon-erasure` sense: shard
//! `i` holds byte `p` of the length-N RS codeword for byte-column `p`, for
//! every `p` in `0..M`. The crate's shard API computes that per-byte-column
//! codeword internally — there is no manual column loop here, the shard
//! layout *is* the column-major encoding the original design describes.
//!
//! Because every erasure in this system is a whole missing block (corrupted
//! tiles are dropped by the framer's CRC check before they ever reach this
//! module), the erasure pattern is identical across every byte-column. RS
//! erasure decoding either succeeds for all columns or fails for all of
//! them, so "per-column decoder failure" (§9) reduces to a single
//! reconstruct-or-not decision, handled below by substituting NUL for every
//! output block when it fails.

use std::collections::BTreeMap;

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::error::{Error, Result};

const SPLIT: &[u8] = b"|SPLIT|";

/// `fec_ratio` is clamped to this range by callers before it reaches this
/// module; `parity_count` does not re-clamp, it only guarantees `P >= 1`.
pub const FEC_RATIO_RANGE: std::ops::RangeInclusive<f64> = 0.15..=0.35;

pub const RECOVERY_CEILING: f64 = 0.35;

/// `P = ceil(K * fec_ratio)`, with a floor of 1 parity block.
pub fn parity_count(data_chunks: usize, fec_ratio: f64) -> usize {
    ((data_chunks as f64 * fec_ratio).ceil() as usize).max(1)
}

/// Encodes `chunks` (the data blocks) into the full `N = K + P` block set,
/// with the length vector folded into block `K` as described in §3.
pub fn encode(chunks: &[Vec<u8>], fec_ratio: f64) -> Result<Vec<Vec<u8>>> {
    let k = chunks.len();
    let p = parity_count(k, fec_ratio);
    let n = k + p;
    let m = chunks.iter().map(Vec::len).max().unwrap_or(0);

    let mut shards: Vec<Vec<u8>> = Vec::with_capacity(n);
    for chunk in chunks {
        let mut padded = chunk.clone();
        padded.resize(m, 0);
        shards.push(padded);
    }
    for _ in 0..p {
        shards.push(vec![0u8; m]);
    }

    let rs = ReedSolomon::new(k, p)
        .map_err(|err| Error::Format(format!("invalid FEC geometry (k={k}, p={p}): {err}")))?;
    rs.encode(&mut shards)
        .map_err(|err| Error::Format(format!("FEC encode failed: {err}")))?;

    let lengths: Vec<usize> = chunks.iter().map(Vec::len).collect();
    let length_json = serde_json::to_vec(&lengths)?;

    let mut block_k = Vec::with_capacity(length_json.len() + SPLIT.len() + shards[k].len());
    block_k.extend_from_slice(&length_json);
    block_k.extend_from_slice(SPLIT);
    block_k.extend_from_slice(&shards[k]);
    shards[k] = block_k;

    Ok(shards)
}

/// Decodes the data blocks from a possibly-incomplete set of received FEC
/// blocks. `received` maps block index to its on-wire bytes (post length
/// stripping is done internally for block `K`). `chunk_size_fallback` is
/// used as `M` when the length vector carried by block `K` is unavailable
/// or unparsable.
pub fn decode(
    received: &BTreeMap<usize, Vec<u8>>,
    k: usize,
    n: usize,
    chunk_size_fallback: usize,
) -> Result<Vec<Vec<u8>>> {
    let p = n - k;
    let missing = n - received.len();
    if n > 0 && (missing as f64 / n as f64) > RECOVERY_CEILING {
        return Err(Error::RecoveryLimit { missing, total: n });
    }

    let mut received = received.clone();
    let lengths = extract_length_vector(&mut received, k, chunk_size_fallback);
    let m = lengths.iter().copied().max().unwrap_or(chunk_size_fallback);

    if received.len() < k {
        return Err(Error::InsufficientBlocks {
            have: received.len(),
            need: k,
        });
    }

    let mut shards: Vec<Option<Vec<u8>>> = vec![None; n];
    for (&idx, bytes) in &received {
        if idx >= n {
            continue;
        }
        let mut padded = bytes.clone();
        padded.resize(m, 0);
        shards[idx] = Some(padded);
    }

    let rs = ReedSolomon::new(k, p)
        .map_err(|err| Error::Format(format!("invalid FEC geometry (k={k}, p={p}): {err}")))?;

    if rs.reconstruct_data(&mut shards).is_err() {
        // Every column fails identically (see module docs); substitute NUL
        // bytes and let the AEAD layer downstream catch the corruption.
        return Ok(lengths.iter().map(|&len| vec![0u8; len]).collect());
    }

    let mut out = Vec::with_capacity(k);
    for (i, len) in lengths.iter().enumerate() {
        let mut block = shards[i]
            .take()
            .expect("data shard present after successful reconstruct");
        block.truncate(*len);
        out.push(block);
    }
    Ok(out)
}

/// Pulls the length vector `L` out of block `K`, replacing it in `received`
/// with its stripped parity suffix. Falls back to `[chunk_size; k]` if block
/// `K` is missing or its length header doesn't parse.
fn extract_length_vector(
    received: &mut BTreeMap<usize, Vec<u8>>,
    k: usize,
    chunk_size_fallback: usize,
) -> Vec<usize> {
    let Some(block_k) = received.get(&k) else {
        return vec![chunk_size_fallback; k];
    };

    let Some(split_at) = find_subslice(block_k, SPLIT) else {
        return vec![chunk_size_fallback; k];
    };

    let (length_json, rest) = block_k.split_at(split_at);
    let parity_bytes = rest[SPLIT.len()..].to_vec();

    match serde_json::from_slice::<Vec<usize>>(length_json) {
        Ok(lengths) if lengths.len() == k => {
            received.insert(k, parity_bytes);
            lengths
        }
        _ => vec![chunk_size_fallback; k],
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

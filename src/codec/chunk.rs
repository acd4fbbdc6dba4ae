//! Chunker (§4.2): splits the sealed envelope into fixed-size chunks, and
//! joins them back. Deterministic, order-preserving, no padding.

/// Default `chunk_size` used when the caller doesn't override it (matches
/// the original system's nominal chunk size, and the fallback used when a
/// decode loses the FEC length vector).
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Splits `data` into chunks of exactly `chunk_size` bytes, except possibly
/// the last, which is in `(0, chunk_size]`. An empty input yields a single
/// empty chunk, so that `K >= 1` always holds downstream.
pub fn split(data: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    assert!(chunk_size > 0, "chunk_size must be positive");
    if data.is_empty() {
        return vec![Vec::new()];
    }
    data.chunks(chunk_size).map(<[u8]>::to_vec).collect()
}

/// Concatenates chunks in index order.
pub fn join(chunks: &[Vec<u8>]) -> Vec<u8> {
    chunks.concat()
}

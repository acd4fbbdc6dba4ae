//! Manifest JSON (§3): an optional out-of-band side-channel recording
//! geometry and parameters. The decoder must succeed without it; it exists
//! as a fallback hint and as an oracle for tests.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub w: u32,
    pub h: u32,
}

/// FEC parameters, shared shape between the in-band "FEC_INFO" tile record
/// and the manifest's corresponding fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FecInfo {
    pub original_chunks: usize,
    pub total_chunks: usize,
    pub fec_ratio: f64,
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub file_sha256: String,
    pub frames: usize,
    pub grid: u32,
    pub fps: u32,
    pub resolution: Resolution,
    pub privkey_frame_index: usize,
    /// DER-encoded public key, base64 (not PEM — see SPEC_FULL §3).
    pub pubkey_serialized: String,
    pub encryption: String,
    pub fec_enabled: bool,
    pub fec_ratio: f64,
    pub original_chunks: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub obfuscation: bool,
}

impl Manifest {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The FEC fields restated in [`FecInfo`] shape, used as a decode-side
    /// fallback when the in-band "FEC_INFO" record is missing.
    pub fn fec_info(&self) -> FecInfo {
        FecInfo {
            original_chunks: self.original_chunks,
            total_chunks: self.total_chunks,
            fec_ratio: self.fec_ratio,
            chunk_size: self.chunk_size,
        }
    }
}

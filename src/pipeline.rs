//! Top-level encode/decode orchestration (§2), tying `keys`, `cipher`,
//! `codec`, and `boundary` together behind the CLI. Each invocation owns a
//! fresh temp directory via `tempfile::TempDir`, removed on every exit path
//! including early `?`-propagated errors.

use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::boundary::barcode::BarcodeCodec;
use crate::boundary::muxer::VideoMuxer;
use crate::cipher::{envelope, privkey};
use crate::codec::{assembly, chunk, fec, frame};
use crate::error::Result;
use crate::keys::KeyPair;
use crate::manifest::{FecInfo, Manifest, Resolution};

pub struct EncodeOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub manifest: PathBuf,
    pub grid: u32,
    pub fps: u32,
    pub resolution: Resolution,
    pub enable_fec: bool,
    pub fec_ratio: f64,
    pub passphrase: String,
    pub pubkey_hint: String,
    pub privkey_frame: usize,
    pub privkey_frame_pass: String,
    pub obfuscation: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct EncodeStats {
    pub original_chunks: usize,
    pub total_chunks: usize,
    pub frames: usize,
    pub fec_ratio: f64,
    pub output_bytes: u64,
}

/// Runs the full encoder pipeline: seal, chunk, FEC-encode, frame, wrap the
/// private key, assemble frames, render+mux via the boundary, and write the
/// manifest.
pub fn encode_file(
    opts: &EncodeOptions,
    barcode: &dyn BarcodeCodec,
    muxer: &dyn VideoMuxer,
) -> Result<EncodeStats> {
    let plaintext = fs::read(&opts.input)?;
    let file_sha256 = hex_sha256(&plaintext);
    tracing::debug!(bytes = plaintext.len(), %file_sha256, "read input file");

    // Carried only as a provenance note in the manifest's intent (§6); the
    // codec itself never branches on it.
    let _ = &opts.pubkey_hint;

    let pair = KeyPair::generate()?;
    let sealed_payload = envelope::seal(&plaintext, opts.passphrase.as_bytes(), &pair.public)?;

    let chunks = chunk::split(&sealed_payload, chunk::DEFAULT_CHUNK_SIZE);
    let k = chunks.len();

    let (blocks, fec_ratio) = if opts.enable_fec {
        let ratio = opts
            .fec_ratio
            .clamp(*fec::FEC_RATIO_RANGE.start(), *fec::FEC_RATIO_RANGE.end());
        (fec::encode(&chunks, ratio)?, ratio)
    } else {
        (chunks.clone(), 0.0)
    };
    let n = blocks.len();
    tracing::debug!(k, n, fec_ratio, "chunked and FEC-encoded the sealed payload");

    let wrapped: Vec<Vec<u8>> = blocks
        .iter()
        .enumerate()
        .map(|(idx, block)| {
            let kind = if idx < k {
                frame::Kind::Data
            } else {
                frame::Kind::Parity
            };
            frame::wrap(idx as u32, n as u32, kind, block)
        })
        .collect::<Result<_>>()?;

    let fec_info = FecInfo {
        original_chunks: k,
        total_chunks: n,
        fec_ratio,
        chunk_size: chunk::DEFAULT_CHUNK_SIZE,
    };

    let public_key_der = pair.public_key_der()?;
    let private_key_der = pair.private_key_der();
    let sealed_private_key = privkey::seal(
        private_key_der.expose_secret(),
        opts.privkey_frame_pass.as_bytes(),
    )?;

    let obfuscation_bytes = opts.obfuscation.as_deref().map(fs::read).transpose()?;

    let assembled = assembly::assemble(
        &wrapped,
        opts.grid,
        opts.privkey_frame,
        &public_key_der,
        &fec_info,
        &sealed_private_key,
        obfuscation_bytes.as_deref(),
    )?;
    tracing::debug!(
        frames = assembled.frames.len(),
        privkey_frame_index = assembled.privkey_frame_index,
        "assembled frame sequence"
    );

    let workdir = tempfile::tempdir()?;
    let frame_dir = workdir.path().join("frames");
    fs::create_dir_all(&frame_dir)?;

    for (frame_idx, tiles) in assembled.frames.iter().enumerate() {
        let tile_dir = workdir.path().join(format!("tiles-{frame_idx:06}"));
        fs::create_dir_all(&tile_dir)?;

        let mut tile_paths = Vec::with_capacity(tiles.len());
        for (tile_idx, payload) in tiles.iter().enumerate() {
            let tile_path = tile_dir.join(format!("{tile_idx:02}.png"));
            barcode.encode_tile(payload, &tile_path)?;
            tile_paths.push(tile_path);
        }

        let frame_path = frame_dir.join(format!("{frame_idx:06}.png"));
        barcode.compose_frame(&tile_paths, opts.grid, &frame_path)?;
    }

    muxer.mux(&frame_dir, opts.fps, &opts.output)?;

    let manifest = Manifest {
        version: "2.0".into(),
        file_sha256,
        frames: assembled.frames.len(),
        grid: opts.grid,
        fps: opts.fps,
        resolution: opts.resolution,
        privkey_frame_index: assembled.privkey_frame_index,
        pubkey_serialized: base64::engine::general_purpose::STANDARD.encode(&public_key_der),
        encryption: "AES-256-GCM".into(),
        fec_enabled: opts.enable_fec,
        fec_ratio,
        original_chunks: k,
        total_chunks: n,
        chunk_size: chunk::DEFAULT_CHUNK_SIZE,
        obfuscation: assembled.obfuscation,
    };
    fs::write(&opts.manifest, manifest.to_json()?)?;

    let output_bytes = fs::metadata(&opts.output)?.len();
    Ok(EncodeStats {
        original_chunks: k,
        total_chunks: n,
        frames: assembled.frames.len(),
        fec_ratio,
        output_bytes,
    })
}

pub struct DecodeOptions {
    pub video: PathBuf,
    pub output: PathBuf,
    pub manifest: Option<PathBuf>,
    pub privkey_frame_password: String,
    pub obfuscation_check: Option<PathBuf>,
}

/// Runs the full decoder pipeline: extract frames via the boundary, scan
/// every frame for barcodes, disassemble, and write the recovered plaintext.
pub fn decode_file(
    opts: &DecodeOptions,
    barcode: &dyn BarcodeCodec,
    muxer: &dyn VideoMuxer,
) -> Result<()> {
    let manifest = opts
        .manifest
        .as_ref()
        .map(|path| -> Result<Manifest> { Manifest::from_json(&fs::read_to_string(path)?) })
        .transpose()?;

    let workdir = tempfile::tempdir()?;
    let frame_dir = workdir.path().join("frames");
    fs::create_dir_all(&frame_dir)?;

    let frame_paths = muxer.extract(&opts.video, &frame_dir)?;
    tracing::debug!(frames = frame_paths.len(), "extracted frames from video");

    let mut tiles: Vec<Vec<u8>> = Vec::new();
    for path in &frame_paths {
        match barcode.decode_frame(path) {
            Ok(found) => tiles.extend(found),
            Err(err) => tracing::warn!(frame = %path.display(), error = %err, "dropping unreadable frame"),
        }
    }

    if let Some(aux_path) = &opts.obfuscation_check {
        check_obfuscation(&tiles, aux_path)?;
    }

    let plaintext = assembly::disassemble(
        tiles,
        opts.privkey_frame_password.as_bytes(),
        manifest.as_ref(),
    )?;

    if let Some(manifest) = &manifest {
        let actual = hex_sha256(&plaintext);
        if actual != manifest.file_sha256 {
            tracing::warn!(
                expected = %manifest.file_sha256,
                actual = %actual,
                "recovered file does not match the manifest's checksum"
            );
        }
    }

    fs::write(&opts.output, &plaintext)?;
    Ok(())
}

/// Recomputes the obfuscation seed from `aux_path` and compares it against
/// the one carried by an "OBFS1" tile, if any. A mismatch is logged, never
/// fatal — this is a provenance hint, not an integrity gate (§3).
fn check_obfuscation(tiles: &[Vec<u8>], aux_path: &std::path::Path) -> Result<()> {
    let Some(seed) = assembly::find_obfuscation_seed(tiles) else {
        tracing::warn!("no obfuscation frame found to check against");
        return Ok(());
    };
    let aux_bytes = fs::read(aux_path)?;
    let expected = assembly::obfuscation_seed(&aux_bytes);
    if seed != expected {
        tracing::warn!(seed, expected, "obfuscation seed mismatch");
    }
    Ok(())
}

fn hex_sha256(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Concatenates frame files length-prefixed instead of actually
    /// encoding a video, so pipeline tests can round-trip without `ffmpeg`.
    struct FakeMuxer;

    impl VideoMuxer for FakeMuxer {
        fn mux(&self, frame_dir: &std::path::Path, _fps: u32, output: &std::path::Path) -> Result<()> {
            let mut names: Vec<_> = fs::read_dir(frame_dir)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .collect();
            names.sort();

            let mut out = Vec::new();
            for path in names {
                let bytes = fs::read(path)?;
                out.extend((bytes.len() as u32).to_be_bytes());
                out.extend(bytes);
            }
            fs::write(output, out)?;
            Ok(())
        }

        fn extract(
            &self,
            video: &std::path::Path,
            frame_dir: &std::path::Path,
        ) -> Result<Vec<PathBuf>> {
            let data = fs::read(video)?;
            let mut offset = 0;
            let mut paths = Vec::new();
            let mut idx = 0;
            while offset + 4 <= data.len() {
                let len = u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
                offset += 4;
                let bytes = &data[offset..offset + len];
                offset += len;
                let path = frame_dir.join(format!("{idx:06}.png"));
                fs::write(&path, bytes)?;
                paths.push(path);
                idx += 1;
            }
            Ok(paths)
        }
    }

    struct IdentityBarcode;

    impl BarcodeCodec for IdentityBarcode {
        fn encode_tile(&self, payload: &[u8], path: &std::path::Path) -> Result<()> {
            fs::write(path, payload)?;
            Ok(())
        }

        fn compose_frame(
            &self,
            tile_paths: &[PathBuf],
            _grid: u32,
            output: &std::path::Path,
        ) -> Result<()> {
            // Length-prefixed, not newline-delimited: tile payloads here are
            // real ciphertext/DER bytes that may contain any byte value.
            let mut out = Vec::new();
            for path in tile_paths {
                let bytes = fs::read(path)?;
                out.extend((bytes.len() as u32).to_be_bytes());
                out.extend(bytes);
            }
            fs::write(output, out)?;
            Ok(())
        }

        fn decode_frame(&self, path: &std::path::Path) -> Result<Vec<Vec<u8>>> {
            let data = fs::read(path)?;
            let mut offset = 0;
            let mut tiles = Vec::new();
            while offset + 4 <= data.len() {
                let len = u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
                offset += 4;
                tiles.push(data[offset..offset + len].to_vec());
                offset += len;
            }
            Ok(tiles)
        }
    }

    #[test]
    fn encode_writes_manifest_and_stats_agree_with_chunk_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        fs::write(&input, vec![0x5Au8; 5000]).unwrap();

        let opts = EncodeOptions {
            input,
            output: dir.path().join("out.mp4"),
            manifest: dir.path().join("manifest.json"),
            grid: 2,
            fps: 60,
            resolution: Resolution { w: 1280, h: 720 },
            enable_fec: true,
            fec_ratio: 0.3,
            passphrase: "pw".into(),
            pubkey_hint: "tester".into(),
            privkey_frame: 0,
            privkey_frame_pass: "pk".into(),
            obfuscation: None,
        };

        let stats = encode_file(&opts, &IdentityBarcode, &FakeMuxer).unwrap();
        assert!(stats.total_chunks >= stats.original_chunks);
        assert!(stats.frames >= 1);

        let manifest_json = fs::read_to_string(&opts.manifest).unwrap();
        let manifest = Manifest::from_json(&manifest_json).unwrap();
        assert_eq!(manifest.original_chunks, stats.original_chunks);
        assert_eq!(manifest.total_chunks, stats.total_chunks);
    }

    #[test]
    fn encode_then_decode_round_trips_the_original_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let original = (0..3000).map(|i| (i % 251) as u8).collect::<Vec<u8>>();
        fs::write(&input, &original).unwrap();

        let encode_opts = EncodeOptions {
            input,
            output: dir.path().join("out.mp4"),
            manifest: dir.path().join("manifest.json"),
            grid: 2,
            fps: 30,
            resolution: Resolution { w: 1280, h: 720 },
            enable_fec: true,
            fec_ratio: 0.3,
            passphrase: "payload-pass".into(),
            pubkey_hint: "tester".into(),
            privkey_frame: 1,
            privkey_frame_pass: "priv-pass".into(),
            obfuscation: None,
        };
        encode_file(&encode_opts, &IdentityBarcode, &FakeMuxer).unwrap();

        let decode_opts = DecodeOptions {
            video: encode_opts.output.clone(),
            output: dir.path().join("decoded.bin"),
            manifest: Some(encode_opts.manifest.clone()),
            privkey_frame_password: "priv-pass".into(),
            obfuscation_check: None,
        };
        decode_file(&decode_opts, &IdentityBarcode, &FakeMuxer).unwrap();

        let decoded = fs::read(&decode_opts.output).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_without_manifest_still_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        fs::write(&input, b"manifest-optional payload").unwrap();

        let encode_opts = EncodeOptions {
            input,
            output: dir.path().join("out.mp4"),
            manifest: dir.path().join("manifest.json"),
            grid: 1,
            fps: 30,
            resolution: Resolution { w: 1280, h: 720 },
            enable_fec: false,
            fec_ratio: 0.3,
            passphrase: "payload-pass".into(),
            pubkey_hint: "tester".into(),
            privkey_frame: 0,
            privkey_frame_pass: "priv-pass".into(),
            obfuscation: None,
        };
        encode_file(&encode_opts, &IdentityBarcode, &FakeMuxer).unwrap();

        let decode_opts = DecodeOptions {
            video: encode_opts.output.clone(),
            output: dir.path().join("decoded.bin"),
            manifest: None,
            privkey_frame_password: "priv-pass".into(),
            obfuscation_check: None,
        };
        decode_file(&decode_opts, &IdentityBarcode, &FakeMuxer).unwrap();

        let decoded = fs::read(&decode_opts.output).unwrap();
        assert_eq!(decoded, b"manifest-optional payload");
    }
}

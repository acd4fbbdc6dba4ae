//! Rasterizing tile payloads into barcode images, compositing a logical
//! frame's tiles into one picture, and reading a frame's barcodes back
//! (§1: pixel-level rendering is out of scope for this crate's own logic).
//! [`BarcodeCodec`] is the seam; [`ProcessBarcodeCodec`] is the default
//! implementation, shelling out to real external tools the way the
//! original system's `qrcode`/`pyzbar`/PIL dependencies did.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

pub trait BarcodeCodec {
    /// Writes a barcode image encoding `payload` to `path`.
    fn encode_tile(&self, payload: &[u8], path: &Path) -> Result<()>;

    /// Composites the individual tile images at `tile_paths` into a single
    /// `grid` x `grid` frame image at `output`, the inverse of the original
    /// encoder's canvas-paste step.
    fn compose_frame(&self, tile_paths: &[PathBuf], grid: u32, output: &Path) -> Result<()>;

    /// Scans a frame image for every barcode it contains, returning one
    /// payload per barcode found. Order is not meaningful — callers recover
    /// position from the payload's own framing (§4.4), not from scan order.
    fn decode_frame(&self, path: &Path) -> Result<Vec<Vec<u8>>>;
}

/// Shells out to `qrencode` (rasterize), `montage` (grid composite, from
/// ImageMagick) and `zbarimg` (multi-barcode scan). Command names are
/// overridable so tests can point at stubs.
pub struct ProcessBarcodeCodec {
    pub encode_cmd: String,
    pub compose_cmd: String,
    pub decode_cmd: String,
}

impl Default for ProcessBarcodeCodec {
    fn default() -> Self {
        Self {
            encode_cmd: std::env::var("QR_ENCODE_CMD").unwrap_or_else(|_| "qrencode".into()),
            compose_cmd: std::env::var("QR_COMPOSE_CMD").unwrap_or_else(|_| "montage".into()),
            decode_cmd: std::env::var("QR_DECODE_CMD").unwrap_or_else(|_| "zbarimg".into()),
        }
    }
}

impl BarcodeCodec for ProcessBarcodeCodec {
    fn encode_tile(&self, payload: &[u8], path: &Path) -> Result<()> {
        let mut child = Command::new(&self.encode_cmd)
            .arg("-o")
            .arg(path)
            .arg("-8")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| Error::Dependency(format!("'{}': {err}", self.encode_cmd)))?;

        child
            .stdin
            .take()
            .expect("child spawned with piped stdin")
            .write_all(payload)?;

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Dependency(format!(
                "'{}' exited with {status}",
                self.encode_cmd
            )));
        }
        Ok(())
    }

    fn compose_frame(&self, tile_paths: &[PathBuf], grid: u32, output: &Path) -> Result<()> {
        if tile_paths.len() == 1 {
            std::fs::copy(&tile_paths[0], output)?;
            return Ok(());
        }

        let tile_spec = format!("{grid}x{grid}");
        let status = Command::new(&self.compose_cmd)
            .args(tile_paths)
            .arg("-tile")
            .arg(&tile_spec)
            .arg("-geometry")
            .arg("+0+0")
            .arg("-background")
            .arg("white")
            .arg(output)
            .status()
            .map_err(|err| Error::Dependency(format!("'{}': {err}", self.compose_cmd)))?;

        if !status.success() {
            return Err(Error::Dependency(format!(
                "'{}' exited with {status}",
                self.compose_cmd
            )));
        }
        Ok(())
    }

    fn decode_frame(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let output = Command::new(&self.decode_cmd)
            .arg("--raw")
            .arg("-q")
            .arg(path)
            .output()
            .map_err(|err| Error::Dependency(format!("'{}': {err}", self.decode_cmd)))?;

        if !output.status.success() {
            // zbarimg exits non-zero when it finds nothing to decode; an
            // unreadable or blank frame just yields zero candidate tiles.
            return Ok(Vec::new());
        }

        // `--raw` emits one line per detected symbol. Binary payloads that
        // happen to contain a newline byte would corrupt this delimiter —
        // a known sharp edge of driving zbarimg over stdout text rather
        // than a proper binding, accepted here since rendering/scanning is
        // out of scope for this crate's own correctness guarantees.
        Ok(output
            .stdout
            .split(|&byte| byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect())
    }
}

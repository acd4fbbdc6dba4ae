//! Library crate backing the `vidvault` binary: the codec core (§2-§4),
//! its cryptographic envelopes, the external-process boundary, and the
//! top-level pipeline orchestration. `cmd` (CLI parsing and command
//! dispatch) lives here too so the `tests/` integration suite can drive
//! the pipeline directly without shelling out to the binary when
//! `ffmpeg`/a barcode tool aren't available on `PATH`.

pub mod boundary;
pub mod cipher;
pub mod cmd;
pub mod codec;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod pipeline;

//! CLI command implementations: thin adapters between parsed [`cli::Args`]
//! and [`crate::pipeline`], matching the original scripts' stdout/stderr
//! contract (§6) with a `Result<(), i32>` exit-code convention.

pub mod cli;
pub mod ui;

use crate::boundary::barcode::ProcessBarcodeCodec;
use crate::boundary::muxer::FfmpegMuxer;
use crate::error::Error;
use crate::pipeline::{self, DecodeOptions, EncodeOptions};
use ui::color::Color;

pub fn encode(args: cli::EncodeArgs) -> Result<(), i32> {
    let opts = EncodeOptions {
        input: args.input,
        output: args.output,
        manifest: args.manifest,
        grid: args.grid,
        fps: args.fps,
        resolution: args.resolution,
        enable_fec: args.enable_fec,
        fec_ratio: args.fec_ratio,
        passphrase: args.passphrase,
        pubkey_hint: args.pubkey_hint,
        privkey_frame: args.privkey_frame,
        privkey_frame_pass: args.privkey_frame_pass,
        obfuscation: args.obfuscation,
    };

    let barcode = ProcessBarcodeCodec::default();
    let muxer = FfmpegMuxer::default();

    match pipeline::encode_file(&opts, &barcode, &muxer) {
        Ok(stats) => {
            println!("{}", encode_success_json(&stats));
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.exit_code())
        }
    }
}

pub fn decode(args: cli::DecodeArgs) -> Result<(), i32> {
    let output = args.output.clone();
    let opts = DecodeOptions {
        video: args.video,
        output: args.output,
        manifest: args.manifest,
        privkey_frame_password: args.privkey_frame_password,
        obfuscation_check: args.obfuscation_check,
    };

    let barcode = ProcessBarcodeCodec::default();
    let muxer = FfmpegMuxer::default();

    match pipeline::decode_file(&opts, &barcode, &muxer) {
        Ok(()) => {
            println!(
                "File decrypted successfully: {path}",
                path = output.display()
            );
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.exit_code())
        }
    }
}

fn encode_success_json(stats: &pipeline::EncodeStats) -> String {
    serde_json::json!({
        "ok": true,
        "stats": {
            "original_chunks": stats.original_chunks,
            "total_chunks": stats.total_chunks,
            "frames": stats.frames,
            "fec_ratio": stats.fec_ratio,
            "output_bytes": stats.output_bytes,
        },
    })
    .to_string()
}

fn report_failure(err: &Error) {
    println!(
        "{}",
        serde_json::json!({"ok": false, "error": err.to_string()})
    );
    eprintln!("{}", Color::error(&format!("fatal: {err}")));
}

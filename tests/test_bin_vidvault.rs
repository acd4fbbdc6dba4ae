mod utils;

use utils::{checksum, command_exists, run, temp_path, write_temp_file};

#[test]
fn no_arguments_prints_short_help_and_succeeds() {
    let output = run(&[]);
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("Usage:"));
}

#[test]
fn short_help_flag_prints_usage() {
    let output = run(&["-h"]);
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("encode"));
    assert!(output.stdout.contains("decode"));
}

#[test]
fn long_help_flag_documents_every_flag() {
    let output = run(&["--help"]);
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("--passphrase"));
    assert!(output.stdout.contains("--privkey-frame-password"));
}

#[test]
fn version_flag_prints_package_name() {
    let output = run(&["-V"]);
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("vidvault"));
}

#[test]
fn unknown_argument_exits_with_usage_error() {
    let output = run(&["bogus"]);
    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("bogus"));
}

#[test]
fn encode_missing_required_flag_exits_with_usage_error() {
    let output = run(&["encode", "--input", "in.bin"]);
    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("--output"));
}

#[test]
fn encode_unreadable_input_reports_a_dependency_free_failure() {
    let input = temp_path("does-not-exist.bin");
    let output_video = temp_path("encode_unreadable_input.mp4");
    let manifest = temp_path("encode_unreadable_input.json");

    let output = run(&[
        "encode",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output_video.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--passphrase",
        "hunter2",
        "--pubkey-hint",
        "test",
        "--privkey-frame-pass",
        "pk-pass",
    ]);

    assert_eq!(output.exit_code, 1);
    assert!(output.stdout.contains("\"ok\":false"));
}

/// Drives the full encoder and decoder against a real `ffmpeg` and
/// `qrencode`/`zbarimg`/`montage` toolchain, skipping gracefully when any of
/// them aren't on `PATH` rather than failing the suite on a bare CI image.
#[test]
fn encode_then_decode_round_trips_a_real_file_through_real_tools() {
    for tool in ["ffmpeg", "qrencode", "montage", "zbarimg"] {
        if !command_exists(tool) {
            eprintln!("skipping: '{tool}' not found on PATH");
            return;
        }
    }

    let input = write_temp_file(
        "round_trip_input.txt",
        b"the quick brown fox jumps over the lazy dog, repeated for bulk: \
          the quick brown fox jumps over the lazy dog",
    );
    let video = temp_path("round_trip.mp4");
    let manifest = temp_path("round_trip.manifest.json");
    let recovered = temp_path("round_trip_recovered.txt");

    let encode_output = run(&[
        "encode",
        "--input",
        input.to_str().unwrap(),
        "--output",
        video.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--grid",
        "1",
        "--fps",
        "2",
        "--resolution",
        "720p",
        "--passphrase",
        "correct horse battery staple",
        "--pubkey-hint",
        "integration-test",
        "--privkey-frame-pass",
        "privkey-pass",
    ]);
    assert_eq!(
        encode_output.exit_code, 0,
        "encode failed: {}",
        encode_output.stderr
    );
    assert!(encode_output.stdout.contains("\"ok\":true"));

    let decode_output = run(&[
        "decode",
        "--video",
        video.to_str().unwrap(),
        "--output",
        recovered.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--privkey-frame-password",
        "privkey-pass",
    ]);
    assert_eq!(
        decode_output.exit_code, 0,
        "decode failed: {}",
        decode_output.stderr
    );

    assert_eq!(checksum(&input), checksum(&recovered));
}

/// Same toolchain gate as above: a wrong private-key-frame passphrase must
/// not silently recover the file.
#[test]
fn decode_with_wrong_privkey_passphrase_fails_closed() {
    for tool in ["ffmpeg", "qrencode", "montage", "zbarimg"] {
        if !command_exists(tool) {
            eprintln!("skipping: '{tool}' not found on PATH");
            return;
        }
    }

    let input = write_temp_file("wrong_pass_input.txt", b"top secret contents");
    let video = temp_path("wrong_pass.mp4");
    let manifest = temp_path("wrong_pass.manifest.json");
    let recovered = temp_path("wrong_pass_recovered.txt");

    let encode_output = run(&[
        "encode",
        "--input",
        input.to_str().unwrap(),
        "--output",
        video.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--grid",
        "1",
        "--fps",
        "2",
        "--resolution",
        "720p",
        "--passphrase",
        "correct horse battery staple",
        "--pubkey-hint",
        "integration-test",
        "--privkey-frame-pass",
        "the-real-password",
    ]);
    assert_eq!(encode_output.exit_code, 0);

    let decode_output = run(&[
        "decode",
        "--video",
        video.to_str().unwrap(),
        "--output",
        recovered.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--privkey-frame-password",
        "definitely-not-the-password",
    ]);

    assert_ne!(decode_output.exit_code, 0);
    assert!(!recovered.exists());
}

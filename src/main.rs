use std::env;
use std::process;

use lessify::Pager;

use vidvault::cmd::{self, cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match cli::Args::build_from_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {err}.");
            println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
            process::exit(2);
        }
    };

    if args.long_help {
        long_help();
    } else if args.short_help {
        short_help();
    } else if args.version {
        version();
    } else if let Some(command) = args.command {
        if let Err(code) = match command {
            cli::Command::Encode(encode_args) => cmd::encode(encode_args),
            cli::Command::Decode(decode_args) => cmd::decode(decode_args),
        } {
            process::exit(code);
        }
    } else {
        // No arguments.
        short_help();
    }
}

fn short_help() {
    println!("{}", short_help_message());
    println!(
        "For full help, see `{bin} --help`.",
        bin = env!("CARGO_BIN_NAME")
    );
}

fn short_help_message() -> String {
    format!(
        "\
{description}

Usage: {bin} <command> [<options>]

Commands:
  encode                 Seal, FEC-encode, and render a file to a barcode video
  decode                 Recover a file from a barcode video

Options:
  -h, --help             Show this message and exit
  -V, --version          Show the version and exit

Set RUST_LOG to control diagnostic verbosity (e.g. RUST_LOG=debug).
",
        description = env!("CARGO_PKG_DESCRIPTION"),
        bin = env!("CARGO_BIN_NAME"),
    )
}

#[allow(clippy::too_many_lines)]
fn long_help() {
    Pager::page_or_print(&format!(
        "\
{help}
Encode options:
  --input <path>                File to encode (required)
  --output <path>                Video file to write (required)
  --manifest <path>               Manifest JSON to write (required)
  --grid <n>                     Tiles per frame side, G x G (default: 2)
  --fps <n>                       Output video frame rate (default: 60)
  --resolution <preset>           720p, 1080p, or 2160p/4k (default: 1080p)
  --width <px> --height <px>     Explicit resolution, overrides --resolution
  --enable-fec <bool>             Enable cross-chunk FEC (default: true)
  --fec-ratio <0.15-0.35>          Parity fraction (default: 0.3)
  --passphrase <string>           Payload passphrase (required)
  --pubkey-hint <string>          Provenance note, not used to gate decoding (required)
  --privkey-frame <n>             Private-key frame insertion index (default: 0)
  --privkey-frame-pass <string>   Private-key frame passphrase (required)
  --obfuscation <path>             Auxiliary file to derive an obfuscation frame from

Decode options:
  --video <path>                   Video file to read (required)
  --output <path>                   File to write (required)
  --manifest <path>                  Manifest JSON, used as a fallback hint
  --privkey-frame-password <s>      Private-key frame passphrase (required)
  --obfuscation-check <path>         Auxiliary file to verify the obfuscation seed against

What does {package} do?
  Encodes a file into an encrypted, forward-error-corrected barcode video,
  and decodes such a video back into the original file.
",
        help = short_help_message(),
        package = env!("CARGO_PKG_NAME"),
    ));
}

fn version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

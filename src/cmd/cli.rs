//! Hand-rolled flag parser (§6): no external arg-parsing crate, just a
//! `while let` loop matching on `&str` and consuming the next token as a
//! flag's value.

use std::path::PathBuf;

use crate::manifest::Resolution;

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeArgs {
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

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeArgs {
    pub video: PathBuf,
    pub output: PathBuf,
    pub manifest: Option<PathBuf>,
    pub privkey_frame_password: String,
    pub obfuscation_check: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Encode(EncodeArgs),
    Decode(DecodeArgs),
}

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub command: Option<Command>,
    pub short_help: bool,
    pub long_help: bool,
    pub version: bool,
}

/// Raw, not-yet-validated flag values collected while scanning the
/// `encode` subcommand's arguments.
struct RawEncode {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    manifest: Option<PathBuf>,
    grid: u32,
    fps: u32,
    resolution: String,
    width: Option<u32>,
    height: Option<u32>,
    enable_fec: bool,
    fec_ratio: f64,
    passphrase: Option<String>,
    pubkey_hint: Option<String>,
    privkey_frame: usize,
    privkey_frame_pass: Option<String>,
    obfuscation: Option<PathBuf>,
}

impl Default for RawEncode {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            manifest: None,
            grid: 2,
            fps: 60,
            resolution: "1080p".into(),
            width: None,
            height: None,
            enable_fec: true,
            fec_ratio: 0.3,
            passphrase: None,
            pubkey_hint: None,
            privkey_frame: 0,
            privkey_frame_pass: None,
            obfuscation: None,
        }
    }
}

#[derive(Default)]
struct RawDecode {
    video: Option<PathBuf>,
    output: Option<PathBuf>,
    manifest: Option<PathBuf>,
    privkey_frame_password: Option<String>,
    obfuscation_check: Option<PathBuf>,
}

impl Args {
    pub fn build_from_args<I>(mut cli_args: I) -> Result<Self, String>
    where
        I: Iterator<Item: AsRef<str> + ToString>,
    {
        let mut args = Self::default();

        while let Some(arg) = cli_args.next() {
            let some_command = args.command.is_some();

            match arg.as_ref() {
                "encode" if !some_command => {
                    args.command = Some(Command::Encode(parse_encode(&mut cli_args)?));
                }
                "decode" if !some_command => {
                    args.command = Some(Command::Decode(parse_decode(&mut cli_args)?));
                }
                "-h" => args.short_help = true,
                "--help" => args.long_help = true,
                "-V" | "--version" => args.version = true,
                unknown => {
                    return Err(format!("Unknown argument: '{unknown}'"));
                }
            }
        }

        Ok(args)
    }
}

fn next_value<I>(cli_args: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item: AsRef<str> + ToString>,
{
    cli_args
        .next()
        .map(|value| value.to_string())
        .ok_or_else(|| format!("Missing value for '{flag}'"))
}

fn parse_u32(flag: &str, value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid integer for '{flag}': '{value}'"))
}

fn parse_usize(flag: &str, value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid integer for '{flag}': '{value}'"))
}

fn parse_f64(flag: &str, value: &str) -> Result<f64, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid number for '{flag}': '{value}'"))
}

fn parse_bool(flag: &str, value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("Invalid boolean for '{flag}': '{value}'")),
    }
}

fn parse_encode<I>(cli_args: &mut I) -> Result<EncodeArgs, String>
where
    I: Iterator<Item: AsRef<str> + ToString>,
{
    let mut raw = RawEncode::default();

    while let Some(arg) = cli_args.next() {
        match arg.as_ref() {
            "--input" => raw.input = Some(PathBuf::from(next_value(cli_args, "--input")?)),
            "--output" => raw.output = Some(PathBuf::from(next_value(cli_args, "--output")?)),
            "--manifest" => {
                raw.manifest = Some(PathBuf::from(next_value(cli_args, "--manifest")?));
            }
            "--grid" => raw.grid = parse_u32("--grid", &next_value(cli_args, "--grid")?)?,
            "--fps" => raw.fps = parse_u32("--fps", &next_value(cli_args, "--fps")?)?,
            "--resolution" => raw.resolution = next_value(cli_args, "--resolution")?,
            "--width" => {
                raw.width = Some(parse_u32("--width", &next_value(cli_args, "--width")?)?);
            }
            "--height" => {
                raw.height = Some(parse_u32("--height", &next_value(cli_args, "--height")?)?);
            }
            "--enable-fec" => {
                raw.enable_fec =
                    parse_bool("--enable-fec", &next_value(cli_args, "--enable-fec")?)?;
            }
            "--fec-ratio" => {
                raw.fec_ratio = parse_f64("--fec-ratio", &next_value(cli_args, "--fec-ratio")?)?;
            }
            "--passphrase" => raw.passphrase = Some(next_value(cli_args, "--passphrase")?),
            "--pubkey-hint" => raw.pubkey_hint = Some(next_value(cli_args, "--pubkey-hint")?),
            "--privkey-frame" => {
                raw.privkey_frame =
                    parse_usize("--privkey-frame", &next_value(cli_args, "--privkey-frame")?)?;
            }
            "--privkey-frame-pass" => {
                raw.privkey_frame_pass = Some(next_value(cli_args, "--privkey-frame-pass")?);
            }
            "--obfuscation" => {
                raw.obfuscation = Some(PathBuf::from(next_value(cli_args, "--obfuscation")?));
            }
            unknown => return Err(format!("Unknown argument: '{unknown}'")),
        }
    }

    let input = raw.input.ok_or("Missing required argument: '--input'")?;
    let output = raw.output.ok_or("Missing required argument: '--output'")?;
    let manifest = raw
        .manifest
        .ok_or("Missing required argument: '--manifest'")?;
    let passphrase = raw
        .passphrase
        .ok_or("Missing required argument: '--passphrase'")?;
    let pubkey_hint = raw
        .pubkey_hint
        .ok_or("Missing required argument: '--pubkey-hint'")?;
    let privkey_frame_pass = raw
        .privkey_frame_pass
        .ok_or("Missing required argument: '--privkey-frame-pass'")?;

    Ok(EncodeArgs {
        input,
        output,
        manifest,
        grid: raw.grid.max(1),
        fps: raw.fps,
        resolution: resolve_resolution(&raw.resolution, raw.width, raw.height),
        enable_fec: raw.enable_fec,
        fec_ratio: raw.fec_ratio,
        passphrase,
        pubkey_hint,
        privkey_frame: raw.privkey_frame,
        privkey_frame_pass,
        obfuscation: raw.obfuscation,
    })
}

fn parse_decode<I>(cli_args: &mut I) -> Result<DecodeArgs, String>
where
    I: Iterator<Item: AsRef<str> + ToString>,
{
    let mut raw = RawDecode::default();

    while let Some(arg) = cli_args.next() {
        match arg.as_ref() {
            "--video" => raw.video = Some(PathBuf::from(next_value(cli_args, "--video")?)),
            "--output" => raw.output = Some(PathBuf::from(next_value(cli_args, "--output")?)),
            "--manifest" => {
                raw.manifest = Some(PathBuf::from(next_value(cli_args, "--manifest")?));
            }
            "--privkey-frame-password" => {
                raw.privkey_frame_password =
                    Some(next_value(cli_args, "--privkey-frame-password")?);
            }
            "--obfuscation-check" => {
                raw.obfuscation_check = Some(PathBuf::from(next_value(
                    cli_args,
                    "--obfuscation-check",
                )?));
            }
            unknown => return Err(format!("Unknown argument: '{unknown}'")),
        }
    }

    let video = raw.video.ok_or("Missing required argument: '--video'")?;
    let output = raw.output.ok_or("Missing required argument: '--output'")?;
    let privkey_frame_password = raw
        .privkey_frame_password
        .ok_or("Missing required argument: '--privkey-frame-password'")?;

    Ok(DecodeArgs {
        video,
        output,
        manifest: raw.manifest,
        privkey_frame_password,
        obfuscation_check: raw.obfuscation_check,
    })
}

/// Resolves `--resolution`/`--width`/`--height` into concrete pixel
/// dimensions, matching the original script's preset table and its silent
/// "unknown preset" fallback to 1080p.
fn resolve_resolution(resolution: &str, width: Option<u32>, height: Option<u32>) -> Resolution {
    if let (Some(w), Some(h)) = (width, height) {
        return Resolution { w, h };
    }

    let (w, h) = match resolution.to_lowercase().as_str() {
        "720p" => (1280, 720),
        "2160p" | "4k" => (3840, 2160),
        _ => (1920, 1080),
    };
    Resolution { w, h }
}

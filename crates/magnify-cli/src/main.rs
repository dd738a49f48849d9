//! magnify-cli: upscale images from the command line.
//!
//! Runs the same [`UpscaleController`] as the web app, with a blocking
//! `reqwest` client standing in for browser `fetch` and in-memory byte
//! buffers standing in for Blob URLs.
//!
//! # Usage
//!
//! ```text
//! magnify-cli upscale photo.jpg --method bicubic --scale 4 --compare side.png
//! magnify-cli health --server http://gpu-box:5000
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod http;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use magnify_core::{
    HandleStore, Method, Presented, ScaleFactor, ServiceConfig, SourceImage, UpscaleController,
    check_service_health, render_comparison,
};

use crate::http::ReqwestService;

/// Upscale images with classic resampling or a remote AI model.
#[derive(Parser)]
#[command(name = "magnify-cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the upscaling service.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Upload timeout in seconds.
    #[arg(
        long,
        global = true,
        value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..)
    )]
    timeout_secs: Option<u64>,

    /// Full service config as a JSON string.
    ///
    /// When provided, `--server` and `--timeout-secs` are ignored. The
    /// JSON must be a valid `ServiceConfig` serialization.
    #[arg(long, global = true)]
    config_json: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Upscale an image and write the result as a file.
    Upscale(UpscaleArgs),
    /// Query the service and print its readiness.
    Health,
}

#[derive(clap::Args)]
struct UpscaleArgs {
    /// Path to the input image (PNG, JPEG, GIF, BMP, WebP).
    input: PathBuf,

    /// Interpolation method.
    #[arg(long, value_enum, default_value_t = MethodArg::Bicubic)]
    method: MethodArg,

    /// Upscaling factor on each axis.
    #[arg(
        long,
        default_value_t = ScaleFactor::DEFAULT.get(),
        value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..=16)
    )]
    scale: u32,

    /// Output path. Defaults to `upscaled_<stem>.<ext>` in the current
    /// directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a before/after comparison image to this path.
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Divider position for `--compare`, from 0 (all original) to 1
    /// (all upscaled).
    #[arg(long, default_value_t = 0.5)]
    divider: f64,

    /// Canvas size for `--compare`, as `WIDTHxHEIGHT`.
    #[arg(long, value_name = "WxH", default_value = "1200x800")]
    compare_size: String,
}

/// Interpolation method selection.
#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Nearest neighbour (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (smooth, slightly soft).
    Bilinear,
    /// Bicubic interpolation (smoothest local method).
    Bicubic,
    /// Remote AI super-resolution.
    Ai,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Nearest => Self::Nearest,
            MethodArg::Bilinear => Self::Bilinear,
            MethodArg::Bicubic => Self::Bicubic,
            MethodArg::Ai => Self::Ai,
        }
    }
}

/// Display handles that are just shared byte buffers.
#[derive(Debug, Default)]
struct MemoryStore;

impl HandleStore for MemoryStore {
    type Handle = Arc<[u8]>;

    fn create(&mut self, bytes: &[u8], _mime_type: &str) -> Result<Arc<[u8]>, String> {
        Ok(Arc::from(bytes))
    }

    fn release(&mut self, _handle: &Arc<[u8]>) {}
}

/// Build a [`ServiceConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ServiceConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = cli
        .server
        .as_deref()
        .map_or_else(ServiceConfig::default, ServiceConfig::with_base_url);
    if let Some(secs) = cli.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

/// Parse a `WIDTHxHEIGHT` canvas size.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must be 'WxH', got: '{s}'"))?;
    let w: u32 = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{w}': {e}"))?;
    let h: u32 = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got: '{s}'"));
    }
    Ok((w, h))
}

fn read_source(path: &Path) -> Result<SourceImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_owned();
    Ok(SourceImage::new(name, bytes))
}

fn write_comparison(
    presented: &Presented<Arc<[u8]>>,
    path: &Path,
    size: (u32, u32),
    divider: f64,
) -> Result<(), String> {
    let before = magnify_core::resample::decode(&presented.result.original)
        .map_err(|e| format!("Error decoding original: {e}"))?;
    let after = magnify_core::resample::decode(&presented.result.upscaled)
        .map_err(|e| format!("Error decoding result: {e}"))?;
    let frame = render_comparison(&before, &after, size.0, size.1, divider)
        .map_err(|e| format!("Error rendering comparison: {e}"))?;
    frame
        .save(path)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))
}

fn run_upscale(service: &ReqwestService, args: &UpscaleArgs) -> Result<(), String> {
    let compare_size = parse_size(&args.compare_size)?;
    let scale = ScaleFactor::new(args.scale).ok_or("scale must be positive")?;
    let method = Method::from(args.method);
    let source = read_source(&args.input)?;

    let mut controller = UpscaleController::new(MemoryStore);
    controller.select_source(source);

    if !method.is_local() {
        let status = pollster::block_on(check_service_health(service));
        let transition = controller.apply_health(status);
        eprintln!("Service: {}", transition.to.message());
    }

    let presented = pollster::block_on(controller.submit(method, scale, service))
        .map_err(|e| format!("Upscale failed: {e}"))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&presented.download_name));
    std::fs::write(&output, &presented.result.upscaled)
        .map_err(|e| format!("Error writing {}: {e}", output.display()))?;
    eprintln!(
        "{} -> {} with {} written to {}",
        presented.result.original_dimensions,
        presented.result.upscaled_dimensions,
        presented.result.method,
        output.display(),
    );

    if let Some(ref compare_path) = args.compare {
        write_comparison(presented, compare_path, compare_size, args.divider)?;
        eprintln!("Comparison written to {}", compare_path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let service = match ReqwestService::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error creating HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Health => {
            let status = pollster::block_on(check_service_health(&service));
            let readiness = magnify_core::Readiness::from_status(status);
            println!("{readiness}: {}", readiness.message());
            if readiness.allows_ai() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Upscale(ref args) => match run_upscale(&service, args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(msg) => {
                eprintln!("{msg}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_both_separators() {
        assert_eq!(parse_size("1200x800").unwrap(), (1200, 800));
        assert_eq!(parse_size("64X48").unwrap(), (64, 48));
        assert!(parse_size("1200").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "magnify-cli",
            "--server",
            "http://gpu:8000/",
            "--timeout-secs",
            "30",
            "health",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.upscale_url(), "http://gpu:8000/upscale");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_json_wins_over_flags() {
        let cli = Cli::parse_from([
            "magnify-cli",
            "--server",
            "http://ignored",
            "--config-json",
            r#"{"base_url":"http://json:1"}"#,
            "health",
        ]);
        assert_eq!(config_from_cli(&cli).unwrap().base_url, "http://json:1");
    }

    #[test]
    fn upscale_defaults() {
        let cli = Cli::parse_from(["magnify-cli", "upscale", "in.png"]);
        let Command::Upscale(args) = cli.command else {
            unreachable!("parsed the upscale subcommand");
        };
        assert_eq!(Method::from(args.method), Method::Bicubic);
        assert_eq!(args.scale, 4);
        assert!(args.output.is_none());
    }

    #[test]
    fn local_upscale_writes_output() {
        let dir = std::env::temp_dir().join(format!("magnify-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("tiny.png");
        image::RgbaImage::from_pixel(5, 3, image::Rgba([1, 2, 3, 255]))
            .save(&input)
            .unwrap();
        let output = dir.join("out.png");
        let compare = dir.join("cmp.png");

        let args = UpscaleArgs {
            input,
            method: MethodArg::Nearest,
            scale: 2,
            output: Some(output.clone()),
            compare: Some(compare.clone()),
            divider: 0.5,
            compare_size: "40x30".to_owned(),
        };
        let service = ReqwestService::new(ServiceConfig::default()).unwrap();
        run_upscale(&service, &args).unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (10, 6));
        let frame = image::open(&compare).unwrap();
        assert_eq!((frame.width(), frame.height()), (40, 30));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

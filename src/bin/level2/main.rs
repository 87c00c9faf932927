//! level2-cli - Tool for inspecting NEXRAD Level II archives.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use nexrad_level2::core::{decompress_bytes, dump_path_for, Source};
use nexrad_level2::prelude::*;
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const BUILD_STAMP: &str = env!("LEVEL2_BUILD_STAMP");

/// Command-line overrides applied on top of the options file.
#[derive(Default)]
struct Overrides {
    no_gzip: bool,
    no_bzip2: bool,
    sequential: bool,
    dump: bool,
}

impl Overrides {
    fn apply(&self, mut options: DecodeOptions) -> DecodeOptions {
        if self.no_gzip {
            options.gzip = false;
        }
        if self.no_bzip2 {
            options.bzip2 = false;
        }
        if self.sequential {
            options.parallel = false;
        }
        if self.dump {
            options.dump_intermediate = true;
        }
        options
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut overrides = Overrides::default();
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "--no-gzip" => overrides.no_gzip = true,
            "--no-bzip2" => overrides.no_bzip2 = true,
            "--sequential" => overrides.sequential = true,
            "--dump" => overrides.dump = true,
            _ => filtered_args.push(arg),
        }
    }

    #[allow(clippy::let_unit_value)]
    let _guard = init_tracing(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let options = overrides.apply(DecodeOptions::load());
    tracing::debug!(?options, "decode options");

    let result = match filtered_args[0] {
        // Info command - header, counts, warnings
        "info" | "i" => file_arg(&filtered_args, "info").and_then(|f| cmd_info(f, &options)),

        // Elevations command - per-cut table
        "elevations" | "e" => file_arg(&filtered_args, "elevations").and_then(|f| cmd_elevations(f, &options)),

        // Dump command - write the decompressed stream
        "dump" | "d" => file_arg(&filtered_args, "dump")
            .and_then(|f| cmd_dump(f, filtered_args.get(2).copied(), &options)),

        // JSON command - machine-readable summary
        "json" | "j" => file_arg(&filtered_args, "json").and_then(|f| cmd_json(f, &options)),

        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0], &options)
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Install the fmt subscriber. `RUST_LOG` overrides the verbosity flags.
/// With `LEVEL2_TRACE=1`, spans also go to `trace.json`.
#[cfg(feature = "chrome-trace")]
fn init_tracing(default_level: &str) -> Option<tracing_chrome::FlushGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if env::var("LEVEL2_TRACE").ok().as_deref() != Some("1") {
        let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
        return None;
    }

    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file("trace.json")
        .build();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(chrome_layer)
        .try_init()
        .ok()
        .map(|_| guard)
}

/// Install the fmt subscriber. `RUST_LOG` overrides the verbosity flags.
#[cfg(not(feature = "chrome-trace"))]
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn file_arg<'a>(args: &[&'a str], command: &str) -> Result<&'a str> {
    match args.get(1) {
        Some(file) => Ok(file),
        None => bail!("missing file argument\nUsage: level2-cli {} <archive>", command),
    }
}

fn print_help() {
    println!("level2-cli - NEXRAD Level II archive toolkit (built {})", BUILD_STAMP);
    println!();
    println!("USAGE:");
    println!("    level2-cli [OPTIONS] <COMMAND> <file>");
    println!();
    println!("COMMANDS:");
    println!("    i, info       <file>          Show volume header, message counts and warnings");
    println!("    e, elevations <file>          Show elevation angles, radial and gate counts");
    println!("    d, dump       <file> [out]    Write the decompressed stream (default <file>.decompressed)");
    println!("    j, json       <file>          Print a JSON summary of the volume");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!("    --no-gzip        Do not inflate a gzip envelope");
    println!("    --no-bzip2       Do not splice embedded bzip2 blocks");
    println!("    --sequential     Decompress bzip2 blocks on one thread");
    println!("    --dump           Also write <file>.decompressed while decoding");
    println!();
    println!("EXAMPLES:");
    println!("    level2-cli info KDIX20240517_025206_V06");
    println!("    level2-cli elevations KDIX20240517_025206_V06.gz");
    println!("    level2-cli -v --sequential json KTLX20240101_000000_V06");
    println!();
    println!("NOTES:");
    println!("    - Passing an archive directly is equivalent to 'info'");
    println!("    - Defaults are read from {}", options_path_display());
    println!("    - RUST_LOG overrides -v/-vv/-q");
}

fn options_path_display() -> String {
    DecodeOptions::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<no config dir>".to_string())
}

fn open(path: &str, options: &DecodeOptions) -> Result<VolumeModel> {
    tracing::info!("Opening archive: {}", path);
    decode_archive(path, options).with_context(|| format!("failed to decode {}", path))
}

fn cmd_info(path: &str, options: &DecodeOptions) -> Result<()> {
    let volume = open(path, options)?;
    let header = volume.header();

    println!("Archive:   {}", path);
    println!("Site:      {}", header.icao);
    println!("Version:   {} (extension {:03})", header.version, header.extension_num);
    match header.date_time() {
        Some(dt) => println!("Start:     {} {:02}:{:02}:{:02} UTC", dt.date(), dt.hour(), dt.minute(), dt.second()),
        None => println!("Start:     date {} time {} ms", header.date, header.time),
    }
    println!("Stream:    {} bytes from {} bzip2 block(s)", volume.decompressed_len(), volume.bzip2_blocks());
    println!();

    println!("Messages:");
    for (msg_type, count) in volume.message_counts() {
        println!("  type {:>3}: {}", msg_type, count);
    }
    println!();

    println!("Elevations: {}", volume.elevation_count());
    println!("Radials:    {}", volume.radial_count());

    if !volume.warnings().is_empty() {
        println!();
        println!("Warnings ({}):", volume.warnings().len());
        for warning in volume.warnings() {
            println!("  - {}", warning);
        }
    }

    if let Err(e) = volume.check_integrity() {
        println!();
        println!("Integrity: {}", e);
    }
    Ok(())
}

fn cmd_elevations(path: &str, options: &DecodeOptions) -> Result<()> {
    let volume = open(path, options)?;

    println!("{:>5} {:>8} {:>8} {:>7} {:>10}", "index", "angle", "radials", "gates", "range km");
    for elevation in volume.elevations() {
        let max_range = elevation
            .radials
            .iter()
            .map(|r| r.reflectivity.max_range_km())
            .fold(0.0f32, f32::max);
        println!(
            "{:>5} {:>8.2} {:>8} {:>7} {:>10.1}",
            elevation.index,
            elevation.angle,
            elevation.radial_count(),
            elevation.max_gates(),
            max_range
        );
    }
    Ok(())
}

fn cmd_dump(path: &str, out: Option<&str>, options: &DecodeOptions) -> Result<()> {
    let source = Source::open(path).with_context(|| format!("failed to open {}", path))?;
    let decompressed = decompress_bytes(&source, options).with_context(|| format!("failed to decompress {}", path))?;

    let out = out.map(PathBuf::from).unwrap_or_else(|| dump_path_for(path));
    std::fs::write(&out, &decompressed.data).with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "Wrote {} bytes ({} bzip2 block(s)) to {}",
        decompressed.data.len(),
        decompressed.blocks,
        out.display()
    );
    for warning in &decompressed.warnings {
        println!("  - {}", warning);
    }
    Ok(())
}

#[derive(Serialize)]
struct VolumeSummary<'a> {
    file: &'a str,
    header: &'a VolumeHeader,
    start: Option<String>,
    decompressed_len: u64,
    bzip2_blocks: usize,
    message_counts: &'a BTreeMap<u8, usize>,
    elevations: Vec<ElevationSummary>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ElevationSummary {
    index: u8,
    angle: f32,
    radials: usize,
    max_gates: usize,
}

fn cmd_json(path: &str, options: &DecodeOptions) -> Result<()> {
    let volume = open(path, options)?;

    let summary = VolumeSummary {
        file: path,
        header: volume.header(),
        start: volume.header().date_time().map(|dt| dt.to_string()),
        decompressed_len: volume.decompressed_len(),
        bzip2_blocks: volume.bzip2_blocks(),
        message_counts: volume.message_counts(),
        elevations: volume
            .elevations()
            .map(|e| ElevationSummary {
                index: e.index,
                angle: e.angle,
                radials: e.radial_count(),
                max_gates: e.max_gates(),
            })
            .collect(),
        warnings: volume.warnings().iter().map(ToString::to_string).collect(),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

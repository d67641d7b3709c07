//! exif-rewriter - inspect and rewrite EXIF metadata of JPEG files.
//!
//! This binary only does file I/O and printing; all parsing, layout and
//! rewriting happens in the library.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exif_rewriter::{
    config::{
        resolve_tag, Cli, Command, CopyConfig, DumpConfig, GpsConfig, IoPaths, RemoveConfig,
        SetConfig,
    },
    ByteOrder, DumpReport, ExifError, ExifRewriter, OutputField, OutputSet,
};

/// Failures of a CLI command.
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Exif(#[from] ExifError),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rewriter = ExifRewriter::new();
    let result = match cli.command {
        Command::Dump(config) => run_dump(&rewriter, config),
        Command::Strip(paths) => run_strip(&rewriter, paths),
        Command::Copy(config) => run_copy(&rewriter, config),
        Command::Set(config) => run_set(&rewriter, config),
        Command::Remove(config) => run_remove(&rewriter, config),
        Command::Gps(config) => run_gps(&rewriter, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "exif_rewriter=debug"
    } else {
        "exif_rewriter=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(path: &Path, data: &Bytes) -> Result<(), CliError> {
    fs::write(path, data).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(())
}

/// Existing metadata as an output set, or an empty big-endian set.
fn load_output_set(rewriter: &ExifRewriter<'_>, jpeg: &[u8]) -> Result<OutputSet, CliError> {
    Ok(rewriter
        .read_metadata(jpeg)?
        .map(|metadata| metadata.to_output_set())
        .unwrap_or_else(|| OutputSet::new(ByteOrder::BigEndian)))
}

// =============================================================================
// Commands
// =============================================================================

fn run_dump(rewriter: &ExifRewriter<'_>, config: DumpConfig) -> Result<(), CliError> {
    let jpeg = read_input(&config.input)?;
    let Some(metadata) = rewriter.read_metadata(&jpeg)? else {
        if config.json {
            println!("null");
        } else {
            println!("No EXIF metadata in {}", config.input.display());
        }
        return Ok(());
    };

    let report = DumpReport::new(&metadata);
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

fn run_strip(rewriter: &ExifRewriter<'_>, paths: IoPaths) -> Result<(), CliError> {
    paths.validate().map_err(CliError::Config)?;
    let jpeg = read_input(&paths.input)?;
    let output = rewriter.remove_exif_metadata(&jpeg)?;
    write_output(&paths.output, &output)
}

fn run_copy(rewriter: &ExifRewriter<'_>, config: CopyConfig) -> Result<(), CliError> {
    config.paths.validate().map_err(CliError::Config)?;
    let jpeg = read_input(&config.paths.input)?;
    let output = rewriter.update_exif_metadata_with(&jpeg, |set| {
        if let Some(byte_order) = config.byte_order {
            set.set_byte_order(byte_order.into());
        }
        Ok(())
    })?;
    write_output(&config.paths.output, &output)
}

fn run_set(rewriter: &ExifRewriter<'_>, config: SetConfig) -> Result<(), CliError> {
    config.validate().map_err(CliError::Config)?;
    let role = config.directory.map(Into::into);
    let info = resolve_tag(rewriter.registry(), role, &config.tag).map_err(CliError::Config)?;
    if info.is_unknown() {
        warn!("Tag {} is not in the registry; writing it anyway", config.tag);
    }
    let value = config.parse_value(&info).map_err(CliError::Config)?;
    let target = config.target_directory(&info);

    let jpeg = read_input(&config.paths.input)?;
    let mut set = load_output_set(rewriter, &jpeg)?;
    let field = OutputField::create(&info, set.byte_order(), value)?;
    if let Some(directory) = set.directory_mut(target) {
        directory.remove_field(field.tag());
    }
    set.get_or_create_directory(target).add(field);

    let output = rewriter.update_exif_metadata_lossless(&jpeg, &set)?;
    write_output(&config.paths.output, &output)
}

fn run_remove(rewriter: &ExifRewriter<'_>, config: RemoveConfig) -> Result<(), CliError> {
    config.paths.validate().map_err(CliError::Config)?;
    let info = resolve_tag(rewriter.registry(), None, &config.tag).map_err(CliError::Config)?;
    let tag = u16::try_from(info.tag)
        .map_err(|_| CliError::Config(format!("invalid tag '{}'", config.tag)))?;

    let jpeg = read_input(&config.paths.input)?;
    let output = rewriter.update_exif_metadata_with(&jpeg, |set| {
        if !set.remove_field(tag) {
            warn!("Tag {} not present", config.tag);
        }
        Ok(())
    })?;
    write_output(&config.paths.output, &output)
}

fn run_gps(rewriter: &ExifRewriter<'_>, config: GpsConfig) -> Result<(), CliError> {
    config.validate().map_err(CliError::Config)?;
    let jpeg = read_input(&config.paths.input)?;

    let mut set = load_output_set(rewriter, &jpeg)?;
    set.set_gps_in_degrees(config.longitude, config.latitude);

    let output = rewriter.update_exif_metadata_lossless(&jpeg, &set)?;
    write_output(&config.paths.output, &output)
}

//! # padata Converter
//!
//! A command-line tool for converting photoacoustic scan recordings to the
//! standardized IPASC data model.
//!
//! ## Supported Input Formats
//!
//! - **LOL-360**: Scan logs and raw recordings from the Lawson rotating-ring
//!   tomograph
//! - **Demo**: Generate a synthetic scan for testing
//!
//! ## Usage
//!
//! ```bash
//! # Convert a scan to a directory bundle
//! padata-convert convert scan_log.txt raw/ scan.padata
//!
//! # Generate and convert a synthetic scan
//! padata-convert demo demo_scan.padata
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use padata::adapter::run_conversion;
use padata::io::{load_bundle, read_manifest, write_bundle};
use padata::lawson::{synthetic::SyntheticScan, LawsonConfig, LawsonConverter};
use padata::metadata::{
    AcquisitionMetadata, DeviceMetadata, DeviceMetadataBuilder, IlluminationElementBuilder,
};
use padata::pa_data::PaData;
use padata::qc::check_pa_data;

/// padata - Standardized Photoacoustic Data Converter
#[derive(Parser)]
#[command(name = "padata-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a LOL-360 scan to the standardized format
    Convert {
        /// Scan log file written by the acquisition software
        #[arg(value_name = "SCAN_LOG")]
        scan_log: PathBuf,

        /// Folder holding the raw recordings, one file per scan step
        #[arg(value_name = "RAW_DATA")]
        raw_data: PathBuf,

        /// Output path (defaults to a .padata bundle named after the scan folder)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Write a single HDF5 container instead of a directory bundle
        #[arg(long)]
        hdf5: bool,

        /// TOML file overriding the preprocessing settings
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the output even when quality control fails
        #[arg(long)]
        skip_checks: bool,
    },

    /// Generate and convert a synthetic scan for testing
    Demo {
        /// Output bundle path
        #[arg(value_name = "OUTPUT", default_value = "demo_scan.padata")]
        output: PathBuf,

        /// Where to leave the generated scan log and recordings
        #[arg(long, default_value = "demo_scan_source")]
        source_dir: PathBuf,
    },

    /// Display information about a converted dataset
    Info {
        /// Bundle directory or HDF5 container path
        #[arg(value_name = "DATASET")]
        bundle: PathBuf,
    },

    /// Validate dataset integrity and metadata compliance
    Validate {
        /// Bundle directory or HDF5 container path
        #[arg(value_name = "DATASET")]
        bundle: PathBuf,
    },
}

/// On-disk configuration file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    lawson: LawsonConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Convert {
            scan_log,
            raw_data,
            output,
            hdf5,
            config,
            skip_checks,
        } => run_convert(scan_log, raw_data, output, hdf5, config, skip_checks),
        Commands::Demo { output, source_dir } => run_demo(output, source_dir),
        Commands::Info { bundle } => run_info(bundle),
        Commands::Validate { bundle } => run_validate(bundle),
    }
}

/// Convert a LOL-360 scan to the standardized format
fn run_convert(
    scan_log: PathBuf,
    raw_data: PathBuf,
    output: Option<PathBuf>,
    hdf5: bool,
    config: Option<PathBuf>,
    skip_checks: bool,
) -> Result<()> {
    if !scan_log.exists() {
        anyhow::bail!("Scan log does not exist: {}", scan_log.display());
    }
    if !raw_data.is_dir() {
        anyhow::bail!("Raw data folder does not exist: {}", raw_data.display());
    }

    let output = output.unwrap_or_else(|| default_output_path(&scan_log, hdf5));

    info!("padata Converter - LOL-360 scan to standardized format");
    info!("=======================================================");
    info!("Scan log: {}", scan_log.display());
    info!("Raw data: {}", raw_data.display());
    info!("Output:   {}", output.display());
    if hdf5 {
        info!("Format: HDF5 container");
    } else {
        info!("Format: Directory bundle");
    }

    let config = load_file_config(config.as_deref())?;
    let converter = LawsonConverter::load(&scan_log, &raw_data, &config)
        .context("Failed to load scan inputs")?;

    info!("Starting conversion...");
    let data = run_conversion(&converter).context("Conversion failed")?;

    if skip_checks {
        info!("Quality control skipped");
    } else {
        let report = check_pa_data(&data, &output.display().to_string());
        if report.has_failures() {
            eprintln!("{}", report.format_colored());
            anyhow::bail!("Quality control failed; pass --skip-checks to write the output anyway");
        }
        info!(
            "Quality control: {} passed, {} warnings",
            report.success_count(),
            report.warning_count()
        );
    }

    if hdf5 {
        write_hdf5_output(&data, &output)?;
    } else {
        write_bundle(&data, &output).context("Failed to write bundle")?;
    }

    print_conversion_summary(&data, &output);
    Ok(())
}

/// Generate a synthetic scan and convert it
fn run_demo(output: PathBuf, source_dir: PathBuf) -> Result<()> {
    info!("padata Converter - Synthetic Scan Demo");
    info!("======================================");

    let scan = SyntheticScan::default();
    info!(
        "Generating {} detectors x {} scan steps into {}...",
        scan.num_detectors,
        scan.num_steps,
        source_dir.display()
    );
    let paths = scan
        .write(&source_dir)
        .context("Failed to write synthetic scan")?;

    let converter = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config())
        .context("Failed to load synthetic scan")?;

    info!("Starting conversion...");
    let mut data = run_conversion(&converter).context("Conversion failed")?;

    // Production scans never describe their fibre bundle; the demo attaches
    // one so converted output exercises the full device description.
    data.device = with_demo_illuminator(&data.device)?;

    let report = check_pa_data(&data, &output.display().to_string());
    println!("{}", report.format_colored());
    if report.has_failures() {
        anyhow::bail!("Quality control failed on demo data");
    }

    write_bundle(&data, &output).context("Failed to write bundle")?;

    print_conversion_summary(&data, &output);
    info!(
        "Generated inputs kept in {} for inspection",
        source_dir.display()
    );
    Ok(())
}

/// Display information about a converted dataset
fn run_info(bundle: PathBuf) -> Result<()> {
    if !bundle.exists() {
        anyhow::bail!("Dataset does not exist: {}", bundle.display());
    }

    println!("padata Dataset Information");
    println!("==========================");
    println!("Dataset: {}", bundle.display());
    println!();

    if bundle.is_dir() {
        let manifest = read_manifest(&bundle).context("Failed to read bundle manifest")?;

        println!("Provenance:");
        println!("  Format version: {}", manifest.format_version);
        println!("  Created:        {}", manifest.created);
        println!("  Converter:      {}", manifest.converter);
        println!();

        print_binary_info(manifest.binary_shape);
        print_device_info(&manifest.device);
        print_acquisition_info(&manifest.acquisition);
    } else {
        // HDF5 containers carry no manifest; load the whole file
        let data = load_container(&bundle)?;
        let (rows, cols) = data.binary_data.dim();

        print_binary_info([rows, cols]);
        print_device_info(&data.device);
        print_acquisition_info(&data.acquisition);
    }

    Ok(())
}

fn print_binary_info(shape: [usize; 2]) {
    println!("Binary data:");
    println!("  Time series:        {}", shape[0]);
    println!("  Samples per series: {}", shape[1]);
    println!();
}

fn print_device_info(device: &DeviceMetadata) {
    let general = &device.general;
    println!("Device:");
    println!("  UUID: {}", general.unique_identifier);
    println!(
        "  Field of view: [{}, {}, {}] m",
        general.field_of_view[0], general.field_of_view[1], general.field_of_view[2]
    );
    println!("  Detection elements:    {}", general.num_detection_elements);
    println!(
        "  Illumination elements: {}",
        general.num_illumination_elements
    );
    println!();
}

fn print_acquisition_info(acquisition: &AcquisitionMetadata) {
    println!("Acquisition metadata:");
    for (tag, value) in acquisition.iter() {
        println!("  {}: {}", tag.key(), value);
    }
}

/// Validate dataset integrity and metadata compliance
fn run_validate(bundle: PathBuf) -> Result<()> {
    info!("padata Validator");
    info!("================");
    info!("Dataset: {}", bundle.display());

    match load_dataset(&bundle) {
        Ok(data) => {
            let report = check_pa_data(&data, &bundle.display().to_string());
            println!("{}", report.format_colored());

            // Exit with error code if validation failed
            if report.has_failures() {
                std::process::exit(1);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Validation error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Load a converted dataset in either layout, picked by path shape
fn load_dataset(path: &Path) -> Result<PaData> {
    if path.is_dir() {
        load_bundle(path).context("Failed to load bundle")
    } else {
        load_container(path)
    }
}

/// Default output path: a sibling of the scan log named after its folder
fn default_output_path(scan_log: &Path, hdf5: bool) -> PathBuf {
    let stem = scan_log
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string());
    let extension = if hdf5 { "hdf5" } else { "padata" };
    scan_log.with_file_name(format!("{}.{}", stem, extension))
}

/// Load preprocessing settings, from a TOML file when one is given
fn load_file_config(path: Option<&Path>) -> Result<LawsonConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: FileConfig = toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config.lawson)
        }
        None => Ok(LawsonConfig::default()),
    }
}

/// Rebuild a device description with the demo fibre bundle attached.
///
/// The optical values describe the prototype's illumination arm, taken from
/// its engineering drawings.
fn with_demo_illuminator(device: &DeviceMetadata) -> Result<DeviceMetadata> {
    let mut builder = DeviceMetadataBuilder::new(device.general.unique_identifier)
        .field_of_view(device.general.field_of_view);
    for (identifier, element) in device.detectors.iter() {
        builder.add_detection_element(identifier, element.clone())?;
    }

    let illuminator = IlluminationElementBuilder::new()
        .position([0.0083, 0.0192, -0.001])
        .orientation([-0.3839595, 0.0, 0.9233499])
        .shape([0.0, 0.0245, 0.0])
        .wavelength_range([700.0, 950.0, 1.0])
        .beam_divergence(0.20944)
        .pulse_width(7.0e-9)
        .build()?;
    builder.add_illumination_element("illumination_element_0", illuminator)?;

    Ok(builder.finalize())
}

fn print_conversion_summary(data: &PaData, output: &Path) {
    info!("Conversion complete!");
    info!("  Output: {}", output.display());
    info!("  Detection elements: {}", data.num_detection_elements());
    info!("  Samples per element: {}", data.samples_per_element());
    if let Some(rate) = data.sampling_rate() {
        info!("  Sampling rate: {:.2} MHz", rate / 1.0e6);
    }
    if let Some(wavelengths) = data.wavelengths() {
        info!("  Wavelengths: {:?} nm", wavelengths);
    }
    let payload_bytes = data.binary_data.len() * std::mem::size_of::<f32>();
    info!(
        "  Time series payload: {} bytes ({:.2} MB)",
        payload_bytes,
        payload_bytes as f64 / 1024.0 / 1024.0
    );
}

#[cfg(feature = "hdf5")]
fn write_hdf5_output(data: &PaData, output: &Path) -> Result<()> {
    padata::io::write_hdf5(data, output).context("Failed to write HDF5 container")
}

#[cfg(not(feature = "hdf5"))]
fn write_hdf5_output(_data: &PaData, _output: &Path) -> Result<()> {
    anyhow::bail!("This build has no HDF5 support; rebuild with --features hdf5")
}

#[cfg(feature = "hdf5")]
fn load_container(path: &Path) -> Result<PaData> {
    padata::io::load_hdf5(path).context("Failed to load HDF5 container")
}

#[cfg(not(feature = "hdf5"))]
fn load_container(path: &Path) -> Result<PaData> {
    anyhow::bail!(
        "{} is not a bundle directory, and this build has no HDF5 support",
        path.display()
    )
}

//! Synthetic LOL-360 scans.
//!
//! Writes a scan log and matching recording folder for a mock rotating-ring
//! scan. The demo command and the test suite both convert these instead of
//! shipping real recordings.

use std::f64::consts::TAU;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use super::converter::LawsonConfig;
use super::raw_data::{RECORDING_MAGIC, RECORDING_VERSION};
use super::LawsonError;

/// Shape of a synthetic scan.
///
/// Detectors sit on a ring in the x-y plane; each scan step advances the
/// ring along z and rotates it slightly, like the robotic stage does.
#[derive(Debug, Clone)]
pub struct SyntheticScan {
    /// Detectors on the ring
    pub num_detectors: usize,
    /// Scan steps the stage visits
    pub num_steps: usize,
    /// Samples per channel in every recording
    pub num_samples: usize,
    /// Shots per recording
    pub num_shots: usize,
    /// Ring radius in millimetres
    pub ring_radius_mm: f64,
    /// Stage advance per scan step in millimetres
    pub step_spacing_mm: f64,
    /// Acquisition clock step written to the recording headers
    pub sample_spacing: f64,
}

impl Default for SyntheticScan {
    fn default() -> Self {
        Self {
            num_detectors: 8,
            num_steps: 5,
            num_samples: 256,
            num_shots: 4,
            ring_radius_mm: 40.0,
            step_spacing_mm: 1.0,
            sample_spacing: 2.5e-8,
        }
    }
}

/// Where a synthetic scan was written
#[derive(Debug, Clone)]
pub struct SyntheticPaths {
    /// The scan log file
    pub scan_log: PathBuf,
    /// The recording folder
    pub raw_data: PathBuf,
}

impl SyntheticScan {
    /// Preprocessing settings matching the synthetic recordings.
    ///
    /// Synthetic recordings carry the photodiode on the last channel, after
    /// the detection channels; everything else keeps the defaults.
    pub fn config(&self) -> LawsonConfig {
        LawsonConfig {
            photodiode_channel: self.num_detectors,
            ..LawsonConfig::default()
        }
    }

    /// Write the scan log and recording folder under `dir`.
    pub fn write(&self, dir: &Path) -> Result<SyntheticPaths, LawsonError> {
        let scan_log = dir.join("scan_log.txt");
        let raw_data = dir.join("raw");
        fs::create_dir_all(&raw_data)?;

        self.write_scan_log(&scan_log)?;
        for step in 0..self.num_steps {
            let path = raw_data.join(format!("scan_{:04}.bin", step));
            self.write_recording(&path, step)?;
        }

        Ok(SyntheticPaths { scan_log, raw_data })
    }

    /// Detector position in millimetres at one scan step
    pub fn position_mm(&self, detector: usize, step: usize) -> [f64; 3] {
        let per_detector = TAU / self.num_detectors as f64;
        // The stage rotates the ring a fraction of the detector pitch per step
        let per_step = per_detector / self.num_steps as f64;
        let angle = detector as f64 * per_detector + step as f64 * per_step;
        [
            self.ring_radius_mm * angle.cos(),
            self.ring_radius_mm * angle.sin(),
            step as f64 * self.step_spacing_mm,
        ]
    }

    /// Point on the ring axis every detector faces at one scan step
    pub fn reference_mm(&self, step: usize) -> [f64; 3] {
        [0.0, 0.0, step as f64 * self.step_spacing_mm]
    }

    fn write_scan_log(&self, path: &Path) -> Result<(), LawsonError> {
        let mut log = String::new();
        log.push_str("# synthetic LOL-360 scan\n");
        log.push_str(&format!("detectors\t{}\n", self.num_detectors));
        log.push_str(&format!("scan_points\t{}\n", self.num_steps));
        log.push_str(&format!(
            "elapsed_seconds\t{:.1}\n",
            self.num_steps as f64 * 11.4
        ));
        for step in 0..self.num_steps {
            let reference = self.reference_mm(step);
            for detector in 0..self.num_detectors {
                let position = self.position_mm(detector, step);
                log.push_str(&format!(
                    "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\n",
                    step,
                    detector,
                    position[0],
                    position[1],
                    position[2],
                    reference[0],
                    reference[1],
                    reference[2],
                ));
            }
        }
        fs::write(path, log)?;
        Ok(())
    }

    fn write_recording(&self, path: &Path, step: usize) -> Result<(), LawsonError> {
        let channels = self.num_detectors + 1;
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(RECORDING_MAGIC)?;
        writer.write_u16::<LittleEndian>(RECORDING_VERSION)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(channels as u32)?;
        writer.write_u32::<LittleEndian>(self.num_samples as u32)?;
        writer.write_u32::<LittleEndian>(self.num_shots as u32)?;
        writer.write_f64::<LittleEndian>(self.sample_spacing)?;
        writer.write_u32::<LittleEndian>(0)?;

        // Identical shots, so averaging reproduces one shot exactly
        for _shot in 0..self.num_shots {
            for channel in 0..channels {
                for sample in 0..self.num_samples {
                    let value = if channel == self.num_detectors {
                        self.photodiode_sample(step, sample)
                    } else {
                        self.detection_sample(channel, step, sample)
                    };
                    writer.write_i16::<LittleEndian>(value)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// A Gaussian burst arriving later on higher channels and later steps
    pub fn detection_sample(&self, channel: usize, step: usize, sample: usize) -> i16 {
        let center = 40.0 + 3.0 * channel as f64 + 2.0 * step as f64;
        let amplitude = 400.0 + 20.0 * channel as f64;
        let offset = sample as f64 - center;
        (amplitude * (-offset * offset / 72.0).exp()).round() as i16
    }

    /// A rectangular trigger pulse whose height encodes the scan step
    pub fn photodiode_sample(&self, step: usize, sample: usize) -> i16 {
        if sample < 10 {
            1000 + 10 * step as i16
        } else {
            0
        }
    }
}

//! Reader for the acquisition card's raw recordings.
//!
//! Each scan step leaves one `scan_*.bin` file in the recording folder: a
//! 32-byte little-endian header followed by signed 16-bit samples ordered
//! shot-major, then channel, then sample. One channel carries the
//! photodiode reference; the rest are transducer channels.
//!
//! Header layout:
//!
//! ```text
//! offset 0   magic "LOLP"
//! offset 4   format version (u16)
//! offset 6   reserved (u16)
//! offset 8   channels per shot (u32)
//! offset 12  samples per channel (u32)
//! offset 16  shots in this recording (u32)
//! offset 20  acquisition clock step (f64)
//! offset 28  reserved (u32)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use ndarray::{s, Array2, Array3, Axis};

use super::converter::LawsonConfig;
use super::LawsonError;
use crate::metadata::RecordingMeta;

pub(crate) const RECORDING_MAGIC: &[u8; 4] = b"LOLP";
pub(crate) const RECORDING_VERSION: u16 = 1;
pub(crate) const RECORDING_HEADER_LEN: usize = 32;

/// All recordings of one scan, preprocessed and stacked.
#[derive(Debug, Clone)]
pub struct RecordingSet {
    /// Detection waveforms. Rows are step-major: row `s * detectors + d`
    /// holds scan step `s`, detection channel `d`.
    pub detection: Array2<f32>,
    /// Peak photodiode amplitude per scan step
    pub pulse_energies: Vec<f64>,
    /// Description shared by all recordings of the scan
    pub meta: RecordingMeta,
}

impl RecordingSet {
    /// Number of scan steps in the set
    pub fn num_scan_steps(&self) -> usize {
        self.pulse_energies.len()
    }

    /// Detection channels per scan step, photodiode excluded
    pub fn num_detection_channels(&self) -> usize {
        if self.pulse_energies.is_empty() {
            0
        } else {
            self.detection.nrows() / self.pulse_energies.len()
        }
    }
}

/// One preprocessed recording
struct StepRecording {
    detection: Array2<f32>,
    pulse_energy: f64,
    sample_spacing: f64,
}

/// Load every `scan_*.bin` recording of a folder, in file name order.
///
/// The recording count must match the scan log's step count, and all
/// recordings must share one header. Recordings are preprocessed according
/// to `config` as they are read.
pub fn load_recording_folder(
    folder: &Path,
    expected_steps: usize,
    config: &LawsonConfig,
) -> Result<RecordingSet, LawsonError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if is_recording_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    if files.len() != expected_steps || files.is_empty() {
        return Err(LawsonError::StepCountMismatch {
            log_steps: expected_steps,
            recordings: files.len(),
        });
    }

    let first = read_recording(&files[0], config)?;
    let (channels, kept_samples) = first.detection.dim();
    let sample_spacing = first.sample_spacing;

    let mut detection = Array2::zeros((channels * files.len(), kept_samples));
    detection
        .slice_mut(s![0..channels, ..])
        .assign(&first.detection);
    let mut pulse_energies = vec![first.pulse_energy];

    for (step, path) in files.iter().enumerate().skip(1) {
        let recording = read_recording(path, config)?;
        if recording.detection.dim() != (channels, kept_samples)
            || recording.sample_spacing != sample_spacing
        {
            return Err(LawsonError::MalformedRecording {
                path: path.display().to_string(),
                reason: format!(
                    "recording header differs from {}",
                    files[0].display()
                ),
            });
        }
        detection
            .slice_mut(s![step * channels..(step + 1) * channels, ..])
            .assign(&recording.detection);
        pulse_energies.push(recording.pulse_energy);
    }

    debug!(
        "loaded {} recordings from {}: {} detection channels, {} samples kept",
        files.len(),
        folder.display(),
        channels,
        kept_samples
    );

    let meta = RecordingMeta::new(
        "float",
        sample_spacing,
        vec![files.len() as i64, channels as i64, kept_samples as i64],
    )?;

    Ok(RecordingSet {
        detection,
        pulse_energies,
        meta,
    })
}

fn is_recording_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with("scan_") && name.ends_with(".bin"))
        .unwrap_or(false)
}

/// Read and preprocess one recording.
fn read_recording(path: &Path, config: &LawsonConfig) -> Result<StepRecording, LawsonError> {
    let bytes = fs::read(path)?;
    let malformed = |reason: String| LawsonError::MalformedRecording {
        path: path.display().to_string(),
        reason,
    };

    if bytes.len() < RECORDING_HEADER_LEN {
        return Err(malformed(format!(
            "file is {} bytes, the header alone needs {}",
            bytes.len(),
            RECORDING_HEADER_LEN
        )));
    }
    if &bytes[0..4] != RECORDING_MAGIC {
        return Err(malformed("bad magic, not a LOL-360 recording".to_string()));
    }
    let version = LittleEndian::read_u16(&bytes[4..6]);
    if version != RECORDING_VERSION {
        return Err(malformed(format!("unsupported recording version {}", version)));
    }
    let n_channels = LittleEndian::read_u32(&bytes[8..12]) as usize;
    let n_samples = LittleEndian::read_u32(&bytes[12..16]) as usize;
    let n_shots = LittleEndian::read_u32(&bytes[16..20]) as usize;
    let sample_spacing = LittleEndian::read_f64(&bytes[20..28]);

    if n_shots == 0 {
        return Err(malformed("recording holds no shots".to_string()));
    }
    if n_channels < 2 {
        return Err(malformed(
            "need at least one detection channel and the photodiode".to_string(),
        ));
    }
    if config.photodiode_channel >= n_channels {
        return Err(malformed(format!(
            "photodiode channel {} out of range for {} channels",
            config.photodiode_channel, n_channels
        )));
    }
    if !sample_spacing.is_finite() || sample_spacing <= 0.0 {
        return Err(malformed(format!(
            "acquisition clock step must be finite and positive, got {}",
            sample_spacing
        )));
    }
    if n_samples <= config.end_remove {
        return Err(malformed(format!(
            "end removal of {} samples leaves nothing of {}",
            config.end_remove, n_samples
        )));
    }

    // The counts are untrusted u32s; their product can exceed usize
    let expected_payload = n_shots
        .checked_mul(n_channels)
        .and_then(|count| count.checked_mul(n_samples))
        .and_then(|count| count.checked_mul(2))
        .ok_or_else(|| {
            malformed(format!(
                "shot layout {} x {} x {} overflows the payload size",
                n_shots, n_channels, n_samples
            ))
        })?;
    let payload = bytes.len() - RECORDING_HEADER_LEN;
    if payload != expected_payload {
        return Err(malformed(format!(
            "payload is {} bytes, the header implies {}",
            payload, expected_payload
        )));
    }

    let mut raw = vec![0i16; expected_payload / 2];
    LittleEndian::read_i16_into(&bytes[RECORDING_HEADER_LEN..], &mut raw);
    let shots = Array3::from_shape_vec((n_shots, n_channels, n_samples), raw)
        .map_err(|e| malformed(format!("shape error: {}", e)))?;

    // Collapse the shot axis first; all further processing is per channel.
    let channels: Array2<f64> = if config.average_shots {
        shots.mapv(f64::from).sum_axis(Axis(0)) / n_shots as f64
    } else {
        shots.slice(s![0, .., ..]).mapv(f64::from)
    };

    let photodiode = channels.row(config.photodiode_channel);
    let pulse_energy = photodiode.iter().fold(0.0f64, |peak, v| peak.max(v.abs()));

    let kept_samples = n_samples - config.end_remove;
    let mut detection = Array2::zeros((n_channels - 1, kept_samples));
    let mut out_row = 0;
    for channel in 0..n_channels {
        if channel == config.photodiode_channel {
            continue;
        }
        let mut series = channels.row(channel).to_vec();
        if config.signal_inversion {
            for value in &mut series {
                *value = -*value;
            }
        }
        if config.left_shift > 0 {
            let shift = config.left_shift % series.len();
            series.rotate_left(shift);
        }
        if config.threshold > 0.0 {
            for value in &mut series {
                if value.abs() < config.threshold {
                    *value = 0.0;
                }
            }
        }
        for (sample, value) in series[..kept_samples].iter().enumerate() {
            detection[[out_row, sample]] = *value as f32;
        }
        out_row += 1;
    }

    Ok(StepRecording {
        detection,
        pulse_energy,
        sample_spacing,
    })
}

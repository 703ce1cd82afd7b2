//! Reader for the robotic stage's scan log.
//!
//! The log is tab-separated text. A short preamble names the scan
//! dimensions, then one row per scan step and detector carries six
//! millimetre coordinates: the detector position followed by the reference
//! point the detector faces.
//!
//! ```text
//! # LOL-360 scan 2021-03-18
//! detectors	96
//! scan_points	30
//! elapsed_seconds	342.8
//! 0	0	-40.10	0.00	5.00	0.00	0.00	5.00
//! 0	1	-39.95	2.62	5.00	0.00	0.00	5.00
//! ...
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use ndarray::Array3;

use super::LawsonError;

/// Number of coordinates per scan log sample row
const SAMPLE_AXES: usize = 6;

/// The parsed scan log: one 6-vector per (detector, scan step) pair.
#[derive(Debug, Clone)]
pub struct ScanLog {
    /// Samples indexed [detector, axis, scan step], millimetres.
    /// Axes 0..3 are the detector position, 3..6 the reference point.
    samples: Array3<f64>,
    elapsed_seconds: Option<f64>,
}

impl ScanLog {
    /// Number of detectors on the ring
    pub fn num_detectors(&self) -> usize {
        self.samples.dim().0
    }

    /// Number of scan steps the stage visited
    pub fn num_scan_steps(&self) -> usize {
        self.samples.dim().2
    }

    /// Wall-clock duration of the scan, when the log recorded one
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_seconds
    }

    /// Detector position in millimetres at one scan step
    pub fn position_mm(&self, detector: usize, step: usize) -> [f64; 3] {
        [
            self.samples[[detector, 0, step]],
            self.samples[[detector, 1, step]],
            self.samples[[detector, 2, step]],
        ]
    }

    /// Reference point the detector faces, millimetres, at one scan step
    pub fn reference_mm(&self, detector: usize, step: usize) -> [f64; 3] {
        [
            self.samples[[detector, 3, step]],
            self.samples[[detector, 4, step]],
            self.samples[[detector, 5, step]],
        ]
    }

    /// The raw sample array indexed [detector, axis, scan step]
    pub fn samples(&self) -> &Array3<f64> {
        &self.samples
    }
}

/// Load and validate a scan log.
///
/// Every (scan step, detector) pair must appear exactly once; missing or
/// duplicated rows are errors, as are rows outside the declared dimensions.
pub fn load_scan_log(path: &Path) -> Result<ScanLog, LawsonError> {
    let text = fs::read_to_string(path)?;

    let mut num_detectors: Option<usize> = None;
    let mut num_steps: Option<usize> = None;
    let mut elapsed_seconds: Option<f64> = None;
    let mut samples: Option<Array3<f64>> = None;
    let mut filled: Vec<bool> = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        match fields.len() {
            2 => {
                parse_preamble_row(
                    &fields,
                    line_no,
                    &mut num_detectors,
                    &mut num_steps,
                    &mut elapsed_seconds,
                )?;
            }
            8 => {
                let (detectors, steps) = match (num_detectors, num_steps) {
                    (Some(d), Some(s)) => (d, s),
                    _ => {
                        return Err(LawsonError::MalformedLog {
                            line: line_no,
                            reason: "sample row before detectors/scan_points preamble"
                                .to_string(),
                        })
                    }
                };
                let samples = samples
                    .get_or_insert_with(|| Array3::zeros((detectors, SAMPLE_AXES, steps)));
                if filled.is_empty() {
                    filled = vec![false; detectors * steps];
                }
                parse_sample_row(&fields, line_no, detectors, steps, samples, &mut filled)?;
            }
            n => {
                return Err(LawsonError::MalformedLog {
                    line: line_no,
                    reason: format!("expected 2 or 8 tab-separated fields, got {}", n),
                })
            }
        }
    }

    let (detectors, steps) = match (num_detectors, num_steps) {
        (Some(d), Some(s)) => (d, s),
        _ => {
            return Err(LawsonError::IncompleteLog(
                "missing detectors/scan_points preamble".to_string(),
            ))
        }
    };
    let samples = samples.ok_or_else(|| {
        LawsonError::IncompleteLog("log contains no sample rows".to_string())
    })?;

    if let Some(gap) = filled.iter().position(|f| !f) {
        return Err(LawsonError::IncompleteLog(format!(
            "missing sample for scan step {}, detector {}",
            gap / detectors,
            gap % detectors
        )));
    }

    debug!(
        "parsed scan log {}: {} detectors, {} scan steps",
        path.display(),
        detectors,
        steps
    );

    Ok(ScanLog {
        samples,
        elapsed_seconds,
    })
}

fn parse_preamble_row(
    fields: &[&str],
    line_no: usize,
    num_detectors: &mut Option<usize>,
    num_steps: &mut Option<usize>,
    elapsed_seconds: &mut Option<f64>,
) -> Result<(), LawsonError> {
    let malformed = |reason: String| LawsonError::MalformedLog {
        line: line_no,
        reason,
    };

    match fields[0] {
        "detectors" => {
            set_dimension(num_detectors, fields[1], "detectors", line_no)?;
        }
        "scan_points" => {
            set_dimension(num_steps, fields[1], "scan_points", line_no)?;
        }
        "elapsed_seconds" => {
            let value: f64 = fields[1]
                .parse()
                .map_err(|_| malformed(format!("invalid number '{}'", fields[1])))?;
            *elapsed_seconds = Some(value);
        }
        other => {
            return Err(malformed(format!("unknown preamble field '{}'", other)));
        }
    }
    Ok(())
}

fn set_dimension(
    slot: &mut Option<usize>,
    field: &str,
    name: &str,
    line_no: usize,
) -> Result<(), LawsonError> {
    let malformed = |reason: String| LawsonError::MalformedLog {
        line: line_no,
        reason,
    };
    if slot.is_some() {
        return Err(malformed(format!("duplicate preamble field '{}'", name)));
    }
    let value: usize = field
        .parse()
        .map_err(|_| malformed(format!("invalid number '{}'", field)))?;
    if value == 0 {
        return Err(malformed(format!("{} must be positive", name)));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_sample_row(
    fields: &[&str],
    line_no: usize,
    detectors: usize,
    steps: usize,
    samples: &mut Array3<f64>,
    filled: &mut [bool],
) -> Result<(), LawsonError> {
    let malformed = |reason: String| LawsonError::MalformedLog {
        line: line_no,
        reason,
    };

    let step: usize = fields[0]
        .parse()
        .map_err(|_| malformed(format!("invalid scan step '{}'", fields[0])))?;
    let detector: usize = fields[1]
        .parse()
        .map_err(|_| malformed(format!("invalid detector index '{}'", fields[1])))?;
    if step >= steps {
        return Err(malformed(format!(
            "scan step {} out of range (scan_points is {})",
            step, steps
        )));
    }
    if detector >= detectors {
        return Err(malformed(format!(
            "detector {} out of range (detectors is {})",
            detector, detectors
        )));
    }

    let slot = &mut filled[step * detectors + detector];
    if *slot {
        return Err(malformed(format!(
            "duplicate sample for scan step {}, detector {}",
            step, detector
        )));
    }
    *slot = true;

    for (axis, field) in fields[2..].iter().enumerate() {
        let value: f64 = field
            .parse()
            .map_err(|_| malformed(format!("invalid number '{}'", field)))?;
        samples[[detector, axis, step]] = value;
    }
    Ok(())
}

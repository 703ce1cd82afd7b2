//! # Lawson Optics Lab 360 Adapter
//!
//! Converter for the rotating-ring photoacoustic tomograph of the Lawson
//! Optics Lab. The robotic stage sweeps the transducer ring through a series
//! of scan steps; each step leaves one raw recording on disk and six numbers
//! per detector in the scan log: the detector position and the reference
//! point it faces, both in millimetres.
//!
//! The adapter turns those inputs into the standardized model: per-element
//! positions and unit orientations in metres, the fixed acquisition tag
//! answers of this device, and the preprocessed detection waveforms.

mod converter;
mod raw_data;
mod scan_log;
pub mod synthetic;

#[cfg(test)]
mod tests;

pub use converter::{LawsonConfig, LawsonConverter, LAWSON_DEVICE_UUID};
pub use raw_data::{load_recording_folder, RecordingSet};
pub use scan_log::{load_scan_log, ScanLog};

/// Errors from loading or converting a Lawson scan
#[derive(Debug, thiserror::Error)]
pub enum LawsonError {
    /// I/O error reading a scan log or recording
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scan log text that does not follow the log format
    #[error("malformed scan log (line {line}): {reason}")]
    MalformedLog {
        /// 1-based line number in the log file
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// Scan log that ended before describing a full scan
    #[error("incomplete scan log: {0}")]
    IncompleteLog(String),

    /// Recording file that does not follow the recording format
    #[error("malformed recording {path}: {reason}")]
    MalformedRecording {
        /// Path of the offending file
        path: String,
        /// What was wrong with the file
        reason: String,
    },

    /// Scan log and recording folder disagree on the number of scan steps
    #[error("scan log lists {log_steps} scan steps but recording folder holds {recordings} recordings")]
    StepCountMismatch {
        /// Steps according to the scan log
        log_steps: usize,
        /// Recording files found in the folder
        recordings: usize,
    },

    /// Scan log and recordings disagree on the number of detectors
    #[error(
        "scan log lists {log_detectors} detectors but recordings hold {channels} detection channels"
    )]
    DetectorCountMismatch {
        /// Detectors according to the scan log
        log_detectors: usize,
        /// Detection channels in the recordings, photodiode excluded
        channels: usize,
    },

    /// Element geometry could not be computed
    #[error(transparent)]
    Geometry(#[from] crate::geometry::GeometryError),

    /// Device or recording metadata could not be assembled
    #[error(transparent)]
    Metadata(#[from] crate::metadata::MetadataError),
}

//! Evidence capture descriptors.
//!
//! The recorder itself is an external collaborator behind
//! [`AudioCapture`](crate::app::ports::AudioCapture); this module only
//! defines what goes in (a [`RecordingRequest`]) and what comes out (an
//! open [`EvidenceHandle`], then a finished [`EvidenceFile`]).

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

pub const EVIDENCE_PREFIX: &str = "EVIDENCE_";
pub const EVIDENCE_EXTENSION: &str = "m4a";

/// Parameters for a new capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    pub filename: String,
}

/// Open capture session.  Owned by the guardian while recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceHandle {
    /// Recorder-assigned session id.
    pub id: u32,
    pub filename: String,
    pub started_ms: u64,
}

/// Finished, immutable evidence descriptor handed to presentation/storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    pub filename: String,
    pub uri: String,
    pub duration_ms: Option<u64>,
}

/// `EVIDENCE_YYYY-MM-DD_HH-MM-SS.m4a` for the given local time.
pub fn evidence_filename<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "{EVIDENCE_PREFIX}{:04}-{:02}-{:02}_{:02}-{:02}-{:02}.{EVIDENCE_EXTENSION}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
    )
}

/// True if `name` looks like a file produced by [`evidence_filename`].
pub fn is_evidence_filename(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix(EVIDENCE_PREFIX)
        .and_then(|rest| rest.strip_suffix(EVIDENCE_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return false;
    };
    let bytes = stem.as_bytes();
    if bytes.len() != 19 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 | 13 | 16 => *b == b'-',
        10 => *b == b'_',
        _ => b.is_ascii_digit(),
    })
}

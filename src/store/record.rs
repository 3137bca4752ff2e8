use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw kernel as ingested: content hash and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub id: String,
    pub contents: String,
}

/// Preprocessing outcome code, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Accepted = 0,
    Bad = 1,
    Ugly = 2,
}

impl Status {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for Status {
    type Error = StoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Accepted),
            1 => Ok(Self::Bad),
            2 => Ok(Self::Ugly),
            other => Err(StoreError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Bad => write!(f, "bad"),
            Self::Ugly => write!(f, "ugly"),
        }
    }
}

/// One preprocessed unit: accepted text, or the reason it was rejected.
///
/// Serialized as the three-element array `[id, status, contents]`, one per
/// line in worker scratch files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RecordRow", try_from = "RecordRow")]
pub struct ProcessedRecord {
    pub id: String,
    pub status: Status,
    pub contents: String,
}

#[derive(Serialize, Deserialize)]
struct RecordRow(String, i64, String);

impl From<ProcessedRecord> for RecordRow {
    fn from(record: ProcessedRecord) -> Self {
        RecordRow(record.id, i64::from(record.status.code()), record.contents)
    }
}

impl TryFrom<RecordRow> for ProcessedRecord {
    type Error = StoreError;

    fn try_from(RecordRow(id, status, contents): RecordRow) -> Result<Self, Self::Error> {
        Ok(ProcessedRecord {
            id,
            status: Status::try_from(status)?,
            contents,
        })
    }
}

impl ProcessedRecord {
    pub fn new(id: impl Into<String>, status: Status, contents: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status,
            contents: contents.into(),
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ippwerk print backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IppwerkError;

/// Unique identifier for one submission run (used to correlate log lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IPP protocol version carried in the first two bytes of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IppVersion {
    pub major: u8,
    pub minor: u8,
}

impl IppVersion {
    pub const V1_0: Self = Self { major: 1, minor: 0 };
    pub const V1_1: Self = Self { major: 1, minor: 1 };
    pub const V2_0: Self = Self { major: 2, minor: 0 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for IppVersion {
    fn default() -> Self {
        Self::V1_1
    }
}

impl fmt::Display for IppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for IppVersion {
    type Err = IppwerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "2.0" => Ok(Self::V2_0),
            other => Err(IppwerkError::Config(format!(
                "unknown IPP version \"{other}\""
            ))),
        }
    }
}

impl TryFrom<String> for IppVersion {
    type Error = IppwerkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IppVersion> for String {
    fn from(value: IppVersion) -> Self {
        value.to_string()
    }
}

/// Where to send requests: the printer URI advertised in every request and
/// the HTTP resource path the requests are POSTed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterTarget {
    /// `printer-uri` operation attribute (never contains credentials).
    pub uri: String,
    /// HTTP resource path, e.g. `/printers/laser` or `/ipp/print`.
    pub resource: String,
    /// `requesting-user-name`; omitted from requests when `None` or empty.
    pub requesting_user: Option<String>,
    /// `attributes-natural-language`.
    pub natural_language: String,
}

impl PrinterTarget {
    pub fn new(uri: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            resource: resource.into(),
            requesting_user: None,
            natural_language: "en".into(),
        }
    }

    /// The requesting user, if one was given and is non-empty.
    pub fn user(&self) -> Option<&str> {
        self.requesting_user.as_deref().filter(|u| !u.is_empty())
    }
}

/// A single `name=value` job option from the scheduler's option string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOption {
    pub name: String,
    pub value: String,
}

/// Everything the submission needs to know about the job itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTicket {
    /// `job-name`; omitted when empty.
    pub title: String,
    /// Number of copies requested by the user.
    pub copies: u32,
    /// Extra job template attributes (only sent to printers that handle copies).
    pub options: Vec<JobOption>,
    /// Whether the client should replicate copies itself when the printer
    /// cannot.  Spooled stdin jobs already carry their copies.
    pub manual_copies: bool,
}

impl Default for JobTicket {
    fn default() -> Self {
        Self {
            title: String::new(),
            copies: 1,
            options: Vec::new(),
            manual_copies: true,
        }
    }
}

/// One accounting record, emitted once per physical copy transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub copies: u32,
}

impl fmt::Display for PageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.page, self.copies)
    }
}

/// Final summary of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub id: SubmissionId,
    /// IPP version the printer was finally spoken to with.
    pub version: IppVersion,
    /// Printer-assigned job ids, one per accepted Print-Job (unknown ids omitted).
    pub job_ids: Vec<i32>,
    /// Per-copy accounting records.
    pub pages: Vec<PageRecord>,
    /// Last `job-media-sheets-completed` seen when a job finished.
    pub sheets_completed: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

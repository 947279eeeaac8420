// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP protocol catalogue: delimiter and value tags, operation ids, status
// codes, and the job/printer state enums (RFC 8010 SS3.5, RFC 8011 SS4-5).

use std::fmt;

use ippwerk_core::error::IppwerkError;

// ---------------------------------------------------------------------------
// Delimiter tags (RFC 8010 SS3.5.1)
// ---------------------------------------------------------------------------

/// Reserved delimiter; treated as end-of-attributes.
pub const TAG_ZERO: u8 = 0x00;

/// End-of-attributes-tag -- terminates the attribute section.
pub const TAG_END_OF_ATTRIBUTES: u8 = 0x03;

/// Bytes below this value are delimiters, everything else is a value tag.
pub const FIRST_VALUE_TAG: u8 = 0x10;

/// Attribute group delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GroupTag {
    Operation = 0x01,
    Job = 0x02,
    Printer = 0x04,
    Unsupported = 0x05,
    Subscription = 0x06,
    EventNotification = 0x07,
    Resource = 0x08,
    Document = 0x09,
    System = 0x0A,
}

impl GroupTag {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Self::Operation,
            0x02 => Self::Job,
            0x04 => Self::Printer,
            0x05 => Self::Unsupported,
            0x06 => Self::Subscription,
            0x07 => Self::EventNotification,
            0x08 => Self::Resource,
            0x09 => Self::Document,
            0x0A => Self::System,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Value tags (RFC 8010 SS3.5.2)
// ---------------------------------------------------------------------------

/// Value tag shared by every value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    // Out-of-band values carry no payload.
    Unsupported = 0x10,
    Unknown = 0x12,
    NoValue = 0x13,
    NotSettable = 0x15,
    DeleteAttribute = 0x16,
    AdminDefine = 0x17,

    Integer = 0x21,
    Boolean = 0x22,
    Enum = 0x23,

    OctetString = 0x30,
    DateTime = 0x31,
    Resolution = 0x32,
    RangeOfInteger = 0x33,
    BegCollection = 0x34,
    TextWithLanguage = 0x35,
    NameWithLanguage = 0x36,
    EndCollection = 0x37,

    Text = 0x41,
    Name = 0x42,
    Keyword = 0x44,
    Uri = 0x45,
    UriScheme = 0x46,
    Charset = 0x47,
    NaturalLanguage = 0x48,
    MimeMediaType = 0x49,
    MemberAttrName = 0x4A,
}

impl ValueTag {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x10 => Self::Unsupported,
            0x12 => Self::Unknown,
            0x13 => Self::NoValue,
            0x15 => Self::NotSettable,
            0x16 => Self::DeleteAttribute,
            0x17 => Self::AdminDefine,
            0x21 => Self::Integer,
            0x22 => Self::Boolean,
            0x23 => Self::Enum,
            0x30 => Self::OctetString,
            0x31 => Self::DateTime,
            0x32 => Self::Resolution,
            0x33 => Self::RangeOfInteger,
            0x34 => Self::BegCollection,
            0x35 => Self::TextWithLanguage,
            0x36 => Self::NameWithLanguage,
            0x37 => Self::EndCollection,
            0x41 => Self::Text,
            0x42 => Self::Name,
            0x44 => Self::Keyword,
            0x45 => Self::Uri,
            0x46 => Self::UriScheme,
            0x47 => Self::Charset,
            0x48 => Self::NaturalLanguage,
            0x49 => Self::MimeMediaType,
            0x4A => Self::MemberAttrName,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// `unsupported`, `unknown`, `no-value` and friends.
    pub fn is_out_of_band(self) -> bool {
        (self as u8) < 0x20
    }

    /// Tags whose values share the plain string representation.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Name
                | Self::Keyword
                | Self::Uri
                | Self::UriScheme
                | Self::Charset
                | Self::NaturalLanguage
                | Self::MimeMediaType
        )
    }

    /// Tags that only appear inside collection framing on the wire.
    pub fn is_collection_framing(self) -> bool {
        matches!(self, Self::EndCollection | Self::MemberAttrName)
    }

    /// RFC 8010 syntax name, used in diagnostics.
    pub fn syntax_name(self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
            Self::NoValue => "no-value",
            Self::NotSettable => "not-settable",
            Self::DeleteAttribute => "delete-attribute",
            Self::AdminDefine => "admin-define",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::OctetString => "octetString",
            Self::DateTime => "dateTime",
            Self::Resolution => "resolution",
            Self::RangeOfInteger => "rangeOfInteger",
            Self::BegCollection => "collection",
            Self::TextWithLanguage => "textWithLanguage",
            Self::NameWithLanguage => "nameWithLanguage",
            Self::EndCollection => "endCollection",
            Self::Text => "textWithoutLanguage",
            Self::Name => "nameWithoutLanguage",
            Self::Keyword => "keyword",
            Self::Uri => "uri",
            Self::UriScheme => "uriScheme",
            Self::Charset => "charset",
            Self::NaturalLanguage => "naturalLanguage",
            Self::MimeMediaType => "mimeMediaType",
            Self::MemberAttrName => "memberAttrName",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.syntax_name())
    }
}

// ---------------------------------------------------------------------------
// Operation ids (RFC 8011 SS4)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Operation {
    PrintJob = 0x0002,
    PrintUri = 0x0003,
    ValidateJob = 0x0004,
    CreateJob = 0x0005,
    SendDocument = 0x0006,
    SendUri = 0x0007,
    CancelJob = 0x0008,
    GetJobAttributes = 0x0009,
    GetJobs = 0x000A,
    GetPrinterAttributes = 0x000B,
    HoldJob = 0x000C,
    ReleaseJob = 0x000D,
    RestartJob = 0x000E,
    PausePrinter = 0x0010,
    ResumePrinter = 0x0011,
    PurgeJobs = 0x0012,
}

impl Operation {
    pub fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            0x0002 => Self::PrintJob,
            0x0003 => Self::PrintUri,
            0x0004 => Self::ValidateJob,
            0x0005 => Self::CreateJob,
            0x0006 => Self::SendDocument,
            0x0007 => Self::SendUri,
            0x0008 => Self::CancelJob,
            0x0009 => Self::GetJobAttributes,
            0x000A => Self::GetJobs,
            0x000B => Self::GetPrinterAttributes,
            0x000C => Self::HoldJob,
            0x000D => Self::ReleaseJob,
            0x000E => Self::RestartJob,
            0x0010 => Self::PausePrinter,
            0x0011 => Self::ResumePrinter,
            0x0012 => Self::PurgeJobs,
            _ => return None,
        })
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PrintJob => "Print-Job",
            Self::PrintUri => "Print-URI",
            Self::ValidateJob => "Validate-Job",
            Self::CreateJob => "Create-Job",
            Self::SendDocument => "Send-Document",
            Self::SendUri => "Send-URI",
            Self::CancelJob => "Cancel-Job",
            Self::GetJobAttributes => "Get-Job-Attributes",
            Self::GetJobs => "Get-Jobs",
            Self::GetPrinterAttributes => "Get-Printer-Attributes",
            Self::HoldJob => "Hold-Job",
            Self::ReleaseJob => "Release-Job",
            Self::RestartJob => "Restart-Job",
            Self::PausePrinter => "Pause-Printer",
            Self::ResumePrinter => "Resume-Printer",
            Self::PurgeJobs => "Purge-Jobs",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Status codes (RFC 8011 SS4.1.8, SS13.1)
// ---------------------------------------------------------------------------

/// IPP status code.  Kept open-ended: printers return vendor codes too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: Self = Self(0x0000);
    pub const OK_IGNORED_OR_SUBSTITUTED: Self = Self(0x0001);
    pub const OK_CONFLICTING: Self = Self(0x0002);

    pub const BAD_REQUEST: Self = Self(0x0400);
    pub const FORBIDDEN: Self = Self(0x0401);
    pub const NOT_AUTHENTICATED: Self = Self(0x0402);
    pub const NOT_AUTHORIZED: Self = Self(0x0403);
    pub const NOT_POSSIBLE: Self = Self(0x0404);
    pub const TIMEOUT: Self = Self(0x0405);
    pub const NOT_FOUND: Self = Self(0x0406);
    pub const GONE: Self = Self(0x0407);
    pub const REQUEST_ENTITY_TOO_LARGE: Self = Self(0x0408);
    pub const REQUEST_VALUE_TOO_LONG: Self = Self(0x0409);
    pub const DOCUMENT_FORMAT_NOT_SUPPORTED: Self = Self(0x040A);
    pub const ATTRIBUTES_OR_VALUES_NOT_SUPPORTED: Self = Self(0x040B);
    pub const URI_SCHEME_NOT_SUPPORTED: Self = Self(0x040C);
    pub const CHARSET_NOT_SUPPORTED: Self = Self(0x040D);
    pub const CONFLICTING_ATTRIBUTES: Self = Self(0x040E);
    pub const COMPRESSION_NOT_SUPPORTED: Self = Self(0x040F);
    pub const COMPRESSION_ERROR: Self = Self(0x0410);
    pub const DOCUMENT_FORMAT_ERROR: Self = Self(0x0411);
    pub const DOCUMENT_ACCESS_ERROR: Self = Self(0x0412);

    pub const INTERNAL_ERROR: Self = Self(0x0500);
    pub const OPERATION_NOT_SUPPORTED: Self = Self(0x0501);
    pub const SERVICE_UNAVAILABLE: Self = Self(0x0502);
    pub const VERSION_NOT_SUPPORTED: Self = Self(0x0503);
    pub const DEVICE_ERROR: Self = Self(0x0504);
    pub const TEMPORARY_ERROR: Self = Self(0x0505);
    pub const NOT_ACCEPTING_JOBS: Self = Self(0x0506);
    pub const BUSY: Self = Self(0x0507);
    pub const JOB_CANCELED: Self = Self(0x0508);
    pub const MULTIPLE_DOCUMENT_JOBS_NOT_SUPPORTED: Self = Self(0x0509);

    /// `successful-ok` through `successful-ok-*`.
    pub fn is_success(self) -> bool {
        self.0 < 0x0100
    }

    /// The RFC keyword, e.g. `client-error-not-found`.
    pub fn name(self) -> &'static str {
        match self.0 {
            0x0000 => "successful-ok",
            0x0001 => "successful-ok-ignored-or-substituted-attributes",
            0x0002 => "successful-ok-conflicting-attributes",
            0x0400 => "client-error-bad-request",
            0x0401 => "client-error-forbidden",
            0x0402 => "client-error-not-authenticated",
            0x0403 => "client-error-not-authorized",
            0x0404 => "client-error-not-possible",
            0x0405 => "client-error-timeout",
            0x0406 => "client-error-not-found",
            0x0407 => "client-error-gone",
            0x0408 => "client-error-request-entity-too-large",
            0x0409 => "client-error-request-value-too-long",
            0x040A => "client-error-document-format-not-supported",
            0x040B => "client-error-attributes-or-values-not-supported",
            0x040C => "client-error-uri-scheme-not-supported",
            0x040D => "client-error-charset-not-supported",
            0x040E => "client-error-conflicting-attributes",
            0x040F => "client-error-compression-not-supported",
            0x0410 => "client-error-compression-error",
            0x0411 => "client-error-document-format-error",
            0x0412 => "client-error-document-access-error",
            0x0500 => "server-error-internal-error",
            0x0501 => "server-error-operation-not-supported",
            0x0502 => "server-error-service-unavailable",
            0x0503 => "server-error-version-not-supported",
            0x0504 => "server-error-device-error",
            0x0505 => "server-error-temporary-error",
            0x0506 => "server-error-not-accepting-jobs",
            0x0507 => "server-error-busy",
            0x0508 => "server-error-job-canceled",
            0x0509 => "server-error-multiple-document-jobs-not-supported",
            0x0000..=0x00FF => "successful-ok-unknown",
            0x0400..=0x04FF => "client-error-unknown",
            0x0500..=0x05FF => "server-error-unknown",
            _ => "unknown-status",
        }
    }

    /// Turn a non-success status into the crate error.
    pub fn into_error(self, message: Option<String>) -> IppwerkError {
        IppwerkError::Status {
            code: self.0,
            name: self.name(),
            message,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Job and printer states (RFC 8011 SS5.3.7, SS5.4.11)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum JobState {
    Pending = 3,
    PendingHeld = 4,
    Processing = 5,
    ProcessingStopped = 6,
    Canceled = 7,
    Aborted = 8,
    Completed = 9,
}

impl JobState {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            3 => Self::Pending,
            4 => Self::PendingHeld,
            5 => Self::Processing,
            6 => Self::ProcessingStopped,
            7 => Self::Canceled,
            8 => Self::Aborted,
            9 => Self::Completed,
            _ => return None,
        })
    }

    /// Whether a monitoring client should stop polling.  `pending-held`
    /// counts: a held job may sit in the queue indefinitely.
    pub fn ends_monitoring(self) -> bool {
        self > Self::Processing || self == Self::PendingHeld
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingHeld => "pending-held",
            Self::Processing => "processing",
            Self::ProcessingStopped => "processing-stopped",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum PrinterState {
    Idle = 3,
    Processing = 4,
    Stopped = 5,
}

impl PrinterState {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            3 => Self::Idle,
            4 => Self::Processing,
            5 => Self::Stopped,
            _ => return None,
        })
    }
}

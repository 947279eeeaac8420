// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP value model: one variant per value shape, shared by all value tags of
// that shape.  Accessors are strict; nothing converts between integers and
// strings behind the caller's back.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};

use ippwerk_core::error::{IppwerkError, Result};

use crate::message::Attribute;
use crate::tag::ValueTag;

// ---------------------------------------------------------------------------
// Compound value types
// ---------------------------------------------------------------------------

/// Resolution units (RFC 8010 SS3.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResolutionUnit {
    PerInch = 3,
    PerCm = 4,
}

impl ResolutionUnit {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Self::PerInch),
            4 => Some(Self::PerCm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub x: i32,
    pub y: i32,
    pub units: ResolutionUnit,
}

/// A `rangeOfInteger` whose lower bound never exceeds its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeOfInteger {
    lower: i32,
    upper: i32,
}

impl RangeOfInteger {
    /// Returns `None` when `lower > upper`.
    pub fn new(lower: i32, upper: i32) -> Option<Self> {
        (lower <= upper).then_some(Self { lower, upper })
    }

    pub fn lower(self) -> i32 {
        self.lower
    }

    pub fn upper(self) -> i32 {
        self.upper
    }
}

/// The 11-byte RFC 2579 `DateAndTime` encoding used by `dateTime` values.
///
/// ```text
/// year (2)  month  day  hour  minutes  seconds  deci-seconds
/// direction ('+' or '-')  hours-from-UTC  minutes-from-UTC
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IppDate(pub [u8; 11]);

impl IppDate {
    /// Encode a Unix timestamp as a UTC date.  `None` outside the years a
    /// two-byte year field can hold.
    pub fn from_unix(seconds: i64) -> Option<Self> {
        let when = DateTime::<Utc>::from_timestamp(seconds, 0)?;
        Self::from_datetime(&when)
    }

    pub fn from_datetime(when: &DateTime<Utc>) -> Option<Self> {
        let year = u16::try_from(when.year()).ok()?;
        let [hi, lo] = year.to_be_bytes();
        Some(Self([
            hi,
            lo,
            when.month() as u8,
            when.day() as u8,
            when.hour() as u8,
            when.minute() as u8,
            when.second().min(60) as u8,
            (when.nanosecond() / 100_000_000).min(9) as u8,
            b'+',
            0,
            0,
        ]))
    }

    /// Decode into a timestamp with the encoded UTC offset applied.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let b = &self.0;
        let year = i32::from(u16::from_be_bytes([b[0], b[1]]));
        let date = NaiveDate::from_ymd_opt(year, u32::from(b[2]), u32::from(b[3]))?;
        let local = date.and_hms_milli_opt(
            u32::from(b[4]),
            u32::from(b[5]),
            u32::from(b[6]),
            u32::from(b[7]) * 100,
        )?;

        let offset_secs = i32::from(b[9]) * 3600 + i32::from(b[10]) * 60;
        let offset = match b[8] {
            b'+' => FixedOffset::east_opt(offset_secs)?,
            b'-' => FixedOffset::west_opt(offset_secs)?,
            _ => return None,
        };

        offset.from_local_datetime(&local).single()
    }

    pub fn to_unix(&self) -> Option<i64> {
        self.to_datetime().map(|d| d.timestamp())
    }
}

/// A nested attribute list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub members: Vec<Attribute>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-valued member.
    pub fn add(&mut self, tag: ValueTag, name: impl Into<String>, value: Value) -> &mut Self {
        self.members.push(Attribute::new(name, tag, vec![value]));
        self
    }

    pub fn add_values(
        &mut self,
        tag: ValueTag,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> &mut Self {
        self.members.push(Attribute::new(name, tag, values));
        self
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.members.iter().find(|m| m.name == name)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One IPP value.  The attribute's value tag says which IPP syntax it is;
/// this enum only records the shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Boolean(bool),
    Enum(i32),
    /// `octetString`, and the (normally empty) payload of out-of-band tags.
    Octets(Vec<u8>),
    DateTime(IppDate),
    Resolution(Resolution),
    Range(RangeOfInteger),
    /// `textWithLanguage` / `nameWithLanguage`.
    LangString { language: String, text: String },
    /// text, name, keyword, uri, uriScheme, charset, naturalLanguage and
    /// mimeMediaType all share this shape.
    String(String),
    Collection(Collection),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn lang_string(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self::LangString {
            language: language.into(),
            text: text.into(),
        }
    }

    pub fn resolution(x: i32, y: i32, units: ResolutionUnit) -> Self {
        Self::Resolution(Resolution { x, y, units })
    }

    /// Out-of-band values carry no bytes.
    pub fn out_of_band() -> Self {
        Self::Octets(Vec::new())
    }

    /// Short description of the stored shape.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Enum(_) => "enum",
            Self::Octets(_) => "octetString",
            Self::DateTime(_) => "dateTime",
            Self::Resolution(_) => "resolution",
            Self::Range(_) => "rangeOfInteger",
            Self::LangString { .. } => "stringWithLanguage",
            Self::String(_) => "string",
            Self::Collection(_) => "collection",
        }
    }

    /// Whether this value may be carried under `tag`.
    pub fn fits(&self, tag: ValueTag) -> bool {
        match self {
            Self::Integer(_) => tag == ValueTag::Integer,
            Self::Boolean(_) => tag == ValueTag::Boolean,
            Self::Enum(_) => tag == ValueTag::Enum,
            Self::Octets(_) => tag == ValueTag::OctetString || tag.is_out_of_band(),
            Self::DateTime(_) => tag == ValueTag::DateTime,
            Self::Resolution(_) => tag == ValueTag::Resolution,
            Self::Range(_) => tag == ValueTag::RangeOfInteger,
            Self::LangString { .. } => {
                matches!(tag, ValueTag::TextWithLanguage | ValueTag::NameWithLanguage)
            }
            Self::String(_) => tag.is_string(),
            Self::Collection(_) => tag == ValueTag::BegCollection,
        }
    }

    fn mismatch(&self, expected: &'static str) -> IppwerkError {
        IppwerkError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn as_integer(&self) -> Result<i32> {
        match self {
            Self::Integer(v) => Ok(*v),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_enum(&self) -> Result<i32> {
        match self {
            Self::Enum(v) => Ok(*v),
            other => Err(other.mismatch("enum")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(v) => Ok(*v),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_octets(&self) -> Result<&[u8]> {
        match self {
            Self::Octets(v) => Ok(v),
            other => Err(other.mismatch("octetString")),
        }
    }

    pub fn as_date(&self) -> Result<IppDate> {
        match self {
            Self::DateTime(v) => Ok(*v),
            other => Err(other.mismatch("dateTime")),
        }
    }

    pub fn as_resolution(&self) -> Result<Resolution> {
        match self {
            Self::Resolution(v) => Ok(*v),
            other => Err(other.mismatch("resolution")),
        }
    }

    pub fn as_range(&self) -> Result<RangeOfInteger> {
        match self {
            Self::Range(v) => Ok(*v),
            other => Err(other.mismatch("rangeOfInteger")),
        }
    }

    /// `(language, text)`.
    pub fn as_lang_string(&self) -> Result<(&str, &str)> {
        match self {
            Self::LangString { language, text } => Ok((language, text)),
            other => Err(other.mismatch("stringWithLanguage")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_collection(&self) -> Result<&Collection> {
        match self {
            Self::Collection(v) => Ok(v),
            other => Err(other.mismatch("collection")),
        }
    }
}

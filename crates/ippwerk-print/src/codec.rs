// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP binary transfer syntax (RFC 8010 SS3).
//
// ```text
// version-number:  2 bytes (major, minor)
// operation-id / status-code: 2 bytes (big-endian u16)
// request-id:      4 bytes (big-endian u32)
// attribute-groups: variable
//   delimiter-tag: 1 byte
//   attributes:    variable
//     value-tag:    1 byte
//     name-length:  2 bytes (big-endian u16)
//     name:         name-length bytes
//     value-length: 2 bytes (big-endian u16)
//     value:        value-length bytes
// end-of-attributes-tag: 1 byte (0x03)
// document-data: remainder
// ```
//
// The decoder is push-driven: callers `feed` whatever bytes they have and
// call `advance`, which consumes whole records only.  A record is never
// half-applied, so decoding resumes cleanly when more input arrives.  Length
// prefixes are checked against the configured cap and against the bytes
// actually buffered; nothing is allocated from a declared length.

use std::io::{Read, Write};

use ippwerk_core::config::DEFAULT_MAX_FIELD_LENGTH;
use ippwerk_core::error::{IppwerkError, Result};
use ippwerk_core::types::IppVersion;

use crate::message::{Attribute, Message};
use crate::tag::{FIRST_VALUE_TAG, GroupTag, TAG_END_OF_ATTRIBUTES, TAG_ZERO, ValueTag};
use crate::value::{Collection, IppDate, RangeOfInteger, Resolution, ResolutionUnit, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed message header: version (2) + code (2) + request-id (4).
const HEADER_LEN: usize = 8;

/// Largest name or value the two-byte length prefix can describe.
const MAX_WIRE_FIELD: usize = u16::MAX as usize;

/// Bytes pulled from a reader per `read_from` call.
const READ_CHUNK: usize = 4096;

/// Default collection nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 32;

fn malformed(detail: impl Into<String>) -> IppwerkError {
    IppwerkError::MalformedMessage(detail.into())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Caps applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest name or value accepted, checked at the length prefix.
    pub max_field_length: usize,
    /// Deepest collection nesting accepted.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Outcome of one decoding step.
#[derive(Debug)]
pub enum Progress {
    NeedMoreInput,
    Complete(Message),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Attributes,
    Done,
}

/// One wire record, borrowed from the input buffer.
enum Record<'a> {
    Delimiter(u8),
    Value {
        tag: u8,
        name: &'a [u8],
        value: &'a [u8],
    },
}

/// Result of looking at the front of the buffer.
enum Peek<'a> {
    Record(Record<'a>, usize),
    /// Not enough bytes yet; the string says what is missing.
    Short(String),
}

/// Where a collection lands once its `endCollection` arrives.
#[derive(Debug)]
enum Target {
    /// A new attribute (or member) with this name.
    New(String),
    /// An extra value of the previous attribute (or member).
    Append,
}

#[derive(Debug)]
struct Frame {
    collection: Collection,
    target: Target,
    /// Name from the last `memberAttrName`, waiting for its first value.
    pending_member: Option<String>,
}

/// Assembles a message from records.
#[derive(Debug, Default)]
struct Builder {
    message: Message,
    stack: Vec<Frame>,
}

/// Incremental IPP message decoder.
#[derive(Debug)]
pub struct Decoder {
    buf: Vec<u8>,
    pos: usize,
    limits: DecodeLimits,
    phase: Phase,
    builder: Builder,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_limits(DecodeLimits::default())
    }

    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            limits,
            phase: Phase::Header,
            builder: Builder::default(),
        }
    }

    /// Buffer more input.  Nothing is parsed until [`advance`](Self::advance).
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not consumed.  After a message completes these are
    /// the start of the document data.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Consume as many whole records as are buffered.
    pub fn advance(&mut self) -> Result<Progress> {
        loop {
            match self.phase {
                Phase::Header => {
                    if self.remaining().len() < HEADER_LEN {
                        return Ok(Progress::NeedMoreInput);
                    }
                    self.read_header()?;
                    self.phase = Phase::Attributes;
                }
                Phase::Attributes => {
                    let step = {
                        let Self {
                            buf,
                            pos,
                            limits,
                            builder,
                            ..
                        } = &mut *self;
                        match peek(&buf[*pos..], limits)? {
                            Peek::Short(_) => None,
                            Peek::Record(record, len) => {
                                Some((builder.apply(record, limits)?, len))
                            }
                        }
                    };
                    let Some((finished, len)) = step else {
                        self.compact();
                        return Ok(Progress::NeedMoreInput);
                    };
                    self.pos += len;
                    if finished {
                        self.phase = Phase::Done;
                        let message = std::mem::take(&mut self.builder.message);
                        return Ok(Progress::Complete(message));
                    }
                }
                Phase::Done => return Err(malformed("decoder has already produced a message")),
            }
        }
    }

    /// Pull one chunk from `source` and advance.  End of input before the
    /// end-of-attributes tag is an error naming the truncated field.
    pub fn read_from<R: Read>(&mut self, source: &mut R) -> Result<Progress> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = source.read(&mut chunk)?;
        if n == 0 {
            return Err(self.truncation_error());
        }
        self.feed(&chunk[..n]);
        self.advance()
    }

    /// Declare end of input and return the message, or say what is missing.
    pub fn finish(mut self) -> Result<Message> {
        match self.advance()? {
            Progress::Complete(message) => Ok(message),
            Progress::NeedMoreInput => Err(self.truncation_error()),
        }
    }

    fn read_header(&mut self) -> Result<()> {
        let h = &self.buf[self.pos..self.pos + HEADER_LEN];
        let version = IppVersion::new(h[0], h[1]);
        if !(1..=2).contains(&version.major) {
            return Err(malformed(format!("unsupported IPP version {version}")));
        }
        let message = &mut self.builder.message;
        message.version = version;
        message.code = u16::from_be_bytes([h[2], h[3]]);
        message.request_id = u32::from_be_bytes([h[4], h[5], h[6], h[7]]);
        self.pos += HEADER_LEN;
        Ok(())
    }

    fn truncation_error(&self) -> IppwerkError {
        let input = self.remaining();
        match self.phase {
            Phase::Header => malformed(format!(
                "truncated header: {} of {HEADER_LEN} bytes",
                input.len()
            )),
            Phase::Done => malformed("decoder has already produced a message"),
            Phase::Attributes => match peek(input, &self.limits) {
                Err(e) => e,
                Ok(Peek::Short(reason)) => malformed(reason),
                Ok(Peek::Record(..)) => malformed("input ended before end-of-attributes tag"),
            },
        }
    }

    /// Drop consumed bytes once they dominate the buffer.
    fn compact(&mut self) {
        if self.pos > 0 && self.pos * 2 >= self.buf.len() {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Look at the front of `input` without consuming it.
fn peek<'a>(input: &'a [u8], limits: &DecodeLimits) -> Result<Peek<'a>> {
    let Some(&tag) = input.first() else {
        return Ok(Peek::Short("missing end-of-attributes tag".into()));
    };
    if tag < FIRST_VALUE_TAG {
        return Ok(Peek::Record(Record::Delimiter(tag), 1));
    }

    if input.len() < 3 {
        return Ok(Peek::Short(format!("truncated name-length after tag 0x{tag:02x}")));
    }
    let name_len = usize::from(u16::from_be_bytes([input[1], input[2]]));
    if name_len > limits.max_field_length {
        return Err(malformed(format!(
            "name length {name_len} exceeds limit {}",
            limits.max_field_length
        )));
    }
    let name_end = 3 + name_len;
    if input.len() < name_end {
        return Ok(Peek::Short(format!(
            "name length {name_len} exceeds remaining input {}",
            input.len() - 3
        )));
    }

    if input.len() < name_end + 2 {
        return Ok(Peek::Short("truncated value-length".into()));
    }
    let value_len = usize::from(u16::from_be_bytes([input[name_end], input[name_end + 1]]));
    if value_len > limits.max_field_length {
        return Err(malformed(format!(
            "value length {value_len} exceeds limit {}",
            limits.max_field_length
        )));
    }
    let value_start = name_end + 2;
    let end = value_start + value_len;
    if input.len() < end {
        return Ok(Peek::Short(format!(
            "value length {value_len} exceeds remaining input {}",
            input.len() - value_start
        )));
    }

    Ok(Peek::Record(
        Record::Value {
            tag,
            name: &input[3..name_end],
            value: &input[value_start..end],
        },
        end,
    ))
}

impl Builder {
    /// Apply one record.  Returns `true` at end-of-attributes.
    fn apply(&mut self, record: Record<'_>, limits: &DecodeLimits) -> Result<bool> {
        match record {
            Record::Delimiter(byte) => self.delimiter(byte),
            Record::Value { tag, name, value } => {
                let tag = ValueTag::from_u8(tag)
                    .ok_or_else(|| malformed(format!("unknown value tag 0x{tag:02x}")))?;
                if self.stack.is_empty() {
                    self.top_level(tag, name, value, limits)?;
                } else {
                    self.member(tag, name, value, limits)?;
                }
                Ok(false)
            }
        }
    }

    fn delimiter(&mut self, byte: u8) -> Result<bool> {
        if byte == TAG_END_OF_ATTRIBUTES || byte == TAG_ZERO {
            if !self.stack.is_empty() {
                return Err(malformed("end of attributes inside an unterminated collection"));
            }
            return Ok(true);
        }
        if !self.stack.is_empty() {
            return Err(malformed(format!("group tag 0x{byte:02x} inside a collection")));
        }
        let group = GroupTag::from_u8(byte)
            .ok_or_else(|| malformed(format!("unknown group tag 0x{byte:02x}")))?;
        self.message.begin_group(group);
        Ok(false)
    }

    fn top_level(
        &mut self,
        tag: ValueTag,
        name: &[u8],
        value: &[u8],
        limits: &DecodeLimits,
    ) -> Result<()> {
        if tag.is_collection_framing() {
            return Err(malformed(format!("{tag} outside a collection")));
        }
        let group = self
            .message
            .groups
            .last_mut()
            .ok_or_else(|| malformed("attribute before the first group tag"))?;

        if name.is_empty() {
            let attr = group
                .attributes
                .last_mut()
                .ok_or_else(|| malformed("additional value without a preceding attribute"))?;
            check_set_tag(attr, tag)?;
            if tag == ValueTag::BegCollection {
                return self.open_collection(Target::Append, value, limits);
            }
            attr.values.push(parse_value(tag, value)?);
            return Ok(());
        }

        let name = String::from_utf8_lossy(name).into_owned();
        if tag == ValueTag::BegCollection {
            return self.open_collection(Target::New(name), value, limits);
        }
        let value = parse_value(tag, value)?;
        group.attributes.push(Attribute::new(name, tag, vec![value]));
        Ok(())
    }

    fn member(
        &mut self,
        tag: ValueTag,
        name: &[u8],
        value: &[u8],
        limits: &DecodeLimits,
    ) -> Result<()> {
        if !name.is_empty() {
            return Err(malformed("named attribute inside a collection"));
        }
        let Some(frame) = self.stack.last_mut() else {
            return Err(malformed("collection member outside a collection"));
        };

        match tag {
            ValueTag::MemberAttrName => {
                if value.is_empty() {
                    return Err(malformed("empty memberAttrName"));
                }
                if let Some(previous) = &frame.pending_member {
                    return Err(malformed(format!("member \"{previous}\" has no value")));
                }
                frame.pending_member = Some(String::from_utf8_lossy(value).into_owned());
                Ok(())
            }
            ValueTag::EndCollection => {
                if !value.is_empty() {
                    return Err(malformed("endCollection with a value"));
                }
                if let Some(previous) = &frame.pending_member {
                    return Err(malformed(format!("member \"{previous}\" has no value")));
                }
                let Some(done) = self.stack.pop() else {
                    return Err(malformed("endCollection outside a collection"));
                };
                self.close_collection(done)
            }
            _ => match frame.pending_member.take() {
                Some(member_name) => {
                    if tag == ValueTag::BegCollection {
                        return self.open_collection(Target::New(member_name), value, limits);
                    }
                    let value = parse_value(tag, value)?;
                    frame
                        .collection
                        .members
                        .push(Attribute::new(member_name, tag, vec![value]));
                    Ok(())
                }
                None => {
                    let attr = frame.collection.members.last_mut().ok_or_else(|| {
                        malformed("collection value without a memberAttrName")
                    })?;
                    check_set_tag(attr, tag)?;
                    if tag == ValueTag::BegCollection {
                        return self.open_collection(Target::Append, value, limits);
                    }
                    attr.values.push(parse_value(tag, value)?);
                    Ok(())
                }
            },
        }
    }

    fn open_collection(
        &mut self,
        target: Target,
        value: &[u8],
        limits: &DecodeLimits,
    ) -> Result<()> {
        if !value.is_empty() {
            return Err(malformed("begCollection with a value"));
        }
        if self.stack.len() >= limits.max_depth {
            return Err(malformed(format!(
                "collection nesting exceeds {}",
                limits.max_depth
            )));
        }
        self.stack.push(Frame {
            collection: Collection::new(),
            target,
            pending_member: None,
        });
        Ok(())
    }

    fn close_collection(&mut self, frame: Frame) -> Result<()> {
        let list = match self.stack.last_mut() {
            Some(parent) => &mut parent.collection.members,
            None => {
                &mut self
                    .message
                    .groups
                    .last_mut()
                    .ok_or_else(|| malformed("collection outside any group"))?
                    .attributes
            }
        };

        let value = Value::Collection(frame.collection);
        match frame.target {
            Target::New(name) => {
                list.push(Attribute::new(name, ValueTag::BegCollection, vec![value]))
            }
            Target::Append => list
                .last_mut()
                .ok_or_else(|| malformed("additional collection without a preceding attribute"))?
                .values
                .push(value),
        }
        Ok(())
    }
}

/// A 1setOf keeps one tag.  String syntaxes may be mixed (printers do mix
/// name and text); the first tag wins.
fn check_set_tag(attr: &Attribute, tag: ValueTag) -> Result<()> {
    if attr.tag == tag || (attr.tag.is_string() && tag.is_string()) {
        Ok(())
    } else {
        Err(malformed(format!(
            "\"{}\" mixes {} and {} values",
            attr.name, attr.tag, tag
        )))
    }
}

fn fixed<const N: usize>(tag: ValueTag, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        malformed(format!(
            "{tag} value must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

fn parse_value(tag: ValueTag, bytes: &[u8]) -> Result<Value> {
    Ok(match tag {
        ValueTag::Integer => Value::Integer(i32::from_be_bytes(fixed::<4>(tag, bytes)?)),
        ValueTag::Enum => Value::Enum(i32::from_be_bytes(fixed::<4>(tag, bytes)?)),
        ValueTag::Boolean => Value::Boolean(fixed::<1>(tag, bytes)?[0] != 0),
        ValueTag::DateTime => Value::DateTime(IppDate(fixed::<11>(tag, bytes)?)),
        ValueTag::Resolution => {
            let b = fixed::<9>(tag, bytes)?;
            let units = ResolutionUnit::from_u8(b[8])
                .ok_or_else(|| malformed(format!("unknown resolution units {}", b[8])))?;
            Value::Resolution(Resolution {
                x: i32::from_be_bytes([b[0], b[1], b[2], b[3]]),
                y: i32::from_be_bytes([b[4], b[5], b[6], b[7]]),
                units,
            })
        }
        ValueTag::RangeOfInteger => {
            let b = fixed::<8>(tag, bytes)?;
            let lower = i32::from_be_bytes([b[0], b[1], b[2], b[3]]);
            let upper = i32::from_be_bytes([b[4], b[5], b[6], b[7]]);
            Value::Range(RangeOfInteger::new(lower, upper).ok_or_else(|| {
                malformed(format!("rangeOfInteger {lower}-{upper} is reversed"))
            })?)
        }
        ValueTag::TextWithLanguage | ValueTag::NameWithLanguage => parse_lang_string(tag, bytes)?,
        ValueTag::OctetString => Value::Octets(bytes.to_vec()),
        t if t.is_out_of_band() => Value::Octets(bytes.to_vec()),
        t if t.is_string() => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        other => return Err(malformed(format!("unexpected {other} value"))),
    })
}

/// `language-length (2) language text-length (2) text`.
fn parse_lang_string(tag: ValueTag, bytes: &[u8]) -> Result<Value> {
    if bytes.len() < 4 {
        return Err(malformed(format!("{tag} value shorter than 4 bytes")));
    }
    let lang_len = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    let text_at = 2 + lang_len;
    if bytes.len() < text_at + 2 {
        return Err(malformed(format!("{tag} language overruns the value")));
    }
    let text_len = usize::from(u16::from_be_bytes([bytes[text_at], bytes[text_at + 1]]));
    if bytes.len() != text_at + 2 + text_len {
        return Err(malformed(format!("{tag} text length does not match the value")));
    }
    Ok(Value::LangString {
        language: String::from_utf8_lossy(&bytes[2..text_at]).into_owned(),
        text: String::from_utf8_lossy(&bytes[text_at + 2..]).into_owned(),
    })
}

/// Decode one complete message from a byte slice.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    decode_with(bytes, DecodeLimits::default())
}

pub fn decode_with(bytes: &[u8], limits: DecodeLimits) -> Result<Message> {
    let mut decoder = Decoder::with_limits(limits);
    decoder.feed(bytes);
    decoder.finish()
}

/// Decode one message from a blocking reader.  Bytes after the
/// end-of-attributes tag stay unread only up to the last chunk boundary.
pub fn decode_reader<R: Read>(source: &mut R, limits: DecodeLimits) -> Result<Message> {
    let mut decoder = Decoder::with_limits(limits);
    loop {
        if let Progress::Complete(message) = decoder.advance()? {
            return Ok(message);
        }
        if let Progress::Complete(message) = decoder.read_from(source)? {
            return Ok(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Writes one record per `write` call.  A short count is an error; the
/// sink is never asked to take the rest.
struct RecordWriter<'a, W: Write> {
    sink: &'a mut W,
    scratch: Vec<u8>,
    written: usize,
}

impl<W: Write> RecordWriter<'_, W> {
    fn flush_record(&mut self) -> Result<()> {
        let expected = self.scratch.len();
        let written = self.sink.write(&self.scratch)?;
        if written != expected {
            return Err(IppwerkError::ShortWrite { written, expected });
        }
        self.written += written;
        self.scratch.clear();
        Ok(())
    }

    fn header(&mut self, message: &Message) -> Result<()> {
        self.scratch.push(message.version.major);
        self.scratch.push(message.version.minor);
        self.scratch.extend_from_slice(&message.code.to_be_bytes());
        self.scratch.extend_from_slice(&message.request_id.to_be_bytes());
        self.flush_record()
    }

    fn delimiter(&mut self, tag: u8) -> Result<()> {
        self.scratch.push(tag);
        self.flush_record()
    }

    fn record(&mut self, tag: ValueTag, name: &str, value: &[u8]) -> Result<()> {
        if name.len() > MAX_WIRE_FIELD || value.len() > MAX_WIRE_FIELD {
            return Err(malformed(format!(
                "\"{name}\" does not fit a two-byte length prefix"
            )));
        }
        self.scratch.push(tag.as_u8());
        self.scratch.extend_from_slice(&(name.len() as u16).to_be_bytes());
        self.scratch.extend_from_slice(name.as_bytes());
        self.scratch.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.scratch.extend_from_slice(value);
        self.flush_record()
    }

    /// Top-level attribute: the first value carries the name, the rest
    /// have name-length 0.
    fn attribute(&mut self, attr: &Attribute) -> Result<()> {
        check_attribute(attr)?;
        for (i, value) in attr.values.iter().enumerate() {
            let name = if i == 0 { attr.name.as_str() } else { "" };
            self.value(attr, name, value)?;
        }
        Ok(())
    }

    /// Collection member: `memberAttrName` then every value unnamed.
    fn member(&mut self, attr: &Attribute) -> Result<()> {
        check_attribute(attr)?;
        self.record(ValueTag::MemberAttrName, "", attr.name.as_bytes())?;
        for value in &attr.values {
            self.value(attr, "", value)?;
        }
        Ok(())
    }

    fn value(&mut self, attr: &Attribute, name: &str, value: &Value) -> Result<()> {
        if !value.fits(attr.tag) {
            return Err(IppwerkError::TypeMismatch {
                expected: attr.tag.syntax_name(),
                found: value.kind(),
            });
        }
        match value {
            Value::Collection(collection) => {
                self.record(ValueTag::BegCollection, name, &[])?;
                for member in &collection.members {
                    self.member(member)?;
                }
                self.record(ValueTag::EndCollection, "", &[])
            }
            other => {
                let bytes = value_bytes(other)?;
                self.record(attr.tag, name, &bytes)
            }
        }
    }
}

fn check_attribute(attr: &Attribute) -> Result<()> {
    if attr.name.is_empty() {
        return Err(malformed("attribute with an empty name"));
    }
    if attr.values.is_empty() {
        return Err(malformed(format!("\"{}\" has no values", attr.name)));
    }
    if attr.tag.is_collection_framing() {
        return Err(malformed(format!("\"{}\" uses framing tag {}", attr.name, attr.tag)));
    }
    Ok(())
}

fn value_bytes(value: &Value) -> Result<Vec<u8>> {
    Ok(match value {
        Value::Integer(v) | Value::Enum(v) => v.to_be_bytes().to_vec(),
        Value::Boolean(v) => vec![u8::from(*v)],
        Value::Octets(v) => v.clone(),
        Value::DateTime(date) => date.0.to_vec(),
        Value::Resolution(r) => {
            let mut out = Vec::with_capacity(9);
            out.extend_from_slice(&r.x.to_be_bytes());
            out.extend_from_slice(&r.y.to_be_bytes());
            out.push(r.units as u8);
            out
        }
        Value::Range(r) => {
            let mut out = Vec::with_capacity(8);
            out.extend_from_slice(&r.lower().to_be_bytes());
            out.extend_from_slice(&r.upper().to_be_bytes());
            out
        }
        Value::LangString { language, text } => {
            if language.len() > MAX_WIRE_FIELD || text.len() > MAX_WIRE_FIELD {
                return Err(malformed("string with language too long"));
            }
            let mut out = Vec::with_capacity(4 + language.len() + text.len());
            out.extend_from_slice(&(language.len() as u16).to_be_bytes());
            out.extend_from_slice(language.as_bytes());
            out.extend_from_slice(&(text.len() as u16).to_be_bytes());
            out.extend_from_slice(text.as_bytes());
            out
        }
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Collection(_) => return Err(malformed("collection encoded as a scalar")),
    })
}

/// Encode `message` into `sink`, one record per write.  Returns the number
/// of bytes written.
pub fn encode_to<W: Write>(message: &Message, sink: &mut W) -> Result<usize> {
    let mut writer = RecordWriter {
        sink,
        scratch: Vec::with_capacity(256),
        written: 0,
    };
    writer.header(message)?;
    for group in &message.groups {
        writer.delimiter(group.tag.as_u8())?;
        for attr in &group.attributes {
            writer.attribute(attr)?;
        }
    }
    writer.delimiter(TAG_END_OF_ATTRIBUTES)?;
    Ok(writer.written)
}

pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    encode_to(message, &mut out)?;
    Ok(out)
}

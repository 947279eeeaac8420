// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted transport and recording reporter for state machine tests.

use std::collections::{HashMap, VecDeque};
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use ippwerk_core::error::{IppwerkError, Result};
use ippwerk_core::types::PageRecord;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, ReadBuf};

use crate::message::Message;
use crate::report::JobReporter;
use crate::tag::{GroupTag, JobState, Operation, PrinterState, StatusCode, ValueTag};
use crate::transport::Transport;
use crate::value::{RangeOfInteger, Value};

/// Which scripted queue a request draws its reply from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Negotiate,
    /// Get-Printer-Attributes asking only for `printer-state-reasons`.
    StateCheck,
    PrintJob,
    GetJob,
    Other,
}

impl Kind {
    pub fn of(request: &Message) -> Self {
        match request.operation() {
            Some(Operation::GetPrinterAttributes) => {
                let requested = request
                    .find_any("requested-attributes")
                    .and_then(|a| a.strings().ok())
                    .unwrap_or_default();
                if requested == ["printer-state-reasons"] {
                    Self::StateCheck
                } else {
                    Self::Negotiate
                }
            }
            Some(Operation::PrintJob) => Self::PrintJob,
            Some(Operation::GetJobAttributes) => Self::GetJob,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockTransport {
    queues: HashMap<Kind, VecDeque<Result<Message>>>,
    /// Every request in the order it was sent.
    pub requests: Vec<Message>,
    /// Document bytes read by each Print-Job.
    pub documents: Vec<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: Kind, reply: Result<Message>) {
        self.queues.entry(kind).or_default().push_back(reply);
    }

    pub fn sent(&self, kind: Kind) -> Vec<&Message> {
        self.requests.iter().filter(|r| Kind::of(r) == kind).collect()
    }

    fn reply_for(&mut self, request: &Message) -> Result<Message> {
        let kind = Kind::of(request);
        self.requests.push(request.clone());
        match self.queues.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(reply) => reply,
            None if kind == Kind::StateCheck => Ok(status_reply(StatusCode::OK)),
            None => Err(IppwerkError::Config(format!("no scripted reply for {kind:?}"))),
        }
    }
}

impl Transport for MockTransport {
    async fn do_request(&mut self, request: &Message, _resource: &str) -> Result<Message> {
        self.reply_for(request)
    }

    async fn do_file_request<D>(
        &mut self,
        request: &Message,
        _resource: &str,
        document: &mut D,
    ) -> Result<Message>
    where
        D: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let mut bytes = Vec::new();
        document
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| IppwerkError::Document(e.to_string()))?;
        self.documents.push(bytes);
        self.reply_for(request)
    }
}

/// A 4 KiB print file that seeks fine and fails every read.
#[derive(Debug, Default)]
pub struct BadSector {
    position: u64,
}

impl AsyncRead for BadSector {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("bad sector")))
    }
}

impl AsyncSeek for BadSector {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        self.position = match position {
            SeekFrom::Start(n) => n,
            SeekFrom::End(_) => 4096,
            SeekFrom::Current(_) => self.position,
        };
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(self.position))
    }
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub progress: Vec<String>,
    pub pages: Vec<PageRecord>,
    pub sheets: Vec<i32>,
    pub states: Vec<Vec<String>>,
    pub accepted: Vec<Option<i32>>,
}

impl JobReporter for RecordingReporter {
    fn progress(&mut self, message: &str) {
        self.progress.push(message.to_owned());
    }

    fn page(&mut self, record: PageRecord) {
        self.pages.push(record);
    }

    fn sheets_completed(&mut self, sheets: i32) {
        self.sheets.push(sheets);
    }

    fn printer_state(&mut self, reasons: &[String]) {
        self.states.push(reasons.to_vec());
    }

    fn job_accepted(&mut self, job_id: Option<i32>) {
        self.accepted.push(job_id);
    }
}

// ---------------------------------------------------------------------------
// Canned replies
// ---------------------------------------------------------------------------

pub fn status_reply(status: StatusCode) -> Message {
    let mut reply = Message::response(status, 1);
    reply.add_string(GroupTag::Operation, ValueTag::Charset, "attributes-charset", "utf-8");
    reply.add_string(
        GroupTag::Operation,
        ValueTag::NaturalLanguage,
        "attributes-natural-language",
        "en",
    );
    reply
}

/// An idle, accepting printer whose `copies-supported` is `1-max_copies`.
pub fn printer_reply(max_copies: i32, formats: &[&str]) -> Message {
    let mut reply = status_reply(StatusCode::OK);
    if let Some(range) = RangeOfInteger::new(1, max_copies) {
        reply.add(
            GroupTag::Printer,
            ValueTag::RangeOfInteger,
            "copies-supported",
            Value::Range(range),
        );
    }
    reply.add_strings(GroupTag::Printer, ValueTag::Charset, "charset-supported", ["utf-8"]);
    if !formats.is_empty() {
        reply.add_strings(
            GroupTag::Printer,
            ValueTag::MimeMediaType,
            "document-format-supported",
            formats.iter().copied(),
        );
    }
    reply.add(
        GroupTag::Printer,
        ValueTag::Boolean,
        "printer-is-accepting-jobs",
        Value::Boolean(true),
    );
    reply.add(
        GroupTag::Printer,
        ValueTag::Enum,
        "printer-state",
        Value::Enum(PrinterState::Idle as i32),
    );
    reply
}

pub fn print_job_reply(job_id: Option<i32>) -> Message {
    let mut reply = status_reply(StatusCode::OK);
    if let Some(id) = job_id {
        reply.add(GroupTag::Job, ValueTag::Integer, "job-id", Value::Integer(id));
    }
    reply
}

pub fn job_reply(state: JobState, sheets: Option<i32>) -> Message {
    let mut reply = status_reply(StatusCode::OK);
    reply.add(GroupTag::Job, ValueTag::Enum, "job-state", Value::Enum(state as i32));
    if let Some(sheets) = sheets {
        reply.add(
            GroupTag::Job,
            ValueTag::Integer,
            "job-media-sheets-completed",
            Value::Integer(sheets),
        );
    }
    reply
}

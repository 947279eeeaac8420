// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request builders for the operations the backend sends.

use ippwerk_core::types::{IppVersion, JobTicket, PrinterTarget};

use crate::message::Message;
use crate::options::encode_options;
use crate::tag::{GroupTag, Operation, ValueTag};
use crate::value::Value;

/// Attributes negotiation asks every printer for.
pub const NEGOTIATION_ATTRIBUTES: &[&str] = &[
    "copies-supported",
    "charset-supported",
    "document-format-supported",
    "printer-is-accepting-jobs",
    "printer-state",
    "printer-state-reasons",
];

/// Attributes each job poll asks for.
pub const JOB_ATTRIBUTES: &[&str] = &["job-state", "job-media-sheets-completed"];

/// What every request of one submission has in common.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub version: IppVersion,
    pub charset: &'a str,
    pub target: &'a PrinterTarget,
}

impl RequestContext<'_> {
    /// A request carrying the mandatory operation attributes in order:
    /// charset, natural language, printer-uri.
    fn start(&self, operation: Operation, request_id: u32) -> Message {
        let mut request = Message::request(operation, request_id).with_version(self.version);
        request.add_string(
            GroupTag::Operation,
            ValueTag::Charset,
            "attributes-charset",
            self.charset,
        );
        request.add_string(
            GroupTag::Operation,
            ValueTag::NaturalLanguage,
            "attributes-natural-language",
            self.target.natural_language.as_str(),
        );
        request.add_string(
            GroupTag::Operation,
            ValueTag::Uri,
            "printer-uri",
            self.target.uri.as_str(),
        );
        request
    }

    fn add_user(&self, request: &mut Message) {
        if let Some(user) = self.target.user() {
            request.add_string(
                GroupTag::Operation,
                ValueTag::Name,
                "requesting-user-name",
                user,
            );
        }
    }

    pub fn get_printer_attributes(&self, request_id: u32, requested: &[&str]) -> Message {
        let mut request = self.start(Operation::GetPrinterAttributes, request_id);
        request.add_strings(
            GroupTag::Operation,
            ValueTag::Keyword,
            "requested-attributes",
            requested.iter().copied(),
        );
        request
    }

    /// Get-Printer-Attributes asking only for `printer-state-reasons`.
    pub fn printer_state_query(&self, request_id: u32) -> Message {
        self.get_printer_attributes(request_id, &["printer-state-reasons"])
    }

    /// Print-Job for one transmission.
    ///
    /// `document_format` is only given when the printer listed it.  Job
    /// template attributes (the ticket's options and `copies`) are only sent
    /// with `copies` set, i.e. when the printer makes the copies itself.
    pub fn print_job(
        &self,
        request_id: u32,
        ticket: &JobTicket,
        document_format: Option<&str>,
        copies: Option<u32>,
    ) -> Message {
        let mut request = self.start(Operation::PrintJob, request_id);
        self.add_user(&mut request);

        if !ticket.title.is_empty() {
            request.add_string(
                GroupTag::Operation,
                ValueTag::Name,
                "job-name",
                ticket.title.as_str(),
            );
        }
        if let Some(format) = document_format {
            request.add_string(
                GroupTag::Operation,
                ValueTag::MimeMediaType,
                "document-format",
                format,
            );
        }

        if let Some(copies) = copies {
            encode_options(&mut request, &ticket.options);
            let copies = i32::try_from(copies).unwrap_or(i32::MAX);
            request.add(GroupTag::Job, ValueTag::Integer, "copies", Value::Integer(copies));
        }

        request
    }

    pub fn get_job_attributes(&self, request_id: u32, job_id: i32) -> Message {
        let mut request = self.start(Operation::GetJobAttributes, request_id);
        request.add(
            GroupTag::Operation,
            ValueTag::Integer,
            "job-id",
            Value::Integer(job_id),
        );
        self.add_user(&mut request);
        request.add_strings(
            GroupTag::Operation,
            ValueTag::Keyword,
            "requested-attributes",
            JOB_ATTRIBUTES.iter().copied(),
        );
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippwerk_core::types::JobOption;

    fn target() -> PrinterTarget {
        let mut target = PrinterTarget::new("ipp://printer.local:631/ipp/print", "/ipp/print");
        target.requesting_user = Some("alice".into());
        target
    }

    fn names(request: &Message) -> Vec<&str> {
        request.attributes().map(|(_, a)| a.name.as_str()).collect()
    }

    #[test]
    fn negotiation_request_layout() {
        let target = target();
        let ctx = RequestContext {
            version: IppVersion::V1_1,
            charset: "utf-8",
            target: &target,
        };
        let request = ctx.get_printer_attributes(7, NEGOTIATION_ATTRIBUTES);
        assert_eq!(request.operation(), Some(Operation::GetPrinterAttributes));
        assert_eq!(request.request_id, 7);
        assert_eq!(
            names(&request),
            [
                "attributes-charset",
                "attributes-natural-language",
                "printer-uri",
                "requested-attributes"
            ]
        );
        let requested = request.find_any("requested-attributes").unwrap();
        assert_eq!(requested.values.len(), NEGOTIATION_ATTRIBUTES.len());
    }

    #[test]
    fn print_job_without_copies_has_no_job_group() {
        let target = target();
        let ctx = RequestContext {
            version: IppVersion::V1_0,
            charset: "us-ascii",
            target: &target,
        };
        let ticket = JobTicket {
            title: "report.pdf".into(),
            copies: 3,
            options: vec![JobOption {
                name: "media".into(),
                value: "a4".into(),
            }],
            manual_copies: true,
        };
        let request = ctx.print_job(2, &ticket, None, None);
        assert_eq!(request.version, IppVersion::V1_0);
        assert!(request.groups.iter().all(|g| g.tag == GroupTag::Operation));
        assert!(request.find_any("copies").is_none());
        assert!(request.find_any("media").is_none());
        assert!(request.find_any("document-format").is_none());
        assert_eq!(
            request.find_any("requesting-user-name").unwrap().strings().unwrap(),
            ["alice"]
        );
    }

    #[test]
    fn print_job_with_copies_carries_options() {
        let target = target();
        let ctx = RequestContext {
            version: IppVersion::V1_1,
            charset: "utf-8",
            target: &target,
        };
        let ticket = JobTicket {
            copies: 3,
            options: vec![JobOption {
                name: "media".into(),
                value: "a4".into(),
            }],
            ..JobTicket::default()
        };
        let request = ctx.print_job(2, &ticket, Some("application/pdf"), Some(3));
        assert!(request.find_any("job-name").is_none());
        assert_eq!(
            request
                .find("document-format", ValueTag::MimeMediaType)
                .unwrap()
                .strings()
                .unwrap(),
            ["application/pdf"]
        );
        let copies = request.find("copies", ValueTag::Integer).unwrap();
        assert_eq!(copies.values, vec![Value::Integer(3)]);
        assert_eq!(request.entities(GroupTag::Job).len(), 1);
    }

    #[test]
    fn job_poll_names_the_job() {
        let target = PrinterTarget::new("ipp://h/printers/p", "/printers/p");
        let ctx = RequestContext {
            version: IppVersion::V1_1,
            charset: "utf-8",
            target: &target,
        };
        let request = ctx.get_job_attributes(9, 41);
        assert_eq!(
            request.find("job-id", ValueTag::Integer).unwrap().values,
            vec![Value::Integer(41)]
        );
        assert!(request.find_any("requesting-user-name").is_none());
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability negotiation: find out what the printer can do and which IPP
// version it speaks before sending any document.

use ippwerk_core::config::{BackendConfig, Locale};
use ippwerk_core::error::Result;
use ippwerk_core::types::{IppVersion, PrinterTarget};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::cancel::CancelToken;
use crate::message::{Attribute, Message, RequestIds};
use crate::report::{JobReporter, state_reasons};
use crate::requests::{NEGOTIATION_ATTRIBUTES, RequestContext};
use crate::retry::{
    RetryDecision, RetryPolicy, Stage, classify_result, decide, fatal_error, retry_message,
};
use crate::tag::{PrinterState, ValueTag};
use crate::transport::Transport;

/// What negotiation learned about the printer.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterCapabilities {
    /// Version the printer accepted.
    pub version: IppVersion,
    /// Charset to send in job requests.
    pub charset: String,
    /// The printer makes copies itself (`copies-supported` upper bound > 1).
    pub copies_supported: bool,
    pub max_copies: Option<i32>,
    pub document_formats: Vec<String>,
    pub accepting_jobs: Option<bool>,
    /// Raw `printer-state` enum value.
    pub printer_state: Option<i32>,
    pub state_reasons: Vec<String>,
}

impl PrinterCapabilities {
    /// Read the attributes of a successful Get-Printer-Attributes reply.
    pub fn from_reply(reply: &Message, version: IppVersion, local_charset: &str) -> Self {
        let max_copies = reply
            .find("copies-supported", ValueTag::RangeOfInteger)
            .and_then(Attribute::first)
            .and_then(|v| v.as_range().ok())
            .map(|r| r.upper());

        let charsets = strings_of(reply.find("charset-supported", ValueTag::Charset));
        let document_formats =
            strings_of(reply.find("document-format-supported", ValueTag::MimeMediaType));

        let accepting_jobs = reply
            .find("printer-is-accepting-jobs", ValueTag::Boolean)
            .and_then(Attribute::first)
            .and_then(|v| v.as_bool().ok());

        let printer_state = reply
            .find("printer-state", ValueTag::Enum)
            .and_then(Attribute::first)
            .and_then(|v| v.as_enum().ok());

        Self {
            version,
            charset: resolve_charset(local_charset, &charsets),
            copies_supported: max_copies.is_some_and(|upper| upper > 1),
            max_copies,
            document_formats,
            accepting_jobs,
            printer_state,
            state_reasons: state_reasons(reply),
        }
    }

    /// MIME types compare case-insensitively.
    pub fn supports_format(&self, format: &str) -> bool {
        self.document_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// Stopped, or in some state past that.
    pub fn is_stopped(&self) -> bool {
        self.printer_state
            .is_some_and(|state| state > PrinterState::Processing as i32)
    }
}

fn strings_of(attr: Option<&Attribute>) -> Vec<String> {
    attr.map(|a| {
        a.values
            .iter()
            .filter_map(|v| v.as_str().ok())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Pick the charset for job requests.
///
/// The local charset wins when the printer lists it or lists nothing at all.
/// Otherwise fall back to `us-ascii` if listed, then `utf-8`.
pub fn resolve_charset(local: &str, supported: &[String]) -> String {
    let listed = |name: &str| supported.iter().any(|s| s.eq_ignore_ascii_case(name));

    if supported.is_empty() || listed(local) {
        local.to_owned()
    } else if listed("us-ascii") {
        "us-ascii".into()
    } else {
        "utf-8".into()
    }
}

/// Runs the Get-Printer-Attributes retry loop.
pub struct Negotiator<'a, T> {
    transport: &'a mut T,
    config: &'a BackendConfig,
    target: &'a PrinterTarget,
    locale: &'a Locale,
}

impl<'a, T: Transport> Negotiator<'a, T> {
    pub fn new(
        transport: &'a mut T,
        config: &'a BackendConfig,
        target: &'a PrinterTarget,
        locale: &'a Locale,
    ) -> Self {
        Self {
            transport,
            config,
            target,
            locale,
        }
    }

    /// Ask the printer for its capabilities until it answers.
    ///
    /// Unreachable and busy printers are retried without limit; a version
    /// complaint at 1.1 drops to 1.0 once.  Any other failure is returned.
    #[instrument(skip_all, fields(printer = %self.target.uri))]
    pub async fn negotiate<P: JobReporter>(
        &mut self,
        reporter: &mut P,
        ids: &mut RequestIds,
        cancel: &CancelToken,
    ) -> Result<PrinterCapabilities> {
        let policy = RetryPolicy::from(self.config);
        let mut version = self.config.version;

        loop {
            cancel.check()?;

            let ctx = RequestContext {
                version,
                charset: "utf-8",
                target: self.target,
            };
            let request = ctx.get_printer_attributes(ids.next_id(), NEGOTIATION_ATTRIBUTES);
            debug!(%version, request_id = request.request_id, "querying printer attributes");

            let result = self.transport.do_request(&request, &self.target.resource).await;
            let (outcome, reply) = classify_result(result)?;

            if self.config.report_printer_state {
                let reasons = reply.as_ref().map(state_reasons).unwrap_or_default();
                if !reasons.is_empty() {
                    reporter.printer_state(&reasons);
                }
            }

            match (decide(Stage::Negotiation, outcome, version, &policy), reply) {
                (RetryDecision::Proceed, Some(reply)) => {
                    let caps =
                        PrinterCapabilities::from_reply(&reply, version, &self.locale.charset);
                    info!(
                        %version,
                        charset = %caps.charset,
                        copies_supported = caps.copies_supported,
                        formats = caps.document_formats.len(),
                        "printer capabilities negotiated"
                    );
                    return Ok(caps);
                }
                (RetryDecision::RetryAfter(delay), _) => {
                    reporter.progress(&retry_message(outcome, delay));
                    sleep(delay).await;
                }
                (RetryDecision::Downgrade, _) => {
                    reporter.progress("Printer does not support IPP/1.1, trying IPP/1.0.");
                    version = IppVersion::V1_0;
                }
                (_, reply) => return Err(fatal_error(outcome, reply.as_ref())),
            }
        }
    }
}

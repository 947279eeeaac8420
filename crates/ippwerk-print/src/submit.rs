// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job submission state machine.
//
//   Idle -> Negotiating -> Submitting(copy) -> AwaitingJob(job) ->
//   NextCopyOrDone(copy) -> ... -> Terminal
//
// Each transition is a step boundary where cancellation is honoured.  A
// transmission in flight is never interrupted.

use std::io::SeekFrom;

use chrono::Utc;
use ippwerk_core::config::{BackendConfig, Locale};
use ippwerk_core::error::{IppwerkError, Result};
use ippwerk_core::types::{JobTicket, PageRecord, PrinterTarget, SubmissionId, SubmissionReport};
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::capabilities::{Negotiator, PrinterCapabilities};
use crate::message::{Attribute, Message, RequestIds};
use crate::report::{JobReporter, state_reasons};
use crate::requests::RequestContext;
use crate::retry::{
    RetryDecision, RetryPolicy, Stage, classify_result, decide, fatal_error, retry_message,
};
use crate::tag::{JobState, ValueTag};
use crate::transport::Transport;
use crate::value::Value;

/// The print file and its MIME type.  The reader is rewound before every
/// transmission.
#[derive(Debug)]
pub struct Document<R> {
    pub reader: R,
    pub content_type: Option<String>,
}

impl<R> Document<R> {
    pub fn new(reader: R, content_type: Option<String>) -> Self {
        Self {
            reader,
            content_type,
        }
    }
}

/// How many times the document goes over the wire, and what `copies`
/// attribute (if any) travels with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPlan {
    pub physical_copies: u32,
    pub copies_attribute: Option<u32>,
}

impl CopyPlan {
    pub fn new(ticket: &JobTicket, caps: &PrinterCapabilities) -> Self {
        let copies = ticket.copies.max(1);
        if caps.copies_supported {
            Self {
                physical_copies: 1,
                copies_attribute: Some(copies),
            }
        } else if ticket.manual_copies {
            Self {
                physical_copies: copies,
                copies_attribute: None,
            }
        } else {
            Self {
                physical_copies: 1,
                copies_attribute: None,
            }
        }
    }

    /// Accounting record for one accepted transmission.
    pub fn page_record(&self) -> PageRecord {
        PageRecord {
            page: 1,
            copies: self.copies_attribute.unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Negotiating,
    Submitting { copy: u32 },
    AwaitingJob { copy: u32, job_id: i32 },
    NextCopyOrDone { copy: u32 },
    Terminal,
}

/// One print job on its way to one printer.
pub struct Submission<'a, T, P> {
    transport: &'a mut T,
    reporter: &'a mut P,
    config: &'a BackendConfig,
    target: &'a PrinterTarget,
    locale: Locale,
    cancel: CancelToken,
    class_member: bool,
    ids: RequestIds,
    state: SubmissionState,
}

impl<'a, T: Transport, P: JobReporter> Submission<'a, T, P> {
    pub fn new(
        transport: &'a mut T,
        reporter: &'a mut P,
        config: &'a BackendConfig,
        target: &'a PrinterTarget,
    ) -> Self {
        Self {
            transport,
            reporter,
            config,
            target,
            locale: Locale::parse(None),
            cancel: CancelToken::new(),
            class_member: false,
            ids: RequestIds::new(),
            state: SubmissionState::Idle,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The target is one member of a printer class: give the job back to
    /// the scheduler when this member cannot take it.
    pub fn class_member(mut self, class_member: bool) -> Self {
        self.class_member = class_member;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Drive the job from negotiation to a terminal state.
    #[instrument(skip_all, fields(printer = %self.target.uri, title = %ticket.title))]
    pub async fn run<R>(
        &mut self,
        ticket: &JobTicket,
        document: &mut Document<R>,
    ) -> Result<SubmissionReport>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let id = SubmissionId::new();
        let started_at = Utc::now();
        let policy = RetryPolicy::from(self.config);
        let target = self.target;

        self.cancel.check()?;
        self.state = SubmissionState::Negotiating;
        let caps = Negotiator::new(&mut *self.transport, self.config, target, &self.locale)
            .negotiate(&mut *self.reporter, &mut self.ids, &self.cancel)
            .await?;

        if self.class_member {
            self.check_class_member(&caps).await?;
        }

        let plan = CopyPlan::new(ticket, &caps);
        let format = document
            .content_type
            .clone()
            .filter(|f| caps.supports_format(f));
        let ctx = RequestContext {
            version: caps.version,
            charset: &caps.charset,
            target,
        };
        info!(%id, copies = ?plan, format = ?format, "submitting job");

        let mut report = SubmissionReport {
            id,
            version: caps.version,
            job_ids: Vec::new(),
            pages: Vec::new(),
            sheets_completed: None,
            started_at,
            finished_at: started_at,
        };

        self.state = SubmissionState::Submitting { copy: 1 };
        loop {
            self.cancel.check()?;

            match self.state {
                SubmissionState::Submitting { copy } => {
                    if plan.physical_copies > 1 {
                        self.reporter.progress(&format!(
                            "Sending copy {copy} of {}...",
                            plan.physical_copies
                        ));
                    }
                    let job_id = self
                        .transmit(&ctx, ticket, format.as_deref(), &plan, document, &policy)
                        .await?;

                    self.reporter.job_accepted(job_id);
                    let record = plan.page_record();
                    self.reporter.page(record);
                    report.pages.push(record);
                    report.job_ids.extend(job_id);

                    self.state = match job_id {
                        Some(job_id) if self.config.wait_job => {
                            self.reporter.progress("Waiting for job to complete...");
                            SubmissionState::AwaitingJob { copy, job_id }
                        }
                        _ => SubmissionState::NextCopyOrDone { copy },
                    };
                }

                SubmissionState::AwaitingJob { copy, job_id } => {
                    if self.poll_job(&ctx, job_id, &policy, &mut report).await? {
                        self.state = SubmissionState::NextCopyOrDone { copy };
                    } else {
                        self.check_printer_state(&ctx).await;
                        sleep(policy.poll_interval).await;
                    }
                }

                SubmissionState::NextCopyOrDone { copy } => {
                    self.state = if copy < plan.physical_copies {
                        SubmissionState::Submitting { copy: copy + 1 }
                    } else {
                        SubmissionState::Terminal
                    };
                }

                SubmissionState::Terminal => break,

                SubmissionState::Idle | SubmissionState::Negotiating => {
                    return Err(IppwerkError::Config(format!(
                        "submission loop entered in {:?}",
                        self.state
                    )));
                }
            }
        }

        self.check_printer_state(&ctx).await;
        report.finished_at = Utc::now();
        info!(
            %id,
            jobs = report.job_ids.len(),
            pages = report.pages.len(),
            "submission finished"
        );
        Ok(report)
    }

    /// Send one Print-Job, retrying busy and unreachable printers.  Returns
    /// the printer's job id when it gave a usable one.
    async fn transmit<R>(
        &mut self,
        ctx: &RequestContext<'_>,
        ticket: &JobTicket,
        format: Option<&str>,
        plan: &CopyPlan,
        document: &mut Document<R>,
        policy: &RetryPolicy,
    ) -> Result<Option<i32>>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        loop {
            self.cancel.check()?;

            document
                .reader
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|e| IppwerkError::Document(format!("rewind failed: {e}")))?;
            let request = ctx.print_job(self.ids.next_id(), ticket, format, plan.copies_attribute);
            debug!(request_id = request.request_id, "sending Print-Job");

            let result = self
                .transport
                .do_file_request(&request, &self.target.resource, &mut document.reader)
                .await;
            let (outcome, reply) = classify_result(result)?;

            match (decide(Stage::Submission, outcome, ctx.version, policy), reply) {
                (RetryDecision::Proceed, Some(reply)) => return Ok(job_id(&reply)),
                (RetryDecision::RetryAfter(delay), _) => {
                    self.reporter.progress(&retry_message(outcome, delay));
                    sleep(delay).await;
                }
                (_, reply) => return Err(fatal_error(outcome, reply.as_ref())),
            }
        }
    }

    /// One Get-Job-Attributes round.  `Ok(true)` once monitoring is over.
    async fn poll_job(
        &mut self,
        ctx: &RequestContext<'_>,
        job_id: i32,
        policy: &RetryPolicy,
        report: &mut SubmissionReport,
    ) -> Result<bool> {
        let request = ctx.get_job_attributes(self.ids.next_id(), job_id);
        let result = self.transport.do_request(&request, &self.target.resource).await;
        let (outcome, reply) = classify_result(result)?;

        match (decide(Stage::Polling, outcome, ctx.version, policy), reply) {
            (RetryDecision::Finished, _) => {
                debug!(job_id, "job no longer known to the printer");
                Ok(true)
            }
            (RetryDecision::RetryAfter(_), _) => {
                debug!(job_id, ?outcome, "poll failed, trying again later");
                Ok(false)
            }
            (RetryDecision::Proceed, Some(reply)) => {
                let state = first_integer(&reply, "job-state", ValueTag::Enum)
                    .and_then(JobState::from_i32);
                debug!(job_id, state = ?state, "job polled");

                match state {
                    Some(state) if state.ends_monitoring() => {
                        if let Some(sheets) =
                            first_integer(&reply, "job-media-sheets-completed", ValueTag::Integer)
                        {
                            self.reporter.sheets_completed(sheets);
                            report.sheets_completed = Some(sheets);
                        }
                        info!(job_id, state = state.keyword(), "job finished");
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            (_, reply) => Err(fatal_error(outcome, reply.as_ref())),
        }
    }

    /// Report `printer-state-reasons` if enabled.  Failures only get logged.
    async fn check_printer_state(&mut self, ctx: &RequestContext<'_>) {
        if !self.config.report_printer_state {
            return;
        }

        let request = ctx.printer_state_query(self.ids.next_id());
        match self.transport.do_request(&request, &self.target.resource).await {
            Ok(reply) if reply.status().is_success() => {
                let reasons = state_reasons(&reply);
                if !reasons.is_empty() {
                    self.reporter.printer_state(&reasons);
                }
            }
            Ok(reply) => debug!(status = %reply.status(), "printer state query refused"),
            Err(err) => debug!(error = %err, "printer state query failed"),
        }
    }

    /// Give the job back to the scheduler if this class member is stopped
    /// or not accepting jobs.
    async fn check_class_member(&mut self, caps: &PrinterCapabilities) -> Result<()> {
        let unusable = caps.printer_state.is_none()
            || (self.config.wait_printer && caps.is_stopped())
            || caps.accepting_jobs != Some(true);
        if !unusable {
            return Ok(());
        }

        warn!(printer = %self.target.uri, "class member cannot take the job");
        self.reporter.progress(&format!(
            "Unable to queue job on {}, queuing on next printer in class...",
            self.target.uri
        ));
        sleep(self.config.requeue_delay()).await;
        Err(IppwerkError::Requeue(self.target.uri.clone()))
    }
}

fn first_integer(reply: &Message, name: &str, tag: ValueTag) -> Option<i32> {
    reply
        .find(name, tag)
        .and_then(Attribute::first)
        .and_then(|v| match v {
            Value::Integer(n) | Value::Enum(n) => Some(*n),
            _ => None,
        })
}

/// `job-id` from a Print-Job reply.  Zero and negative ids are unusable.
fn job_id(reply: &Message) -> Option<i32> {
    first_integer(reply, "job-id", ValueTag::Integer).filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::mock::{
        BadSector, Kind, MockTransport, RecordingReporter, job_reply, print_job_reply,
        printer_reply, status_reply,
    };
    use crate::tag::StatusCode;

    const BODY: &[u8] = b"%!PS-Adobe-3.0\nshowpage\n";

    fn target() -> PrinterTarget {
        let mut target = PrinterTarget::new("ipp://printer.local/ipp/print", "/ipp/print");
        target.requesting_user = Some("alice".into());
        target
    }

    fn document() -> Document<Cursor<Vec<u8>>> {
        Document::new(
            Cursor::new(BODY.to_vec()),
            Some("application/postscript".into()),
        )
    }

    fn ticket(copies: u32) -> JobTicket {
        JobTicket {
            title: "test page".into(),
            copies,
            ..JobTicket::default()
        }
    }

    fn quiet_config() -> BackendConfig {
        BackendConfig {
            report_printer_state: false,
            ..BackendConfig::default()
        }
    }

    async fn submit(
        transport: &mut MockTransport,
        reporter: &mut RecordingReporter,
        config: &BackendConfig,
        ticket: &JobTicket,
    ) -> Result<SubmissionReport> {
        let target = target();
        Submission::new(transport, reporter, config, &target)
            .run(ticket, &mut document())
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn copies_are_replicated_when_printer_cannot() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        for id in 1..=3 {
            transport.push(Kind::PrintJob, Ok(print_job_reply(Some(id))));
        }
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };
        let mut reporter = RecordingReporter::default();

        let report = submit(&mut transport, &mut reporter, &config, &ticket(3))
            .await
            .unwrap();

        let jobs = transport.sent(Kind::PrintJob);
        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|r| r.find_any("copies").is_none()));
        assert_eq!(transport.documents, vec![BODY.to_vec(); 3]);
        assert_eq!(report.job_ids, [1, 2, 3]);
        assert_eq!(reporter.pages, vec![PageRecord { page: 1, copies: 1 }; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn printer_makes_the_copies_when_it_can() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(99, &["application/postscript"])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(12))));
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };
        let mut reporter = RecordingReporter::default();

        submit(&mut transport, &mut reporter, &config, &ticket(4))
            .await
            .unwrap();

        let jobs = transport.sent(Kind::PrintJob);
        assert_eq!(jobs.len(), 1);
        let copies = jobs[0].find("copies", ValueTag::Integer).unwrap();
        assert_eq!(copies.values, vec![Value::Integer(4)]);
        assert!(jobs[0].find_any("document-format").is_some());
        assert_eq!(reporter.pages, vec![PageRecord { page: 1, copies: 4 }]);
        assert_eq!(reporter.accepted, vec![Some(12)]);
    }

    #[tokio::test(start_paused = true)]
    async fn spooled_jobs_are_sent_once() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(None)));
        let mut reporter = RecordingReporter::default();
        let ticket = JobTicket {
            manual_copies: false,
            ..ticket(5)
        };

        let report = submit(&mut transport, &mut reporter, &quiet_config(), &ticket)
            .await
            .unwrap();
        assert_eq!(transport.sent(Kind::PrintJob).len(), 1);
        assert!(report.job_ids.is_empty());
        assert_eq!(reporter.accepted, vec![None]);
        assert!(transport.sent(Kind::GetJob).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn listed_format_travels_with_every_copy() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &["application/postscript"])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(1))));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(2))));
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };

        submit(&mut transport, &mut RecordingReporter::default(), &config, &ticket(2))
            .await
            .unwrap();
        let jobs = transport.sent(Kind::PrintJob);
        assert_eq!(jobs.len(), 2);
        for job in jobs {
            let format = job.find("document-format", ValueTag::MimeMediaType).unwrap();
            assert_eq!(format.strings().unwrap(), ["application/postscript"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_document_is_not_retried() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        let config = quiet_config();
        let target = target();
        let mut reporter = RecordingReporter::default();
        let mut document = Document::new(BadSector::default(), None);

        let start = Instant::now();
        let err = Submission::new(&mut transport, &mut reporter, &config, &target)
            .run(&ticket(1), &mut document)
            .await
            .unwrap_err();
        assert!(matches!(err, IppwerkError::Document(_)), "{err:?}");
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(transport.sent(Kind::PrintJob).len(), 1);
        assert!(reporter.progress.iter().all(|p| !p.contains("will retry")));
    }

    #[tokio::test(start_paused = true)]
    async fn unlisted_format_is_not_sent() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &["application/pdf"])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(1))));
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };

        submit(&mut transport, &mut RecordingReporter::default(), &config, &ticket(1))
            .await
            .unwrap();
        assert!(transport.sent(Kind::PrintJob)[0].find_any("document-format").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_submission_retries_twice() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(status_reply(StatusCode::SERVICE_UNAVAILABLE)));
        transport.push(Kind::PrintJob, Ok(status_reply(StatusCode::SERVICE_UNAVAILABLE)));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(5))));
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };
        let mut reporter = RecordingReporter::default();

        let start = Instant::now();
        submit(&mut transport, &mut reporter, &config, &ticket(1))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(transport.sent(Kind::PrintJob).len(), 3);
        // Every attempt sent the whole document again.
        assert_eq!(transport.documents, vec![BODY.to_vec(); 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_print_job_is_fatal() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        let mut refused = status_reply(StatusCode::DOCUMENT_FORMAT_NOT_SUPPORTED);
        refused.add_string(
            crate::tag::GroupTag::Operation,
            ValueTag::Text,
            "status-message",
            "no PostScript here",
        );
        transport.push(Kind::PrintJob, Ok(refused));

        let err = submit(
            &mut transport,
            &mut RecordingReporter::default(),
            &quiet_config(),
            &ticket(1),
        )
        .await
        .unwrap_err();
        match err {
            IppwerkError::Status { code, message, .. } => {
                assert_eq!(code, 0x040A);
                assert_eq!(message.as_deref(), Some("no PostScript here"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_at_completed() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(7))));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Pending, None)));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Processing, None)));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Completed, Some(2))));
        let mut reporter = RecordingReporter::default();

        let start = Instant::now();
        let report = submit(&mut transport, &mut reporter, &quiet_config(), &ticket(1))
            .await
            .unwrap();

        assert_eq!(transport.sent(Kind::GetJob).len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(report.sheets_completed, Some(2));
        assert_eq!(reporter.sheets, [2]);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_ends_polling_as_success() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(7))));
        transport.push(Kind::GetJob, Ok(status_reply(StatusCode::NOT_FOUND)));

        let report = submit(
            &mut transport,
            &mut RecordingReporter::default(),
            &quiet_config(),
            &ticket(1),
        )
        .await
        .unwrap();
        assert_eq!(transport.sent(Kind::GetJob).len(), 1);
        assert_eq!(report.sheets_completed, None);
    }

    #[tokio::test(start_paused = true)]
    async fn held_job_ends_polling() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(7))));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::PendingHeld, None)));

        let start = Instant::now();
        submit(
            &mut transport,
            &mut RecordingReporter::default(),
            &quiet_config(),
            &ticket(1),
        )
        .await
        .unwrap();
        assert_eq!(transport.sent(Kind::GetJob).len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_polls_are_swallowed() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(7))));
        transport.push(Kind::GetJob, Err(IppwerkError::Transport("reset".into())));
        transport.push(Kind::GetJob, Ok(status_reply(StatusCode::BUSY)));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Aborted, None)));

        submit(
            &mut transport,
            &mut RecordingReporter::default(),
            &quiet_config(),
            &ticket(1),
        )
        .await
        .unwrap();
        assert_eq!(transport.sent(Kind::GetJob).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn printer_state_is_checked_between_polls_and_at_the_end() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(7))));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Processing, None)));
        transport.push(Kind::GetJob, Ok(job_reply(JobState::Completed, None)));
        let mut low = status_reply(StatusCode::OK);
        low.add_strings(
            crate::tag::GroupTag::Printer,
            ValueTag::Keyword,
            "printer-state-reasons",
            ["toner-low-warning"],
        );
        transport.push(Kind::StateCheck, Ok(low));
        let mut reporter = RecordingReporter::default();

        submit(&mut transport, &mut reporter, &BackendConfig::default(), &ticket(1))
            .await
            .unwrap();
        assert_eq!(transport.sent(Kind::StateCheck).len(), 2);
        assert_eq!(reporter.states, vec![vec!["toner-low-warning".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_start() {
        let mut transport = MockTransport::new();
        let mut reporter = RecordingReporter::default();
        let config = quiet_config();
        let target = target();
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut submission =
            Submission::new(&mut transport, &mut reporter, &config, &target).with_cancel(cancel);
        let err = submission.run(&ticket(1), &mut document()).await.unwrap_err();
        assert!(matches!(err, IppwerkError::Cancelled));
        assert_eq!(submission.state(), SubmissionState::Idle);
        drop(submission);
        assert!(transport.requests.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_copies() {
        let mut transport = MockTransport::new();
        transport.push(Kind::Negotiate, Ok(printer_reply(1, &[])));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(1))));
        transport.push(Kind::PrintJob, Ok(print_job_reply(Some(2))));
        let config = BackendConfig {
            wait_job: false,
            ..quiet_config()
        };
        let target = target();
        let cancel = CancelToken::new();

        // A reporter that pulls the plug as soon as the first copy lands.
        struct CancelOnPage(CancelToken, RecordingReporter);
        impl JobReporter for CancelOnPage {
            fn progress(&mut self, message: &str) {
                self.1.progress(message);
            }
            fn page(&mut self, record: PageRecord) {
                self.1.page(record);
                self.0.cancel();
            }
            fn sheets_completed(&mut self, sheets: i32) {
                self.1.sheets_completed(sheets);
            }
            fn printer_state(&mut self, reasons: &[String]) {
                self.1.printer_state(reasons);
            }
        }
        let mut reporter = CancelOnPage(cancel.clone(), RecordingReporter::default());

        let err = Submission::new(&mut transport, &mut reporter, &config, &target)
            .with_cancel(cancel)
            .run(&ticket(2), &mut document())
            .await
            .unwrap_err();
        assert!(matches!(err, IppwerkError::Cancelled));
        assert_eq!(transport.sent(Kind::PrintJob).len(), 1);
        assert_eq!(reporter.1.pages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_class_member_requeues() {
        let mut transport = MockTransport::new();
        let mut stopped = printer_reply(1, &[]);
        for group in &mut stopped.groups {
            for attr in &mut group.attributes {
                if attr.name == "printer-is-accepting-jobs" {
                    attr.values = vec![Value::Boolean(false)];
                }
            }
        }
        transport.push(Kind::Negotiate, Ok(stopped));
        let mut reporter = RecordingReporter::default();
        let config = quiet_config();
        let target = target();

        let start = Instant::now();
        let err = Submission::new(&mut transport, &mut reporter, &config, &target)
            .class_member(true)
            .run(&ticket(1), &mut document())
            .await
            .unwrap_err();
        assert!(matches!(err, IppwerkError::Requeue(_)));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert!(transport.sent(Kind::PrintJob).is_empty());
        assert!(reporter.progress.iter().any(|p| p.contains("next printer in class")));
    }
}

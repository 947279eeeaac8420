// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scheduler status lines (INFO:, NOTICE:, PAGE:, STATE:, ERROR:) on stderr.

use std::io::Write;

use ippwerk_core::human_errors::{HumanError, describe_reason};
use ippwerk_core::types::PageRecord;
use ippwerk_print::report::{JobReporter, state_line};
use tracing::debug;

/// Writes the line protocol the print scheduler reads from a backend.
pub struct CupsReporter<W> {
    sink: W,
    /// Per-copy `PAGE:` lines are left to the filters for spooled jobs.
    page_lines: bool,
}

impl<W: Write> CupsReporter<W> {
    pub fn new(sink: W, page_lines: bool) -> Self {
        Self { sink, page_lines }
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.sink, "{text}").and_then(|()| self.sink.flush()) {
            debug!(error = %err, "status line lost");
        }
    }

    /// Final failure report.
    pub fn error(&mut self, err: &HumanError) {
        self.line(&format!("ERROR: {}", err.message));
        self.line(&format!("INFO: {}", err.suggestion));
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> JobReporter for CupsReporter<W> {
    fn progress(&mut self, message: &str) {
        self.line(&format!("INFO: {message}"));
    }

    fn page(&mut self, record: PageRecord) {
        if self.page_lines {
            self.line(&format!("PAGE: {record}"));
        }
    }

    fn sheets_completed(&mut self, sheets: i32) {
        self.line(&format!("PAGE: total {sheets}"));
    }

    fn printer_state(&mut self, reasons: &[String]) {
        for reason in reasons {
            if let Some(msg) = describe_reason(reason) {
                self.line(&format!("{}: {}", msg.level.as_prefix(), msg.message));
            }
        }
        if let Some(line) = state_line(reasons) {
            self.line(&line);
        }
    }

    fn job_accepted(&mut self, job_id: Option<i32>) {
        match job_id {
            Some(id) => self.line(&format!("NOTICE: Print file accepted - job ID {id}.")),
            None => self.line("NOTICE: Print file accepted - job ID unknown."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippwerk_core::error::IppwerkError;
    use ippwerk_core::human_errors::humanize_error;

    fn output(reporter: CupsReporter<Vec<u8>>) -> Vec<String> {
        String::from_utf8(reporter.into_inner())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn accounting_lines() {
        let mut reporter = CupsReporter::new(Vec::new(), true);
        reporter.job_accepted(Some(42));
        reporter.page(PageRecord { page: 1, copies: 3 });
        reporter.sheets_completed(6);
        assert_eq!(
            output(reporter),
            [
                "NOTICE: Print file accepted - job ID 42.",
                "PAGE: 1 3",
                "PAGE: total 6"
            ]
        );
    }

    #[test]
    fn spooled_jobs_skip_page_lines() {
        let mut reporter = CupsReporter::new(Vec::new(), false);
        reporter.page(PageRecord { page: 1, copies: 1 });
        reporter.job_accepted(None);
        assert_eq!(output(reporter), ["NOTICE: Print file accepted - job ID unknown."]);
    }

    #[test]
    fn state_reasons_get_messages_then_summary() {
        let mut reporter = CupsReporter::new(Vec::new(), true);
        reporter.printer_state(&["media-jam-error".into(), "none".into()]);
        let lines = output(reporter);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ERROR: "));
        assert_eq!(lines[1], "STATE: media-jam-error,none");
    }

    #[test]
    fn errors_carry_a_suggestion() {
        let mut reporter = CupsReporter::new(Vec::new(), true);
        reporter.error(&humanize_error(&IppwerkError::Cancelled));
        let lines = output(reporter);
        assert_eq!(lines, ["ERROR: The job was cancelled.", "INFO: Nothing to do."]);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress, accounting and printer-state reporting.

use ippwerk_core::human_errors::{ReasonLevel, describe_reason};
use ippwerk_core::types::PageRecord;
use tracing::{error, info, warn};

use crate::message::Message;
use crate::tag::ValueTag;

/// Receives everything a submission has to say while it runs.
pub trait JobReporter {
    /// Informational progress, including every retry wait.
    fn progress(&mut self, message: &str);

    /// One transmission accepted by the printer.
    fn page(&mut self, record: PageRecord);

    /// `job-media-sheets-completed` once the job reached a final state.
    fn sheets_completed(&mut self, sheets: i32);

    /// Current `printer-state-reasons`, never empty.
    fn printer_state(&mut self, reasons: &[String]);

    /// The printer took a Print-Job; `None` when it gave no usable job id.
    fn job_accepted(&mut self, job_id: Option<i32>) {
        match job_id {
            Some(id) => self.progress(&format!("Print file accepted - job ID {id}.")),
            None => self.progress("Print file accepted - job ID unknown."),
        }
    }
}

/// Keywords of `printer-state-reasons` in `reply`, in wire order.
pub fn state_reasons(reply: &Message) -> Vec<String> {
    reply
        .find("printer-state-reasons", ValueTag::Keyword)
        .map(|attr| {
            attr.values
                .iter()
                .filter_map(|v| v.as_str().ok())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// `STATE: reason,reason` summary; `None` when there is nothing to say.
pub fn state_line(reasons: &[String]) -> Option<String> {
    (!reasons.is_empty()).then(|| format!("STATE: {}", reasons.join(",")))
}

/// Reporter that only writes structured log events.
#[derive(Debug, Default)]
pub struct LogReporter;

impl JobReporter for LogReporter {
    fn progress(&mut self, message: &str) {
        info!("{message}");
    }

    fn page(&mut self, record: PageRecord) {
        info!(page = record.page, copies = record.copies, "copy accepted");
    }

    fn sheets_completed(&mut self, sheets: i32) {
        info!(sheets, "job finished");
    }

    fn printer_state(&mut self, reasons: &[String]) {
        for reason in reasons {
            match describe_reason(reason) {
                Some(msg) if msg.level == ReasonLevel::Error => error!(%reason, "{}", msg.message),
                Some(msg) if msg.level == ReasonLevel::Warning => warn!(%reason, "{}", msg.message),
                Some(msg) => info!(%reason, "{}", msg.message),
                None => {}
            }
        }
        if let Some(line) = state_line(reasons) {
            info!("{line}");
        }
    }
}

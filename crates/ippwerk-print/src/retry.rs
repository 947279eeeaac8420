// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy for the submission pipeline.
//
// Every reply (or connection failure) is classified into an `Outcome`, and
// the stage that sent the request turns that into a `RetryDecision`.  Delays
// are fixed, not exponential: printers that are busy stay busy for a while
// and the scheduler already rate-limits backends.

use std::time::Duration;

use ippwerk_core::config::BackendConfig;
use ippwerk_core::error::{IppwerkError, Result};
use ippwerk_core::types::IppVersion;
use tracing::{debug, warn};

use crate::message::Message;
use crate::tag::StatusCode;

/// What a reply means for the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `successful-ok` or one of its variants.
    Accepted,
    /// `server-error-busy` or `server-error-service-unavailable`.
    Busy,
    /// `client-error-bad-request` or `server-error-version-not-supported`,
    /// which older printers send for a version they do not speak.
    VersionMismatch,
    NotFound,
    /// Any other failure status.
    Rejected(StatusCode),
    /// The connection failed or the reply could not be read.
    Unreachable,
}

/// Which part of the submission sent the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Negotiation,
    Submission,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Use the reply.
    Proceed,
    /// Send the same request again after this delay.
    RetryAfter(Duration),
    /// Drop to IPP/1.0 and try again at once.
    Downgrade,
    /// Polling is over: the job is gone from the printer.
    Finished,
    /// Stop the stage with the reply's status.
    GiveUp,
}

/// Fixed delays for each kind of retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub connect_delay: Duration,
    pub busy_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&BackendConfig::default())
    }
}

impl From<&BackendConfig> for RetryPolicy {
    fn from(config: &BackendConfig) -> Self {
        Self {
            connect_delay: config.connect_retry_delay(),
            busy_delay: config.busy_retry_delay(),
            poll_interval: config.poll_interval(),
        }
    }
}

pub fn classify_status(status: StatusCode) -> Outcome {
    match status {
        s if s.is_success() => Outcome::Accepted,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BUSY => Outcome::Busy,
        StatusCode::BAD_REQUEST | StatusCode::VERSION_NOT_SUPPORTED => Outcome::VersionMismatch,
        StatusCode::NOT_FOUND => Outcome::NotFound,
        other => Outcome::Rejected(other),
    }
}

/// Connection-level errors are retried; anything else ends the stage.
pub fn classify_error(err: &IppwerkError) -> Option<Outcome> {
    err.is_transport().then_some(Outcome::Unreachable)
}

/// Classify a transport result, keeping the reply when there is one.
/// Errors that are not connection failures pass straight through.
pub fn classify_result(result: Result<Message>) -> Result<(Outcome, Option<Message>)> {
    match result {
        Ok(reply) => Ok((classify_status(reply.status()), Some(reply))),
        Err(err) => match classify_error(&err) {
            Some(outcome) => {
                warn!(error = %err, "request failed");
                Ok((outcome, None))
            }
            None => Err(err),
        },
    }
}

/// The error a stage stops with after `GiveUp`.
pub fn fatal_error(outcome: Outcome, reply: Option<&Message>) -> IppwerkError {
    let Some(reply) = reply else {
        return IppwerkError::Transport("printer could not be reached".into());
    };
    let message = reply.status_message().map(str::to_owned);
    let message = match outcome {
        Outcome::NotFound => message.or_else(|| Some("Destination printer does not exist".into())),
        _ => message,
    };
    reply.status().into_error(message)
}

/// Progress line shown while waiting to retry.
pub fn retry_message(outcome: Outcome, delay: Duration) -> String {
    let secs = delay.as_secs();
    match outcome {
        Outcome::Unreachable => {
            format!("Unable to connect to printer; will retry in {secs} seconds...")
        }
        _ => format!("Printer is busy; will retry in {secs} seconds..."),
    }
}

/// Decide what `stage` does next after `outcome`, talking `version`.
pub fn decide(
    stage: Stage,
    outcome: Outcome,
    version: IppVersion,
    policy: &RetryPolicy,
) -> RetryDecision {
    let decision = match (stage, outcome) {
        (_, Outcome::Accepted) => RetryDecision::Proceed,

        (Stage::Negotiation, Outcome::Unreachable) => {
            RetryDecision::RetryAfter(policy.connect_delay)
        }
        (Stage::Negotiation, Outcome::Busy) => RetryDecision::RetryAfter(policy.busy_delay),
        (Stage::Negotiation, Outcome::VersionMismatch) if version > IppVersion::V1_0 => {
            RetryDecision::Downgrade
        }

        (Stage::Submission, Outcome::Unreachable | Outcome::Busy) => {
            RetryDecision::RetryAfter(policy.busy_delay)
        }

        // The job may have been purged with no history kept: that is success.
        (Stage::Polling, Outcome::NotFound) => RetryDecision::Finished,
        (Stage::Polling, Outcome::Unreachable | Outcome::Busy) => {
            RetryDecision::RetryAfter(policy.poll_interval)
        }

        _ => RetryDecision::GiveUp,
    };
    debug!(?stage, ?outcome, %version, ?decision, "retry decision");
    decision
}

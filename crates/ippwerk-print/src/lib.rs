// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ippwerk Print — IPP value and message model, binary wire codec, HTTP
// transport, printer capability negotiation, and the job submission state
// machine.  Protocol types live here; shared domain types come from
// `ippwerk-core`.

pub mod cancel;
pub mod capabilities;
pub mod codec;
pub mod http;
pub mod message;
pub mod options;
pub mod report;
pub mod requests;
pub mod retry;
pub mod submit;
pub mod tag;
pub mod transport;
pub mod value;

#[cfg(test)]
mod mock;

pub use cancel::CancelToken;
pub use capabilities::{Negotiator, PrinterCapabilities};
pub use codec::{DecodeLimits, Decoder, decode, encode};
pub use http::{HttpTransport, Security};
pub use message::{Attribute, Message};
pub use report::{JobReporter, LogReporter};
pub use submit::{Document, Submission};
pub use tag::{GroupTag, Operation, StatusCode, ValueTag};
pub use transport::Transport;
pub use value::Value;

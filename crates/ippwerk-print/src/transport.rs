// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport seam between the protocol state machines and the wire.
//
// A transport turns a request message into a reply message.  Connection
// failures come back as `Err`; anything the far end said (including HTTP
// level refusals) comes back as a reply whose status code says what went
// wrong.

use tokio::io::{AsyncRead, AsyncSeek};

use ippwerk_core::error::Result;

use crate::message::Message;
use crate::tag::{GroupTag, StatusCode, ValueTag};

/// Supplies a password when the server challenges.  `None` gives up.
pub type CredentialCallback = Box<dyn FnMut() -> Option<String> + Send>;

/// Request/response exchange with an IPP endpoint.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `request` to `resource` and return the reply.
    async fn do_request(&mut self, request: &Message, resource: &str) -> Result<Message>;

    /// Like [`do_request`](Self::do_request), with the document streamed
    /// after the encoded attributes.  The document is read from its current
    /// position to the end.
    async fn do_file_request<D>(
        &mut self,
        request: &Message,
        resource: &str,
        document: &mut D,
    ) -> Result<Message>
    where
        D: AsyncRead + AsyncSeek + Unpin + Send;
}

/// IPP status standing in for an HTTP status other than 200.
pub fn status_for_http(code: u16) -> StatusCode {
    match code {
        400 => StatusCode::BAD_REQUEST,
        401 => StatusCode::NOT_AUTHENTICATED,
        403 => StatusCode::FORBIDDEN,
        404 => StatusCode::NOT_FOUND,
        413 => StatusCode::REQUEST_VALUE_TOO_LONG,
        501 => StatusCode::OPERATION_NOT_SUPPORTED,
        505 => StatusCode::VERSION_NOT_SUPPORTED,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build the reply a printer would have sent for `status`, answering
/// `request` in its own version and request-id.
pub fn folded_reply(request: &Message, status: StatusCode, detail: impl Into<String>) -> Message {
    let mut reply = Message::response(status, request.request_id).with_version(request.version);
    reply.add_string(GroupTag::Operation, ValueTag::Charset, "attributes-charset", "utf-8");
    reply.add_string(
        GroupTag::Operation,
        ValueTag::NaturalLanguage,
        "attributes-natural-language",
        "en",
    );
    reply.add_string(GroupTag::Operation, ValueTag::Text, "status-message", detail);
    reply
}

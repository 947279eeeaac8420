// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP over HTTP/1.1 POST (RFC 8010 SS4), plain or TLS, on a reqwest client.
//
// The client keeps no idle connections.  Some embedded printers drop the
// socket after each request regardless of keep-alive, so reusing one buys
// nothing and costs a stale-socket retry.

use std::io::SeekFrom;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use ippwerk_core::error::{IppwerkError, Result};

use crate::codec::{self, DecodeLimits, Decoder, Progress};
use crate::message::Message;
use crate::tag::StatusCode;
use crate::transport::{CredentialCallback, Transport, folded_reply, status_for_http};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Document bytes read per body chunk.
const READ_CHUNK: usize = 64 * 1024;

/// Body chunks queued ahead of the connection.
const BODY_QUEUE: usize = 4;

const USER_AGENT: &str = concat!("ippwerk/", env!("CARGO_PKG_VERSION"));

/// Flatten a reqwest error and its causes into one transport error, so
/// "connection refused" and friends survive into the message.
fn transport_err(context: &str, err: reqwest::Error) -> IppwerkError {
    let mut detail = format!("{context}: {err}");
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    IppwerkError::Transport(detail)
}

fn document_err(err: std::io::Error) -> IppwerkError {
    IppwerkError::Document(err.to_string())
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// How the connection to the printer is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    #[default]
    Plain,
    /// TLS, with the certificate checked against the web PKI roots.
    Verified,
    /// TLS accepting any certificate.  Most printers ship a self-signed one.
    Unverified,
}

impl Security {
    fn scheme(self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Verified | Self::Unverified => "https",
        }
    }
}

/// [`Transport`] speaking HTTP/1.1 to `host:port`.
pub struct HttpTransport {
    client: Client,
    host: String,
    port: u16,
    security: Security,
    username: String,
    credentials: Option<CredentialCallback>,
    /// Basic password once a challenge has been answered.
    password: Option<String>,
    limits: DecodeLimits,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(security == Security::Unverified)
            .build()
            .map_err(|e| IppwerkError::Http(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            host: host.into(),
            port,
            security,
            username: "anonymous".into(),
            credentials: None,
            password: None,
            limits: DecodeLimits::default(),
        })
    }

    /// User name sent with Basic authentication.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Called once per exchange when the server answers 401.
    pub fn with_credentials(mut self, callback: CredentialCallback) -> Self {
        self.credentials = Some(callback);
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// `host:port`, with IPv6 literals in brackets.
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn url(&self, resource: &str) -> Result<Url> {
        let slash = if resource.starts_with('/') { "" } else { "/" };
        let text = format!(
            "{}://{}{slash}{resource}",
            self.security.scheme(),
            self.endpoint()
        );
        Url::parse(&text).map_err(|e| IppwerkError::InvalidUri(format!("{text}: {e}")))
    }

    #[instrument(
        skip(self, request, document),
        fields(endpoint = %self.endpoint(), code = request.code)
    )]
    async fn exchange<D>(
        &mut self,
        request: &Message,
        resource: &str,
        mut document: Option<&mut D>,
    ) -> Result<Message>
    where
        D: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let body = codec::encode(request)?;
        let url = self.url(resource)?;

        // Document span: from where the caller left it to the end.
        let span = match document.as_deref_mut() {
            Some(doc) => Some(document_span(doc).await?),
            None => None,
        };

        let mut challenged = false;
        loop {
            let mut builder = self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/ipp");
            if let Some(password) = &self.password {
                builder = builder.basic_auth(&self.username, Some(password));
            }

            let response = match (document.as_deref_mut(), span) {
                (Some(doc), Some((_, len))) => {
                    send_with_document(builder, body.clone(), doc, len).await?
                }
                _ => builder
                    .body(body.clone())
                    .send()
                    .await
                    .map_err(|e| transport_err("send request", e))?,
            };

            let status = response.status();
            debug!(status = status.as_u16(), "HTTP reply");

            match status.as_u16() {
                200 => {
                    return match read_reply(response, self.limits).await {
                        Ok(reply) => Ok(reply),
                        Err(IppwerkError::MalformedMessage(detail)) => {
                            warn!(%detail, "undecodable IPP reply");
                            Ok(folded_reply(
                                request,
                                StatusCode::SERVICE_UNAVAILABLE,
                                format!("malformed IPP reply: {detail}"),
                            ))
                        }
                        Err(e) => Err(e),
                    };
                }
                401 if !challenged => {
                    challenged = true;
                    let password = self.credentials.as_mut().and_then(|callback| callback());
                    let Some(password) = password else {
                        return Ok(folded_reply(
                            request,
                            StatusCode::NOT_AUTHENTICATED,
                            "printer requires authentication",
                        ));
                    };
                    self.password = Some(password);
                    debug!(user = %self.username, "retrying with Basic authorization");

                    if let (Some(doc), Some((start, _))) = (document.as_deref_mut(), span) {
                        doc.seek(SeekFrom::Start(start)).await.map_err(document_err)?;
                    }
                }
                code => {
                    return Ok(folded_reply(
                        request,
                        status_for_http(code),
                        format!(
                            "HTTP {code} {}",
                            status.canonical_reason().unwrap_or_default()
                        ),
                    ));
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    async fn do_request(&mut self, request: &Message, resource: &str) -> Result<Message> {
        self.exchange::<std::io::Cursor<&[u8]>>(request, resource, None)
            .await
    }

    async fn do_file_request<D>(
        &mut self,
        request: &Message,
        resource: &str,
        document: &mut D,
    ) -> Result<Message>
    where
        D: AsyncRead + AsyncSeek + Unpin + Send,
    {
        self.exchange(request, resource, Some(document)).await
    }
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// `(start, length)` of the unread part of the document.
async fn document_span<D>(doc: &mut D) -> Result<(u64, u64)>
where
    D: AsyncSeek + Unpin,
{
    let start = doc.stream_position().await.map_err(document_err)?;
    let end = doc.seek(SeekFrom::End(0)).await.map_err(document_err)?;
    doc.seek(SeekFrom::Start(start)).await.map_err(document_err)?;
    Ok((start, end.saturating_sub(start)))
}

/// Request body fed chunk by chunk from [`feed_body`].
struct ChannelBody(mpsc::Receiver<std::io::Result<Vec<u8>>>);

impl Stream for ChannelBody {
    type Item = std::io::Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.poll_recv(cx)
    }
}

/// Send the encoded attributes followed by `len` document bytes.
///
/// The body is fed from this future rather than a spawned task, so the
/// borrowed document never has to outlive the call.  A failing read ends
/// the exchange with [`IppwerkError::Document`].
async fn send_with_document<D>(
    builder: RequestBuilder,
    attributes: Vec<u8>,
    document: &mut D,
    len: u64,
) -> Result<Response>
where
    D: AsyncRead + Unpin,
{
    let total = attributes.len() as u64 + len;
    let (tx, rx) = mpsc::channel(BODY_QUEUE);
    let send = builder
        .header(CONTENT_LENGTH, total)
        .body(Body::wrap_stream(ChannelBody(rx)))
        .send();
    let feed = feed_body(tx, attributes, document, len);
    tokio::pin!(send, feed);

    let mut fed = false;
    loop {
        tokio::select! {
            sent = &mut send => return sent.map_err(|e| transport_err("send request", e)),
            result = &mut feed, if !fed => {
                result?;
                fed = true;
            }
        }
    }
}

async fn feed_body<D>(
    tx: mpsc::Sender<std::io::Result<Vec<u8>>>,
    attributes: Vec<u8>,
    document: &mut D,
    len: u64,
) -> Result<()>
where
    D: AsyncRead + Unpin,
{
    // A closed receiver means the request already finished or failed.
    if tx.send(Ok(attributes)).await.is_err() {
        return Ok(());
    }

    let mut remaining = len;
    while remaining > 0 {
        let mut chunk = vec![0u8; remaining.min(READ_CHUNK as u64) as usize];
        let n = document.read(&mut chunk).await.map_err(document_err)?;
        if n == 0 {
            return Err(IppwerkError::Document(format!(
                "print file ended after {} of {len} bytes",
                len - remaining
            )));
        }
        chunk.truncate(n);
        remaining -= n as u64;
        if tx.send(Ok(chunk)).await.is_err() {
            return Ok(());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reply body
// ---------------------------------------------------------------------------

/// Feed the reply body into the decoder until a message completes.  The
/// decoder's limits bound what gets buffered.
async fn read_reply(mut response: Response, limits: DecodeLimits) -> Result<Message> {
    let mut decoder = Decoder::with_limits(limits);
    loop {
        if let Progress::Complete(message) = decoder.advance()? {
            return Ok(message);
        }
        let chunk = response
            .chunk()
            .await
            .map_err(|e| transport_err("read reply body", e))?;
        match chunk {
            Some(bytes) => decoder.feed(&bytes),
            None => return decoder.finish(),
        }
    }
}

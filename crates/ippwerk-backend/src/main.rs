// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp — network print backend.
//
// Invoked by the print scheduler as
//
//   ipp job-id user title copies options [file]
//
// with the device URI in DEVICE_URI (or argv[0]).  With no arguments it
// prints its device-discovery line.  Status goes to stderr as INFO:, PAGE:,
// STATE: and ERROR: lines.

mod device_uri;
mod reporter;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use ippwerk_core::config::{BackendConfig, Encryption, Locale, require_positive};
use ippwerk_core::error::{IppwerkError, Result};
use ippwerk_core::human_errors::humanize_error;
use ippwerk_core::types::{JobTicket, PrinterTarget};
use ippwerk_print::codec::DecodeLimits;
use ippwerk_print::options::parse_options;
use ippwerk_print::report::JobReporter;
use ippwerk_print::{CancelToken, Document, HttpTransport, Security, Submission, Transport};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, warn};

use device_uri::DeviceUri;
use reporter::CupsReporter;

const DISCOVERY_LINE: &str = r#"network ipp "Unknown" "Internet Printing Protocol (ipp)""#;
const USAGE: &str = "Usage: ipp job-id user title copies options [file]";

/// ipp — send a print job to an IPP printer
#[derive(Parser, Debug)]
#[command(name = "ipp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scheduler job id
    job_id: Option<String>,

    /// Requesting user
    user: Option<String>,

    /// Job title
    #[arg(allow_hyphen_values = true)]
    title: Option<String>,

    /// Number of copies
    copies: Option<String>,

    /// Job options, e.g. "media=a4 sides=two-sided-long-edge"
    #[arg(allow_hyphen_values = true)]
    options: Option<String>,

    /// Print file; stdin is spooled when omitted
    file: Option<PathBuf>,

    /// JSON backend configuration
    #[arg(long, env = "IPPWERK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

/// The five mandatory job arguments once they are known to be present.
struct JobArgs {
    user: String,
    title: String,
    copies: String,
    options: String,
    file: Option<PathBuf>,
}

impl Cli {
    fn job_args(&mut self) -> Option<JobArgs> {
        Some(JobArgs {
            user: self.user.take()?,
            title: self.title.take()?,
            copies: self.copies.take()?,
            options: self.options.take()?,
            file: self.file.take(),
        })
    }
}

/// What the scheduler passes besides the argument list.
struct Environment {
    device_uri: Option<String>,
    argv0: Option<String>,
    content_type: Option<String>,
    class: Option<String>,
    locale: Locale,
}

impl Environment {
    fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            device_uri: var("DEVICE_URI"),
            argv0: std::env::args().next(),
            content_type: var("CONTENT_TYPE"),
            class: var("CLASS"),
            locale: Locale::from_env(),
        }
    }

    /// DEVICE_URI wins; argv[0] counts only when it looks like a URI.
    fn device_uri(&self) -> Result<DeviceUri> {
        let raw = self
            .device_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .or_else(|| self.argv0.as_deref().filter(|arg| arg.contains(':')))
            .ok_or_else(|| IppwerkError::InvalidUri("no device URI given".into()))?;
        DeviceUri::parse(raw)
    }
}

/// Where the print data lives.  A spool file is removed when dropped.
enum Input {
    File(PathBuf),
    Spool(tempfile::NamedTempFile),
}

impl Input {
    fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Spool(spool) => spool.path(),
        }
    }
}

/// One job, resolved from arguments, environment and configuration.
struct Job {
    uri: DeviceUri,
    config: BackendConfig,
    ticket: JobTicket,
    target: PrinterTarget,
    locale: Locale,
    class_member: bool,
    content_type: String,
    input: Input,
}

impl Job {
    fn security(&self) -> Security {
        match (self.config.encryption.uses_tls(), self.config.tls_verify) {
            (false, _) => Security::Plain,
            (true, true) => Security::Verified,
            (true, false) => Security::Unverified,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut cli = Cli::parse();

    if cli.job_id.is_none() {
        println!("{DISCOVERY_LINE}");
        return ExitCode::SUCCESS;
    }
    let Some(job) = cli.job_args() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    // Spooled stdin already carries its copies, so no per-copy PAGE lines.
    let mut reporter = CupsReporter::new(std::io::stderr(), job.file.is_some());
    let env = Environment::from_process();

    let result = run(&env, cli.config.as_deref(), job, &mut reporter).await;
    ExitCode::from(finish(result, &mut reporter))
}

async fn run<P: JobReporter>(
    env: &Environment,
    config_path: Option<&Path>,
    args: JobArgs,
    reporter: &mut P,
) -> Result<()> {
    let job = prepare(env, config_path, args, &mut tokio::io::stdin(), reporter).await?;
    let mut transport = connect(&job)?;

    let cancel = CancelToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    submit(&job, &mut transport, reporter, cancel).await
}

/// Exit status for the scheduler; failures are reported first.
fn finish<W: Write>(result: Result<()>, reporter: &mut CupsReporter<W>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            warn!(error = %err, "job failed");
            reporter.error(&humanize_error(&err));
            1
        }
    }
}

/// Resolve the job.  Print data on `stdin` is spooled when no file was
/// named, since every copy and retry has to rewind it.
async fn prepare<I, P>(
    env: &Environment,
    config_path: Option<&Path>,
    args: JobArgs,
    stdin: &mut I,
    reporter: &mut P,
) -> Result<Job>
where
    I: AsyncRead + Unpin,
    P: JobReporter,
{
    let uri = env.device_uri()?;

    let mut config = match config_path {
        Some(path) => BackendConfig::from_json_file(path)?,
        None => BackendConfig::default(),
    };
    if uri.is_encrypted() {
        config.encryption = Encryption::Always;
    }
    if let Some(options) = &uri.options {
        for rejected in config.apply_uri_options(options) {
            reporter.progress(&rejected);
        }
    }

    let copies = args
        .copies
        .trim()
        .parse()
        .map_err(|_| IppwerkError::Config(format!("bad copy count \"{}\"", args.copies)))?;
    let ticket = JobTicket {
        title: args.title,
        copies: require_positive("copies", copies)?,
        options: parse_options(&args.options),
        manual_copies: args.file.is_some(),
    };

    let target = PrinterTarget {
        uri: uri.printer_uri(),
        resource: uri.resource.clone(),
        requesting_user: Some(args.user),
        natural_language: env.locale.language.clone(),
    };

    let (input, default_type) = match args.file {
        Some(path) => (Input::File(path), "application/octet-stream"),
        None => (Input::Spool(spool(stdin).await?), "application/vnd.cups-raw"),
    };
    let content_type = env
        .content_type
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_type.to_owned());

    Ok(Job {
        uri,
        config,
        ticket,
        target,
        locale: env.locale.clone(),
        class_member: env.class.as_deref().is_some_and(|class| !class.is_empty()),
        content_type,
        input,
    })
}

fn connect(job: &Job) -> Result<HttpTransport> {
    let username = job
        .uri
        .username
        .clone()
        .or_else(|| job.target.user().map(str::to_owned))
        .unwrap_or_else(|| "anonymous".into());
    let mut password = job.uri.password.clone();

    Ok(HttpTransport::new(job.uri.host.clone(), job.uri.port, job.security())?
        .with_username(username)
        .with_credentials(Box::new(move || password.take()))
        .with_limits(DecodeLimits {
            max_field_length: job.config.max_field_length,
            ..DecodeLimits::default()
        }))
}

async fn submit<T, P>(
    job: &Job,
    transport: &mut T,
    reporter: &mut P,
    cancel: CancelToken,
) -> Result<()>
where
    T: Transport,
    P: JobReporter,
{
    let file = tokio::fs::File::open(job.input.path()).await?;
    let mut document = Document::new(file, Some(job.content_type.clone()));

    info!(
        printer = %job.target.uri,
        copies = job.ticket.copies,
        class_member = job.class_member,
        "starting job"
    );
    let report = Submission::new(transport, reporter, &job.config, &job.target)
        .with_locale(job.locale.clone())
        .with_cancel(cancel)
        .class_member(job.class_member)
        .run(&job.ticket, &mut document)
        .await?;

    info!(
        id = %report.id,
        version = %report.version,
        jobs = ?report.job_ids,
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "job complete"
    );
    reporter.progress("Ready to print.");
    Ok(())
}

/// Copy `input` into a temporary file so it can be rewound.
async fn spool<I>(input: &mut I) -> Result<tempfile::NamedTempFile>
where
    I: AsyncRead + Unpin,
{
    let spool = tempfile::NamedTempFile::new()?;
    let mut out = tokio::fs::File::create(spool.path()).await?;
    let bytes = tokio::io::copy(input, &mut out).await?;
    out.flush().await?;
    info!(bytes, path = %spool.path().display(), "spooled print data");
    Ok(spool)
}

/// Set `cancel` on SIGTERM or Ctrl-C.
async fn cancel_on_signal(cancel: CancelToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("cancel requested; stopping at the next step");
    cancel.cancel();
}

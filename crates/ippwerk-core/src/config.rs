// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend configuration: defaults, JSON file loading, and device-URI options.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IppwerkError, Result};
use crate::types::IppVersion;

/// Default cap on any single length-prefixed field accepted by the decoder.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 32 * 1024 - 1;

/// When to use TLS on the connection to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    #[default]
    IfRequested,
    Never,
    Required,
    Always,
}

impl Encryption {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ifrequested" => Some(Self::IfRequested),
            "never" => Some(Self::Never),
            "required" => Some(Self::Required),
            "always" => Some(Self::Always),
            _ => None,
        }
    }

    /// Whether the connection starts with a TLS handshake.  HTTP Upgrade
    /// (RFC 2817) is never offered, so `required` connects with TLS too.
    pub fn uses_tls(self) -> bool {
        matches!(self, Self::Required | Self::Always)
    }
}

/// Settings for one backend run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// IPP version to start negotiation with.  Starting at 1.0 disables the
    /// automatic downgrade.
    pub version: IppVersion,
    /// Poll the job until it reaches a terminal state.
    pub wait_job: bool,
    /// When printing to a class, requeue if the printer is stopped.
    pub wait_printer: bool,
    /// Query and report `printer-state-reasons` while the job runs.
    pub report_printer_state: bool,
    /// Delay before retrying an unreachable printer.
    pub connect_retry_secs: u64,
    /// Delay before retrying a busy printer.
    pub busy_retry_secs: u64,
    /// Interval between Get-Job-Attributes polls.
    pub poll_interval_secs: u64,
    /// Pause before giving up on a class member so the job does not requeue
    /// too rapidly.
    pub requeue_delay_secs: u64,
    /// Largest name or value the decoder will accept.
    pub max_field_length: usize,
    /// TLS policy.  `ipps` and `https` device URIs force `always`.
    pub encryption: Encryption,
    /// Check the printer's TLS certificate against the web PKI roots.
    /// Printers with self-signed certificates need this off.
    pub tls_verify: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            version: IppVersion::V1_1,
            wait_job: true,
            wait_printer: true,
            report_printer_state: true,
            connect_retry_secs: 30,
            busy_retry_secs: 10,
            poll_interval_secs: 10,
            requeue_delay_secs: 5,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            encryption: Encryption::IfRequested,
            tls_verify: true,
        }
    }
}

impl BackendConfig {
    /// Load settings from a JSON file.  Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        debug!(path = %path.as_ref().display(), "loaded backend configuration");
        Ok(config)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_secs)
    }

    pub fn busy_retry_delay(&self) -> Duration {
        Duration::from_secs(self.busy_retry_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn requeue_delay(&self) -> Duration {
        Duration::from_secs(self.requeue_delay_secs)
    }

    /// Apply the `?name=value+name=value` options from a device URI.
    ///
    /// Unknown names and values are logged and skipped; the returned list
    /// holds one message per rejected option so the caller can surface it.
    pub fn apply_uri_options(&mut self, query: &str) -> Vec<String> {
        let mut rejected = Vec::new();

        for pair in query.split(['+', '&']).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));

            match name.to_ascii_lowercase().as_str() {
                "waitjob" => self.wait_job = parse_flag(value),
                "waitprinter" => self.wait_printer = parse_flag(value),
                "encryption" => match Encryption::parse(value) {
                    Some(encryption) => self.encryption = encryption,
                    None => rejected.push(format!("Unknown encryption option value \"{value}\"")),
                },
                "version" => match value.parse::<IppVersion>() {
                    Ok(v) if v <= IppVersion::V1_1 => self.version = v,
                    _ => rejected.push(format!("Unknown version option value \"{value}\"")),
                },
                _ => rejected.push(format!("Unknown option \"{name}\" with value \"{value}\"")),
            }
        }

        for message in &rejected {
            warn!("{message}");
        }
        rejected
    }
}

/// URI option booleans: "on", "yes" and "true" enable, anything else disables.
fn parse_flag(value: &str) -> bool {
    ["on", "yes", "true"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
}

/// Language and character set of the local environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// RFC 5646 style tag, e.g. `en` or `de-de`.
    pub language: String,
    /// IANA charset name, e.g. `utf-8` or `us-ascii`.
    pub charset: String,
}

impl Locale {
    /// Read `LC_ALL`, `LC_CTYPE` and `LANG` in the usual precedence order.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let raw = var("LC_ALL").or_else(|| var("LC_CTYPE")).or_else(|| var("LANG"));
        Self::parse(raw.as_deref())
    }

    /// Parse a POSIX locale name such as `de_DE.ISO8859-1@euro`.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(r) if r != "C" && r != "POSIX" => r,
            _ => {
                return Self {
                    language: "en".into(),
                    charset: "us-ascii".into(),
                };
            }
        };

        let without_modifier = raw.split('@').next().unwrap_or(raw);
        let (lang, codeset) = match without_modifier.split_once('.') {
            Some((lang, codeset)) => (lang, Some(codeset)),
            None => (without_modifier, None),
        };

        let language = lang.replace('_', "-").to_ascii_lowercase();
        let charset = codeset.map(normalize_charset).unwrap_or_else(|| "utf-8".into());

        Self { language, charset }
    }
}

/// Map POSIX codeset spellings onto IANA charset names.
fn normalize_charset(codeset: &str) -> String {
    let lower = codeset.to_ascii_lowercase();
    match lower.as_str() {
        "utf8" | "utf-8" => "utf-8".into(),
        "ascii" | "us-ascii" | "ansi_x3.4-1968" => "us-ascii".into(),
        other => {
            if let Some(part) = other.strip_prefix("iso8859-") {
                format!("iso-8859-{part}")
            } else if let Some(part) = other.strip_prefix("iso8859") {
                format!("iso-8859-{part}")
            } else {
                other.to_string()
            }
        }
    }
}

/// Fail with a configuration error unless `value` is positive.
pub fn require_positive(name: &str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(IppwerkError::Config(format!("{name} must be at least 1")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_delays() {
        let config = BackendConfig::default();
        assert_eq!(config.connect_retry_delay(), Duration::from_secs(30));
        assert_eq!(config.busy_retry_delay(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.version, IppVersion::V1_1);
    }

    #[test]
    fn uri_options_are_applied() {
        let mut config = BackendConfig::default();
        let rejected = config.apply_uri_options("waitjob=no+version=1.0&waitprinter=off");
        assert!(rejected.is_empty());
        assert!(!config.wait_job);
        assert!(!config.wait_printer);
        assert_eq!(config.version, IppVersion::V1_0);
    }

    #[test]
    fn encryption_option_selects_tls() {
        let mut config = BackendConfig::default();
        assert!(!config.encryption.uses_tls());

        let rejected = config.apply_uri_options("encryption=Always");
        assert!(rejected.is_empty());
        assert_eq!(config.encryption, Encryption::Always);
        assert!(config.encryption.uses_tls());

        config.apply_uri_options("encryption=required");
        assert!(config.encryption.uses_tls());
        config.apply_uri_options("encryption=never");
        assert!(!config.encryption.uses_tls());

        let rejected = config.apply_uri_options("encryption=sometimes");
        assert_eq!(rejected, ["Unknown encryption option value \"sometimes\""]);
        assert_eq!(config.encryption, Encryption::Never);
    }

    #[test]
    fn unknown_uri_options_are_rejected_but_harmless() {
        let mut config = BackendConfig::default();
        let rejected = config.apply_uri_options("color=fancy+version=2.0");
        assert_eq!(rejected.len(), 2);
        assert_eq!(config.version, IppVersion::V1_1);
    }

    #[test]
    fn json_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ippwerk.json");
        std::fs::write(
            &path,
            r#"{ "busy_retry_secs": 3, "version": "1.0", "encryption": "always" }"#,
        )
        .unwrap();

        let config = BackendConfig::from_json_file(&path).unwrap();
        assert_eq!(config.busy_retry_secs, 3);
        assert_eq!(config.encryption, Encryption::Always);
        assert!(config.tls_verify);
        assert_eq!(config.version, IppVersion::V1_0);
        assert_eq!(config.connect_retry_secs, 30);
    }

    #[test]
    fn locale_parsing() {
        assert_eq!(
            Locale::parse(Some("de_DE.UTF-8")),
            Locale {
                language: "de-de".into(),
                charset: "utf-8".into()
            }
        );
        assert_eq!(Locale::parse(Some("fr_FR.ISO8859-1@euro")).charset, "iso-8859-1");
        assert_eq!(Locale::parse(Some("C")).charset, "us-ascii");
        assert_eq!(Locale::parse(None).language, "en");
    }

    #[test]
    fn zero_copies_is_a_config_error() {
        assert!(require_positive("copies", 0).is_err());
        assert_eq!(require_positive("copies", 4).unwrap(), 4);
    }
}

//! Command-line configuration and the export run.
//!
//! Two invocation shapes are accepted and resolved into one
//! [`ExportConfig`]:
//!
//! - flags: `k2geo -source <url-or-path> -country CN -ipv4_out a.txt -ipv6_out b.txt`
//! - positional: `k2geo <source> <country> <output>` (IPv4 only)
//!
//! Go-style single-dash long flags are rewritten to `--flag` before parsing.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::export::{CidrExporter, DomainExporter, DomainSummary, ExportSummary};
use crate::loader::{load_cidrs, load_domains};
use crate::source::{FetchOptions, SourceLocator};
use crate::{Error, Result};

/// Default `geoip.dat` source.
pub const DEFAULT_GEOIP_SOURCE: &str = "https://github.com/v2fly/geoip/raw/release/geoip.dat";

/// Default `geosite.dat` source, used with `-domain_out`.
pub const DEFAULT_GEOSITE_SOURCE: &str =
    "https://github.com/v2fly/domain-list-community/releases/latest/download/dlc.dat";

/// Default country code.
pub const DEFAULT_COUNTRY: &str = "CN";

const POSITIONAL_USAGE: &str = "k2geo <source> <country> <output>";

/// Long flags that may be written with a single dash.
const LEGACY_FLAGS: &[&str] = &[
    "source",
    "country",
    "ipv4_out",
    "ipv6_out",
    "domain_out",
    "timeout",
    "help",
];

#[derive(Parser, Debug)]
#[command(name = "k2geo")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(
    about = "Export one country's CIDR or domain list from a V2Ray geo database",
    long_about = None
)]
pub struct Cli {
    /// Database URL or file path [default: v2fly geoip.dat]
    #[arg(long = "source", value_name = "URL_OR_PATH")]
    pub source: Option<String>,

    /// Country code, matched case-sensitively [default: CN]
    #[arg(long = "country", value_name = "CODE")]
    pub country: Option<String>,

    /// IPv4 address output file
    #[arg(long = "ipv4_out", visible_alias = "ipv4-out", value_name = "PATH")]
    pub ipv4_out: Option<PathBuf>,

    /// IPv6 address output file
    #[arg(long = "ipv6_out", visible_alias = "ipv6-out", value_name = "PATH")]
    pub ipv6_out: Option<PathBuf>,

    /// Domain list output file (reads a geosite database)
    #[arg(
        long = "domain_out",
        visible_alias = "domain-out",
        value_name = "PATH",
        conflicts_with_all = ["ipv4_out", "ipv6_out"]
    )]
    pub domain_out: Option<PathBuf>,

    /// Download timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Positional form: <SOURCE> <COUNTRY> <OUTPUT>
    #[arg(value_name = "ARGS", num_args = 0..=3)]
    pub positional: Vec<String>,
}

/// What the process should do after parsing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// No output configured: print usage and exit successfully
    Usage,
    /// Run an export
    Export(ExportConfig),
}

/// Which database the run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// `geoip.dat` CIDRs split by address family
    Cidrs {
        ipv4_out: Option<PathBuf>,
        ipv6_out: Option<PathBuf>,
    },
    /// `geosite.dat` domain rules
    Domains { out: PathBuf },
}

/// Fully resolved settings for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub source: SourceLocator,
    pub country: String,
    pub target: ExportTarget,
    pub fetch: FetchOptions,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSummary {
    Cidrs(ExportSummary),
    Domains(DomainSummary),
}

impl Cli {
    /// Parse arguments, accepting single-dash long flags.
    pub fn parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_legacy_flags(args))
    }

    /// Resolve parsed arguments into an invocation.
    pub fn resolve(self) -> Result<Invocation> {
        let (source, country, ipv4_out) = match self.positional.len() {
            0 => (self.source, self.country, self.ipv4_out),
            3 => {
                if self.source.is_some() || self.country.is_some() || self.ipv4_out.is_some() {
                    return Err(Error::Config(
                        "positional arguments cannot be combined with -source, -country or -ipv4_out"
                            .to_string(),
                    ));
                }
                let mut args = self.positional.into_iter();
                (args.next(), args.next(), args.next().map(PathBuf::from))
            }
            _ => return Err(Error::Usage(POSITIONAL_USAGE.to_string())),
        };

        let target = match (self.domain_out, ipv4_out, self.ipv6_out) {
            (Some(out), None, None) => ExportTarget::Domains { out },
            (Some(_), _, _) => {
                return Err(Error::Config(
                    "-domain_out cannot be combined with -ipv4_out or -ipv6_out".to_string(),
                ))
            }
            (None, None, None) => return Ok(Invocation::Usage),
            (None, ipv4_out, ipv6_out) => ExportTarget::Cidrs { ipv4_out, ipv6_out },
        };

        let default_source = match target {
            ExportTarget::Cidrs { .. } => DEFAULT_GEOIP_SOURCE,
            ExportTarget::Domains { .. } => DEFAULT_GEOSITE_SOURCE,
        };
        let source = SourceLocator::parse(source.as_deref().unwrap_or(default_source));
        let kind = if source.is_remote() { "remote" } else { "local" };
        log::debug!("Source {} classified as {}", source, kind);

        Ok(Invocation::Export(ExportConfig {
            source,
            country: country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            target,
            fetch: FetchOptions {
                timeout: Duration::from_secs(self.timeout),
            },
        }))
    }
}

/// Rewrite `-flag` and `-flag=value` into `--flag` forms clap understands.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s.starts_with("--") {
                return arg;
            }
            let Some(rest) = s.strip_prefix('-') else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("-{}", s))
            } else {
                arg
            }
        })
        .collect()
}

/// Execute one export run.
///
/// The database is loaded and filtered before any output file is created,
/// so a missing country leaves the filesystem untouched.
pub fn run(config: &ExportConfig) -> Result<RunSummary> {
    match &config.target {
        ExportTarget::Cidrs { ipv4_out, ipv6_out } => {
            let cidrs = load_cidrs(&config.source, &config.country, &config.fetch)?;

            let mut exporter = CidrExporter::create(ipv4_out.as_deref(), ipv6_out.as_deref())?;
            let summary = exporter.export(&cidrs)?;
            exporter.finish()?;

            log::info!(
                "Exported {} IPv4 and {} IPv6 CIDRs for {}",
                summary.ipv4,
                summary.ipv6,
                config.country
            );
            Ok(RunSummary::Cidrs(summary))
        }
        ExportTarget::Domains { out } => {
            let domains = load_domains(&config.source, &config.country, &config.fetch)?;

            let mut exporter = DomainExporter::create(out)?;
            let summary = exporter.export(&domains)?;
            exporter.finish()?;

            log::info!(
                "Exported {} domains for {}",
                summary.written,
                config.country
            );
            Ok(RunSummary::Domains(summary))
        }
    }
}

//! Writing selected records as plain-text lists.
//!
//! CIDRs are routed by address family to separate destinations, one
//! `address/prefix` per line. Domains go to a single destination as
//! `kind:value` lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geodat::domain::{self, attribute::TypedValue};
use crate::geodat::{AddressFamily, Cidr, Domain};
use crate::{Error, Result};

/// An open output stream together with the path used in error messages.
pub struct Destination<W: Write> {
    path: PathBuf,
    writer: W,
}

impl<W: Write> Destination<W> {
    /// Wrap an already open writer.
    pub fn new(path: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            path: path.into(),
            writer,
        }
    }

    /// Path this destination writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| Error::OutputWrite {
                path: self.path.clone(),
                source: e,
            })
    }

    fn finish(mut self) -> Result<W> {
        self.writer.flush().map_err(|e| Error::OutputWrite {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(self.writer)
    }
}

impl Destination<BufWriter<File>> {
    /// Create (or truncate) a file destination.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::OutputCreate {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Created output file {}", path.display());
        Ok(Self::new(path, BufWriter::new(file)))
    }
}

/// Counters describing one CIDR export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Lines written to the IPv4 destination
    pub ipv4: usize,
    /// Lines written to the IPv6 destination
    pub ipv6: usize,
    /// Records whose family has no destination
    pub skipped: usize,
    /// Records whose address is neither 4 nor 16 bytes
    pub unclassified: usize,
}

/// Format a CIDR record as `address/prefix`.
///
/// Returns `None` for addresses that are neither IPv4 nor IPv6.
pub fn format_cidr(cidr: &Cidr) -> Option<String> {
    let addr = cidr.address()?;
    Some(format!("{}/{}", addr, cidr.prefix))
}

/// Writes CIDR records to per-family destinations.
pub struct CidrExporter<W: Write> {
    ipv4: Option<Destination<W>>,
    ipv6: Option<Destination<W>>,
}

impl CidrExporter<BufWriter<File>> {
    /// Create every configured output file before anything is written.
    ///
    /// Fails without writing if any file cannot be created.
    pub fn create(ipv4: Option<&Path>, ipv6: Option<&Path>) -> Result<Self> {
        let ipv4 = ipv4.map(Destination::create).transpose()?;
        let ipv6 = ipv6.map(Destination::create).transpose()?;
        Ok(Self { ipv4, ipv6 })
    }
}

impl<W: Write> CidrExporter<W> {
    /// Build an exporter from already open destinations.
    pub fn new(ipv4: Option<Destination<W>>, ipv6: Option<Destination<W>>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Write `cidrs` in order, each to the destination of its family.
    pub fn export(&mut self, cidrs: &[Cidr]) -> Result<ExportSummary> {
        let mut summary = ExportSummary::default();

        for cidr in cidrs {
            let (Some(family), Some(line)) = (cidr.family(), format_cidr(cidr)) else {
                log::warn!(
                    "Skipping CIDR with {}-byte address (prefix {}): {:02x?}",
                    cidr.ip.len(),
                    cidr.prefix,
                    cidr.ip
                );
                summary.unclassified += 1;
                continue;
            };

            let (dest, count) = match family {
                AddressFamily::V4 => (self.ipv4.as_mut(), &mut summary.ipv4),
                AddressFamily::V6 => (self.ipv6.as_mut(), &mut summary.ipv6),
            };

            match dest {
                Some(dest) => {
                    dest.write_line(&line)?;
                    *count += 1;
                }
                None => summary.skipped += 1,
            }
        }

        if summary.unclassified > 0 {
            log::warn!(
                "{} records had an unrecognized address length",
                summary.unclassified
            );
        }

        Ok(summary)
    }

    /// Flush all destinations and hand back the writers.
    pub fn finish(self) -> Result<(Option<W>, Option<W>)> {
        let ipv4 = self.ipv4.map(Destination::finish).transpose()?;
        let ipv6 = self.ipv6.map(Destination::finish).transpose()?;
        Ok((ipv4, ipv6))
    }
}

/// Counters describing one domain export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainSummary {
    /// Lines written
    pub written: usize,
    /// Domains with an unknown type tag
    pub unknown: usize,
}

/// Format a domain rule as `kind:value`, followed by its attributes.
///
/// Returns `None` for an unknown type tag.
pub fn format_domain(domain: &Domain) -> Option<String> {
    let kind = match domain::Type::try_from(domain.r#type).ok()? {
        domain::Type::Plain => "keyword",
        domain::Type::Regex => "regexp",
        domain::Type::RootDomain => "domain",
        domain::Type::Full => "full",
    };

    let mut line = format!("{}:{}", kind, domain.value);
    for attr in &domain.attribute {
        match attr.typed_value {
            Some(TypedValue::IntValue(v)) => line.push_str(&format!(" @{}={}", attr.key, v)),
            Some(TypedValue::BoolValue(_)) | None => line.push_str(&format!(" @{}", attr.key)),
        }
    }
    Some(line)
}

/// Writes domain rules to a single destination.
pub struct DomainExporter<W: Write> {
    dest: Destination<W>,
}

impl DomainExporter<BufWriter<File>> {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            dest: Destination::create(path)?,
        })
    }
}

impl<W: Write> DomainExporter<W> {
    /// Build an exporter from an already open destination.
    pub fn new(dest: Destination<W>) -> Self {
        Self { dest }
    }

    /// Write `domains` in order.
    pub fn export(&mut self, domains: &[Domain]) -> Result<DomainSummary> {
        let mut summary = DomainSummary::default();

        for domain in domains {
            match format_domain(domain) {
                Some(line) => {
                    self.dest.write_line(&line)?;
                    summary.written += 1;
                }
                None => {
                    log::warn!(
                        "Skipping domain {:?} with unknown type {}",
                        domain.value,
                        domain.r#type
                    );
                    summary.unknown += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Flush the destination and hand back the writer.
    pub fn finish(self) -> Result<W> {
        self.dest.finish()
    }
}

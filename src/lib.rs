//! K2Geo - Export per-country address and domain lists from V2Ray geo databases.
//!
//! This crate reads a `geoip.dat` (or `geosite.dat`) database from a URL or a
//! local file, selects the entry of one country and writes its records as
//! plain-text lists.
//!
//! # Features
//!
//! - **Remote or local sources**: HTTP(S) URLs and filesystem paths
//! - **Gzip support**: compressed databases are decompressed transparently
//! - **Family split**: IPv4 and IPv6 CIDRs go to separate files
//! - **Domain export**: geosite rules as `domain:`, `full:`, `keyword:`, `regexp:` lines
//!
//! # Quick Start
//!
//! ```ignore
//! use k2geo::{load_cidrs, CidrExporter, FetchOptions, SourceLocator};
//! use std::path::Path;
//!
//! let source = SourceLocator::parse("https://github.com/v2fly/geoip/raw/release/geoip.dat");
//! let cidrs = load_cidrs(&source, "CN", &FetchOptions::default())?;
//!
//! let mut exporter = CidrExporter::create(Some(Path::new("cn4.txt")), Some(Path::new("cn6.txt")))?;
//! let summary = exporter.export(&cidrs)?;
//! exporter.finish()?;
//! println!("{} IPv4, {} IPv6", summary.ipv4, summary.ipv6);
//! ```
//!
//! # Output Format
//!
//! One record per line, `\n`-terminated, no header:
//!
//! ```text
//! 1.0.1.0/24
//! 2400:3200::/32
//! ```

mod error;

pub mod config;
pub mod export;
pub mod geodat;
pub mod loader;
pub mod source;

// Re-export core types
pub use error::{Error, Result};
pub use geodat::{AddressFamily, Cidr, Domain, GeoIp, GeoIpList, GeoSite, GeoSiteList};

// Re-export loading and exporting
pub use export::{CidrExporter, Destination, DomainExporter, DomainSummary, ExportSummary};
pub use loader::{cidrs_for_country, domains_for_country, load_cidrs, load_domains};
pub use source::{FetchOptions, SourceLocator};

// Re-export the CLI entry points
pub use config::{run, Cli, ExportConfig, ExportTarget, Invocation, RunSummary};

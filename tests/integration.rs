//! End-to-end export runs against on-disk databases.

use k2geo::geodat::domain;
use k2geo::{
    run, Cidr, Cli, Domain, Error, ExportConfig, ExportTarget, FetchOptions, GeoIp, GeoIpList,
    GeoSite, GeoSiteList, Invocation, RunSummary, SourceLocator,
};
use prost::Message;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn cidr(addr: &str, prefix: u32) -> Cidr {
    Cidr::new(addr.parse().unwrap(), prefix)
}

fn write_geoip(dir: &Path) -> PathBuf {
    let list = GeoIpList {
        entry: vec![
            GeoIp {
                country_code: "CN".to_string(),
                cidr: vec![cidr("1.2.3.4", 8)],
                reverse_match: false,
            },
            GeoIp {
                country_code: "US".to_string(),
                cidr: vec![
                    cidr("3.0.0.0", 9),
                    cidr("2600:1f00::", 24),
                    Cidr {
                        ip: vec![0xde, 0xad],
                        prefix: 16,
                    },
                    cidr("8.8.8.0", 24),
                ],
                reverse_match: false,
            },
        ],
    };

    let path = dir.join("geoip.dat");
    fs::write(&path, list.encode_to_vec()).unwrap();
    path
}

fn cidr_config(
    source: &Path,
    country: &str,
    v4: Option<PathBuf>,
    v6: Option<PathBuf>,
) -> ExportConfig {
    ExportConfig {
        source: SourceLocator::Local(source.to_path_buf()),
        country: country.to_string(),
        target: ExportTarget::Cidrs {
            ipv4_out: v4,
            ipv6_out: v6,
        },
        fetch: FetchOptions::default(),
    }
}

#[test]
fn test_single_country_ipv4_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_geoip(dir.path());
    let out4 = dir.path().join("out4");
    let out6 = dir.path().join("out6");

    run(&cidr_config(&source, "CN", Some(out4.clone()), None)).unwrap();

    assert_eq!(fs::read_to_string(&out4).unwrap(), "1.2.3.4/8\n");
    assert!(!out6.exists());
}

#[test]
fn test_split_by_family() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_geoip(dir.path());
    let out4 = dir.path().join("us4.txt");
    let out6 = dir.path().join("us6.txt");

    let config = cidr_config(&source, "US", Some(out4.clone()), Some(out6.clone()));
    let summary = run(&config).unwrap();

    assert_eq!(fs::read_to_string(&out4).unwrap(), "3.0.0.0/9\n8.8.8.0/24\n");
    assert_eq!(fs::read_to_string(&out6).unwrap(), "2600:1f00::/24\n");
    match summary {
        RunSummary::Cidrs(s) => {
            assert_eq!(s.ipv4, 2);
            assert_eq!(s.ipv6, 1);
            assert_eq!(s.unclassified, 1);
        }
        RunSummary::Domains(_) => panic!("expected a CIDR summary"),
    }
}

#[test]
fn test_missing_country_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_geoip(dir.path());
    let out4 = dir.path().join("out4");
    let out6 = dir.path().join("out6");

    let config = cidr_config(&source, "ZZ", Some(out4.clone()), Some(out6.clone()));
    let err = run(&config).unwrap_err();

    assert!(err.to_string().contains("country not found: ZZ"));
    assert!(!out4.exists());
    assert!(!out6.exists());
}

#[test]
fn test_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("absent.dat");
    let out4 = dir.path().join("out4");

    let err = run(&cidr_config(&source, "CN", Some(out4.clone()), None)).unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable { .. }));
    assert!(!out4.exists());
}

#[test]
fn test_corrupt_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("corrupt.dat");
    fs::write(&source, [0x0a, 0xff, 0x01]).unwrap();

    let err = run(&cidr_config(&source, "CN", Some(dir.path().join("out4")), None)).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn test_gzip_source() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = tempfile::tempdir().unwrap();
    let plain = write_geoip(dir.path());
    let gz = dir.path().join("geoip.dat.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&fs::read(&plain).unwrap()).unwrap();
    fs::write(&gz, encoder.finish().unwrap()).unwrap();

    let out4 = dir.path().join("cn4.txt");
    run(&cidr_config(&gz, "CN", Some(out4.clone()), None)).unwrap();

    assert_eq!(fs::read_to_string(&out4).unwrap(), "1.2.3.4/8\n");
}

#[test]
fn test_second_output_create_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_geoip(dir.path());
    let out4 = dir.path().join("out4");
    let bad6 = dir.path().join("missing-dir").join("out6");

    let err = run(&cidr_config(&source, "US", Some(out4.clone()), Some(bad6))).unwrap_err();

    assert!(matches!(err, Error::OutputCreate { .. }));
    // Created before the failure, but nothing was written to it.
    assert_eq!(fs::read_to_string(&out4).unwrap(), "");
}

#[test]
fn test_positional_invocation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_geoip(dir.path());
    let out = dir.path().join("us.txt");

    let cli = Cli::parse_args([
        "k2geo",
        source.to_str().unwrap(),
        "US",
        out.to_str().unwrap(),
    ])
    .unwrap();
    let config = match cli.resolve().unwrap() {
        Invocation::Export(config) => config,
        Invocation::Usage => panic!("expected an export invocation"),
    };
    run(&config).unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "3.0.0.0/9\n8.8.8.0/24\n");
}

#[test]
fn test_usage_without_outputs_never_fetches() {
    // The source does not exist; resolving must not touch it.
    let cli = Cli::parse_args(["k2geo", "-source", "/nonexistent/geoip.dat"]).unwrap();
    assert_eq!(cli.resolve().unwrap(), Invocation::Usage);
}

#[test]
fn test_domain_export() {
    let dir = tempfile::tempdir().unwrap();
    let list = GeoSiteList {
        entry: vec![GeoSite {
            country_code: "GOOGLE".to_string(),
            domain: vec![
                Domain {
                    r#type: domain::Type::RootDomain as i32,
                    value: "google.com".to_string(),
                    attribute: Vec::new(),
                },
                Domain {
                    r#type: domain::Type::Full as i32,
                    value: "www.google.cn".to_string(),
                    attribute: vec![domain::Attribute {
                        key: "cn".to_string(),
                        typed_value: Some(domain::attribute::TypedValue::BoolValue(true)),
                    }],
                },
            ],
        }],
    };
    let source = dir.path().join("geosite.dat");
    fs::write(&source, list.encode_to_vec()).unwrap();
    let out = dir.path().join("google.txt");

    let config = ExportConfig {
        source: SourceLocator::Local(source),
        country: "GOOGLE".to_string(),
        target: ExportTarget::Domains { out: out.clone() },
        fetch: FetchOptions::default(),
    };
    run(&config).unwrap();

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "domain:google.com\nfull:www.google.cn @cn\n"
    );
}

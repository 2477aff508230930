//! Decoding databases and selecting one country's records.

use prost::Message;

use crate::geodat::{Cidr, Domain, GeoIp, GeoIpList, GeoSite, GeoSiteList};
use crate::source::{FetchOptions, SourceLocator};
use crate::{Error, Result};

/// A database entry keyed by country code.
trait CountryEntry {
    type Record;

    fn country_code(&self) -> &str;

    fn into_records(self) -> Vec<Self::Record>;
}

impl CountryEntry for GeoIp {
    type Record = Cidr;

    fn country_code(&self) -> &str {
        &self.country_code
    }

    fn into_records(self) -> Vec<Cidr> {
        self.cidr
    }
}

impl CountryEntry for GeoSite {
    type Record = Domain;

    fn country_code(&self) -> &str {
        &self.country_code
    }

    fn into_records(self) -> Vec<Domain> {
        self.domain
    }
}

/// Return the records of the first entry whose code equals `country`.
///
/// Matching is exact and case-sensitive.
fn select<E: CountryEntry>(entries: Vec<E>, country: &str) -> Result<Vec<E::Record>> {
    let total = entries.len();
    let entry = entries
        .into_iter()
        .find(|e| e.country_code() == country)
        .ok_or_else(|| Error::CountryNotFound(country.to_string()))?;

    let records = entry.into_records();
    log::info!(
        "Found {} records for {} ({} entries in database)",
        records.len(),
        country,
        total
    );
    Ok(records)
}

/// Decode a `geoip.dat` payload and return the CIDRs of `country`.
pub fn cidrs_for_country(bytes: &[u8], country: &str) -> Result<Vec<Cidr>> {
    let list = GeoIpList::decode(bytes)?;
    select(list.entry, country)
}

/// Decode a `geosite.dat` payload and return the domains of `country`.
pub fn domains_for_country(bytes: &[u8], country: &str) -> Result<Vec<Domain>> {
    let list = GeoSiteList::decode(bytes)?;
    select(list.entry, country)
}

/// Fetch a `geoip.dat` source and return the CIDRs of `country`.
pub fn load_cidrs(
    source: &SourceLocator,
    country: &str,
    options: &FetchOptions,
) -> Result<Vec<Cidr>> {
    let bytes = source.fetch(options)?;
    cidrs_for_country(&bytes, country)
}

/// Fetch a `geosite.dat` source and return the domains of `country`.
pub fn load_domains(
    source: &SourceLocator,
    country: &str,
    options: &FetchOptions,
) -> Result<Vec<Domain>> {
    let bytes = source.fetch(options)?;
    domains_for_country(&bytes, country)
}

pub mod history;
pub mod json_api;

pub use history::PypiHistoryScraper;
pub use json_api::PypiJsonClient;

use crate::error::{PypiError, Result};
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::{Timestamp, fmt::strtime};
use reqwest::blocking::Client;
use std::time::Duration;

pub const DEFAULT_PYPI_REGISTRY: &str = "https://pypi.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("pypi-releases/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(PypiError::Network)
}

/// Parse the timestamp formats PyPI emits.
///
/// The JSON API uses naive UTC (`2023-05-22T15:12:42`), the history page uses
/// an offset without a colon (`2023-05-22T15:12:42+0000`).
pub(crate) fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();

    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Some(timestamp);
    }

    if let Ok(timestamp) =
        strtime::parse("%Y-%m-%dT%H:%M:%S%z", value).and_then(|parsed| parsed.to_timestamp())
    {
        return Some(timestamp);
    }

    value
        .parse::<DateTime>()
        .ok()
        .and_then(|naive| naive.to_zoned(TimeZone::UTC).ok())
        .map(|zoned| zoned.timestamp())
}

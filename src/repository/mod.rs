use crate::error::Result;
use crate::pypi::parse_timestamp;
use jiff::Timestamp;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod factory;
pub use factory::ResolverFactory;

/// A published version of a package and when it was uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    #[serde(default, deserialize_with = "deserialize_version_date")]
    pub version_date: Option<Timestamp>,
}

/// Accepts every form PyPI emits, including naive UTC; always saved as RFC 3339
fn deserialize_version_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid version_date '{raw}'"))),
    }
}

impl Release {
    pub fn new(version: impl Into<String>, version_date: Option<Timestamp>) -> Self {
        Self {
            version: version.into(),
            version_date,
        }
    }
}

/// Looks up the latest release of a package on a registry.
///
/// `Ok(None)` means the registry answered but listed nothing usable;
/// `Err` means the lookup itself failed.
pub trait VersionResolver: Send + Sync {
    fn resolve_latest(&self, package_name: &str) -> Result<Option<Release>>;
}

/// How releases are looked up on PyPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// JSON API (`/pypi/{package}/json`)
    #[default]
    Api,
    /// Release history page (`/project/{package}/#history`)
    Scrape,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Api => write!(f, "api"),
            Strategy::Scrape => write!(f, "scrape"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" | "json" => Ok(Strategy::Api),
            "scrape" | "html" => Ok(Strategy::Scrape),
            other => Err(format!("unknown strategy '{other}' (expected 'api' or 'scrape')")),
        }
    }
}

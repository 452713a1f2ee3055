//! Release history scraping from the PyPI project page

use crate::error::{PypiError, Result};
use crate::pypi::{DEFAULT_TIMEOUT_SECS, build_client, parse_timestamp};
use crate::repository::{Release, VersionResolver};
use regex::Regex;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

const VERSION_PATTERN: &str = r#"(?s)<p class="release__version">(.*?)</p>"#;
const DATE_PATTERN: &str =
    r#"(?s)<p class="release__version-date">.*?<time[^>]*\sdatetime="([^"]+)""#;

/// Resolves releases by reading `/project/{package}/#history`.
///
/// Fallback for when the JSON API is not an option; it depends on PyPI's markup.
pub struct PypiHistoryScraper {
    client: Client,
    base_url: String,
    version_re: Regex,
    date_re: Regex,
}

impl PypiHistoryScraper {
    #[allow(dead_code)]
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Result<Self> {
        let version_re = Regex::new(VERSION_PATTERN)
            .map_err(|e| PypiError::Config(format!("Invalid version pattern: {}", e)))?;
        let date_re = Regex::new(DATE_PATTERN)
            .map_err(|e| PypiError::Config(format!("Invalid date pattern: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version_re,
            date_re,
        })
    }

    /// Fetch every release listed on the history page, in page order
    pub fn fetch_release_history(&self, package_name: &str) -> Result<Vec<Release>> {
        let url = format!("{}/project/{}/#history", self.base_url, package_name);
        debug!("Fetching: {}", url);

        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            debug!("HTTP {}: {}", response.status(), url);
            return Err(PypiError::Resolution {
                package: package_name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text()?;
        let releases = self.extract_releases(&html);

        debug!(
            "Found {} releases on the history page of {}",
            releases.len(),
            package_name
        );

        Ok(releases)
    }

    /// Pair version labels with publication dates by position
    pub fn extract_releases(&self, html: &str) -> Vec<Release> {
        let versions = self
            .version_re
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|label| version_label(label.as_str()));

        let dates = self
            .date_re
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|datetime| parse_timestamp(datetime.as_str()));

        versions
            .zip(dates)
            .map(|(version, version_date)| Release::new(version, version_date))
            .collect()
    }
}

impl VersionResolver for PypiHistoryScraper {
    fn resolve_latest(&self, package_name: &str) -> Result<Option<Release>> {
        let mut releases = self.fetch_release_history(package_name)?;
        releases.sort_by(|a, b| b.version_date.cmp(&a.version_date));
        Ok(releases.into_iter().next())
    }
}

/// The label may be followed by badges such as `pre-release` or `yanked`
fn version_label(inner_html: &str) -> String {
    inner_html
        .split('<')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

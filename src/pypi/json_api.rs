//! PyPI JSON API client

use crate::error::{PypiError, Result};
use crate::pypi::{DEFAULT_TIMEOUT_SECS, build_client, parse_timestamp};
use crate::repository::{Release, VersionResolver};
use jiff::Timestamp;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Resolves releases through `GET /pypi/{package}/json`
pub struct PypiJsonClient {
    client: Client,
    base_url: String,
}

impl PypiJsonClient {
    #[allow(dead_code)]
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the version PyPI reports as current, dated by its newest upload
    pub fn fetch_latest_release(&self, package_name: &str) -> Result<Release> {
        let url = format!("{}/pypi/{}/json", self.base_url, package_name);
        debug!("Fetching: {}", url);

        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            debug!("HTTP {}: {}", response.status(), url);
            return Err(PypiError::Resolution {
                package: package_name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: PypiResponse = response.json().map_err(|e| {
            PypiError::InvalidResponse(format!(
                "Failed to decode PyPI metadata for '{}': {}",
                package_name, e
            ))
        })?;

        let version = body.info.version;
        let version_date = body
            .releases
            .get(&version)
            .and_then(|files| latest_upload_time(files));

        debug!(
            "PyPI reports {} {} (uploaded {:?})",
            package_name, version, version_date
        );

        Ok(Release::new(version, version_date))
    }
}

impl VersionResolver for PypiJsonClient {
    fn resolve_latest(&self, package_name: &str) -> Result<Option<Release>> {
        self.fetch_latest_release(package_name).map(Some)
    }
}

/// A release can ship several artifacts (sdist, wheels); the newest upload dates it
fn latest_upload_time(files: &[PypiFile]) -> Option<Timestamp> {
    files
        .iter()
        .filter_map(|file| file.upload_time.as_deref())
        .filter_map(parse_timestamp)
        .max()
}

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    upload_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pypi::DEFAULT_PYPI_REGISTRY;
    use mockito::Server;

    #[test]
    fn fetch_latest_release_uses_info_version_and_newest_upload() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"version": "2.32.0"},
                    "releases": {
                        "2.31.0": [{"upload_time": "2023-05-22T15:12:42"}],
                        "2.32.0": [
                            {"upload_time": "2024-05-20T16:01:10"},
                            {"upload_time": "2024-05-20T16:04:33"},
                            {"upload_time": "2024-05-20T15:59:02"}
                        ]
                    }
                }"#,
            )
            .create();

        let client = PypiJsonClient::with_base_url(server.url()).unwrap();
        let release = client.fetch_latest_release("requests").unwrap();

        mock.assert();
        assert_eq!(release.version, "2.32.0");
        assert_eq!(
            release.version_date.map(|date| date.to_string()),
            Some("2024-05-20T16:04:33Z".to_string())
        );
    }

    #[test]
    fn fetch_latest_release_without_artifacts_has_no_date() {
        let mut server = Server::new();
        server
            .mock("GET", "/pypi/empty/json")
            .with_status(200)
            .with_body(r#"{"info": {"version": "0.1.0"}, "releases": {"0.1.0": []}}"#)
            .create();

        let client = PypiJsonClient::with_base_url(server.url()).unwrap();
        let release = client.resolve_latest("empty").unwrap().unwrap();

        assert_eq!(release, Release::new("0.1.0", None));
    }

    #[test]
    fn fetch_latest_release_fails_on_error_status() {
        let mut server = Server::new();
        server
            .mock("GET", "/pypi/nonexistent/json")
            .with_status(404)
            .create();

        let client = PypiJsonClient::with_base_url(server.url()).unwrap();
        let err = client.resolve_latest("nonexistent").unwrap_err();

        assert!(matches!(
            err,
            PypiError::Resolution { ref package, status: 404 } if package == "nonexistent"
        ));
    }

    #[test]
    fn fetch_latest_release_rejects_malformed_body() {
        let mut server = Server::new();
        server
            .mock("GET", "/pypi/broken/json")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create();

        let client = PypiJsonClient::with_base_url(server.url()).unwrap();
        let err = client.resolve_latest("broken").unwrap_err();

        assert!(matches!(err, PypiError::InvalidResponse(_)));
    }

    #[test]
    fn package_name_is_sent_verbatim() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/PyYAML/json")
            .with_status(200)
            .with_body(r#"{"info": {"version": "6.0.1"}, "releases": {}}"#)
            .create();

        let client = PypiJsonClient::with_base_url(format!("{}/", server.url())).unwrap();
        client.resolve_latest("PyYAML").unwrap();

        mock.assert();
    }

    #[test]
    #[ignore] // Requires network access
    fn fetch_requests_from_pypi() {
        let client = PypiJsonClient::with_base_url(DEFAULT_PYPI_REGISTRY).unwrap();
        let release = client.fetch_latest_release("requests").unwrap();
        assert!(!release.version.is_empty());
        assert!(release.version_date.is_some());
    }
}

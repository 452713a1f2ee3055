use crate::config::Settings;
use crate::error::Result;
use crate::pypi::{PypiHistoryScraper, PypiJsonClient, build_client};
use crate::repository::{Strategy, VersionResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct ResolverFactory;

impl ResolverFactory {
    pub fn create(settings: &Settings) -> Result<Arc<dyn VersionResolver>> {
        let base_url = settings.validated_registry_url()?;
        let client = build_client(Duration::from_secs(settings.timeout_secs))?;

        debug!("Using {} strategy against {}", settings.strategy, base_url);

        let resolver: Arc<dyn VersionResolver> = match settings.strategy {
            Strategy::Api => Arc::new(PypiJsonClient::with_client(client, base_url)),
            Strategy::Scrape => Arc::new(PypiHistoryScraper::with_client(client, base_url)?),
        };

        Ok(resolver)
    }
}

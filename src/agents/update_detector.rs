use crate::agents::release_cache::{CacheUpdate, ReleaseMap};
use crate::manifest::PackageRef;
use crate::repository::{Release, VersionResolver};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, warn};

/// A package whose latest release differs from what we knew about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    pub name: String,
    pub previous_version: String,
    pub latest_version: String,
}

impl UpdateRecord {
    pub fn new(
        name: impl Into<String>,
        previous_version: impl Into<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            previous_version: previous_version.into(),
            latest_version: latest_version.into(),
        }
    }
}

/// UpdateDetector resolves each package in turn and reports what changed.
///
/// A package that cannot be resolved is logged and skipped; it never aborts the batch.
pub struct UpdateDetector {
    resolver: Arc<dyn VersionResolver>,
    show_progress: bool,
}

impl UpdateDetector {
    pub fn new(resolver: Arc<dyn VersionResolver>) -> Self {
        Self {
            resolver,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Packages whose latest release is not the declared version
    pub fn detect_updates(&self, packages: &[PackageRef]) -> Vec<UpdateRecord> {
        let pb = self.progress_bar(packages.len());
        let mut updates = Vec::new();

        for package in packages {
            pb.set_message(format!("Checking {}", package.name));

            if let Some(release) = self.resolve(package) {
                if release.version != package.declared_version {
                    updates.push(UpdateRecord::new(
                        package.name.as_str(),
                        package.declared_version.as_str(),
                        release.version,
                    ));
                }
            }

            pb.inc(1);
        }

        pb.finish_and_clear();
        updates
    }

    /// Releases published since they were last recorded in `cache`.
    ///
    /// Packages seen for the first time are compared against their declared version.
    pub fn track_releases(
        &self,
        packages: &[PackageRef],
        cache: &mut ReleaseMap,
    ) -> Vec<UpdateRecord> {
        let pb = self.progress_bar(packages.len());
        let mut findings = Vec::new();

        for package in packages {
            pb.set_message(format!("Checking {}", package.name));

            if let Some(release) = self.resolve(package) {
                let latest_version = release.version.clone();

                match cache.record(&package.name, release) {
                    CacheUpdate::Inserted => findings.push(UpdateRecord::new(
                        package.name.as_str(),
                        package.declared_version.as_str(),
                        latest_version,
                    )),
                    CacheUpdate::Replaced { previous } => findings.push(UpdateRecord::new(
                        package.name.as_str(),
                        previous.version,
                        latest_version,
                    )),
                    CacheUpdate::Unchanged => {
                        if let Some(cached) = cache.get(&package.name) {
                            debug!("{} is still at {}", package.name, cached.version);
                        }
                    }
                }
            }

            pb.inc(1);
        }

        pb.finish_and_clear();
        findings
    }

    fn resolve(&self, package: &PackageRef) -> Option<Release> {
        match self.resolver.resolve_latest(&package.name) {
            Ok(Some(release)) => Some(release),
            Ok(None) => {
                warn!("No release found for {}, skipping", package.name);
                None
            }
            Err(e) => {
                warn!("Failed to resolve {}: {}", package.name, e);
                None
            }
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::default_bar().template("  [{bar:40}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    }
}

use crate::agents::{ReleaseCache, UpdateDetector, UpdateRecord};
use crate::config::Settings;
use crate::error::Result;
use crate::manifest::{ManifestParser, PackageRef};
use crate::repository::ResolverFactory;
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the check workflow: latest release vs pinned version
pub fn execute_check<P: AsRef<Path>>(
    manifest_path: P,
    settings: &Settings,
    show_progress: bool,
) -> Result<Vec<UpdateRecord>> {
    let manifest_path = manifest_path.as_ref();
    println!(
        "{}",
        format!("Checking for new releases ({} strategy)...", settings.strategy)
            .cyan()
            .bold()
    );

    println!("\n{}", "1. Reading environment file...".yellow());
    let packages = ManifestParser::read_manifest(manifest_path)?;
    println!(
        "{}",
        format!("✓ Found {} package(s)", packages.len()).green()
    );

    println!("\n{}", "2. Querying the package index...".yellow());
    let detector = UpdateDetector::new(ResolverFactory::create(settings)?)
        .with_progress(show_progress);
    let updates = detector.detect_updates(&packages);
    println!("{}", "✓ Check completed".green());

    print_updates(&updates, "Available Updates", "All packages are up to date!");

    Ok(updates)
}

/// Execute the releases workflow: new releases since the cached ones
pub fn execute_releases<P: AsRef<Path>>(
    manifest_path: P,
    settings: &Settings,
    show_progress: bool,
) -> Result<Vec<UpdateRecord>> {
    let manifest_path = manifest_path.as_ref();
    println!("{}", "Looking for releases since the last run...".cyan().bold());

    println!("\n{}", "1. Reading environment file...".yellow());
    let packages = ManifestParser::read_manifest(manifest_path)?;
    println!(
        "{}",
        format!("✓ Found {} package(s)", packages.len()).green()
    );

    println!("\n{}", "2. Loading release cache...".yellow());
    let cache = ReleaseCache::new(&settings.cache_path);
    let mut releases = cache.load()?;
    if releases.is_empty() {
        println!(
            "   No cached releases yet, {} will be created",
            cache.path().display().to_string().dimmed()
        );
    } else {
        println!(
            "   {} cached release(s) in {}",
            releases.len().to_string().yellow(),
            cache.path().display().to_string().dimmed()
        );
    }

    println!("\n{}", "3. Querying the package index...".yellow());
    let detector = UpdateDetector::new(ResolverFactory::create(settings)?)
        .with_progress(show_progress);
    let findings = detector.track_releases(&packages, &mut releases);
    println!("{}", "✓ Check completed".green());

    println!("\n{}", "4. Saving release cache...".yellow());
    cache.save(&releases)?;
    info!("Release cache written to {}", cache.path().display());
    println!("{}", "✓ Cache saved".green());

    print_updates(&findings, "New Releases", "No new releases since the last run.");

    Ok(findings)
}

/// Execute the list workflow - display all declared packages
pub fn execute_list<P: AsRef<Path>>(manifest_path: P) -> Result<Vec<PackageRef>> {
    let manifest_path = manifest_path.as_ref();
    println!(
        "{}",
        "Listing packages in environment file...".cyan().bold()
    );

    let packages = ManifestParser::read_manifest(manifest_path)?;
    print_packages(&packages);

    Ok(packages)
}

fn print_updates(updates: &[UpdateRecord], title: &str, empty_message: &str) {
    if updates.is_empty() {
        println!("\n{}", format!("✨ {}", empty_message).green().bold());
        return;
    }

    println!("\n{}", format!("📦 {}:", title).cyan().bold());
    println!(
        "{}",
        format!("Found {} package(s)", updates.len()).yellow()
    );

    for update in updates {
        println!(
            "  • {} {} → {}",
            update.name.white().bold(),
            update.previous_version.red(),
            update.latest_version.green().bold()
        );
    }
}

fn print_packages(packages: &[PackageRef]) {
    println!("\n{}", "📦 Packages:".cyan().bold());

    for package in packages {
        if package.has_declared_version() {
            println!(
                "  {} {}",
                package.name.cyan(),
                package.declared_version.yellow()
            );
        } else {
            println!("  {} {}", package.name.cyan(), "(version not pinned)".dimmed());
        }
    }

    println!("\n{}", "Summary:".cyan().bold());
    println!("  {} packages", packages.len().to_string().yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Strategy;
    use mockito::Server;
    use std::fs;
    use tempfile::tempdir;

    const ENVIRONMENT: &str = r#"
name: env
channels:
  - conda-forge
dependencies:
  - python=3.11
  - numpy=1.26.3
  - pip:
      - requests==2.32.3
"#;

    fn pypi_body(version: &str, upload_time: &str) -> String {
        format!(
            r#"{{"info": {{"version": "{version}"}}, "releases": {{"{version}": [{{"upload_time": "{upload_time}"}}]}}}}"#
        )
    }

    #[test]
    fn execute_check_reports_outdated_packages() {
        let mut server = Server::new();
        server
            .mock("GET", "/pypi/numpy/json")
            .with_status(200)
            .with_body(pypi_body("1.26.4", "2024-02-05T21:30:22"))
            .create();
        server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_body(pypi_body("2.32.3", "2024-05-29T15:37:47"))
            .create();

        let dir = tempdir().unwrap();
        let manifest = dir.path().join("environment.yml");
        fs::write(&manifest, ENVIRONMENT).unwrap();

        let settings = Settings::default().with_registry_url(Some(server.url()));
        let updates = execute_check(&manifest, &settings, false).unwrap();

        assert_eq!(updates, vec![UpdateRecord::new("numpy", "1.26.3", "1.26.4")]);
    }

    #[test]
    fn execute_releases_only_reports_new_releases_on_second_run() {
        let mut server = Server::new();
        let numpy = server
            .mock("GET", "/pypi/numpy/json")
            .with_status(200)
            .with_body(pypi_body("1.26.4", "2024-02-05T21:30:22"))
            .expect(2)
            .create();
        let requests = server
            .mock("GET", "/pypi/requests/json")
            .with_status(503)
            .expect(2)
            .create();

        let dir = tempdir().unwrap();
        let manifest = dir.path().join("environment.yml");
        fs::write(&manifest, ENVIRONMENT).unwrap();

        let settings = Settings::default()
            .with_registry_url(Some(server.url()))
            .with_cache_path(Some(dir.path().join("latest_releases.json")));

        let first = execute_releases(&manifest, &settings, false).unwrap();
        assert_eq!(first, vec![UpdateRecord::new("numpy", "1.26.3", "1.26.4")]);

        let cached = ReleaseCache::new(&settings.cache_path).load().unwrap();
        assert_eq!(cached.len(), 1);

        let second = execute_releases(&manifest, &settings, false).unwrap();
        assert!(second.is_empty());

        numpy.assert();
        requests.assert();
    }

    #[test]
    fn execute_releases_aborts_on_corrupt_cache() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("environment.yml");
        fs::write(&manifest, ENVIRONMENT).unwrap();
        let cache_path = dir.path().join("latest_releases.json");
        fs::write(&cache_path, "[1, 2").unwrap();

        let settings = Settings::default()
            .with_strategy(Some(Strategy::Api))
            .with_cache_path(Some(cache_path));

        let err = execute_releases(&manifest, &settings, false).unwrap_err();
        assert!(matches!(err, crate::error::PypiError::CacheRead(_)));
    }

    #[test]
    fn execute_list_excludes_python() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("environment.yml");
        fs::write(&manifest, ENVIRONMENT).unwrap();

        let packages = execute_list(&manifest).unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["numpy", "requests"]);
    }
}

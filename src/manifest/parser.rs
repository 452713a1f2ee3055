use crate::error::{PypiError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Version recorded for entries that do not pin anything
pub const VERSION_NOT_PROVIDED: &str = "Not provided";

/// The interpreter itself is listed in most environment files but is not a PyPI package
const RUNTIME_PACKAGE: &str = "python";

/// A package declared in an environment manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub declared_version: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, declared_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
        }
    }

    pub fn has_declared_version(&self) -> bool {
        self.declared_version != VERSION_NOT_PROVIDED
    }
}

/// Parser for Conda environment files (environment.yml)
pub struct ManifestParser;

impl ManifestParser {
    /// Read an environment file from disk and extract its packages
    pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<PackageRef>> {
        let path = path.as_ref();
        debug!("Reading manifest {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            PypiError::ManifestParse(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse manifest text into packages, in the order they are declared.
    /// `python` is never returned.
    pub fn parse(content: &str) -> Result<Vec<PackageRef>> {
        let packages = Self::extract_raw_entries(content)?
            .iter()
            .map(|line| Self::parse_package_line(line))
            .filter(|package| package.name != RUNTIME_PACKAGE)
            .collect();

        Ok(packages)
    }

    /// Collect the raw `name[=[=]version]` strings of the `dependencies` list.
    ///
    /// Entries of a nested `pip:` block are spliced in where the block appears.
    pub fn extract_raw_entries(content: &str) -> Result<Vec<String>> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| PypiError::ManifestParse(format!("Invalid YAML: {}", e)))?;

        if !document.is_mapping() {
            return Err(PypiError::ManifestParse(
                "Environment file must be a YAML mapping".to_string(),
            ));
        }

        let dependencies = document.get("dependencies").ok_or_else(|| {
            PypiError::ManifestParse("Missing 'dependencies' section".to_string())
        })?;

        let entries = dependencies.as_sequence().ok_or_else(|| {
            PypiError::ManifestParse("'dependencies' must be a list".to_string())
        })?;

        let mut raw_entries = Vec::new();

        for entry in entries {
            match entry {
                // Conda packages
                Value::String(line) => raw_entries.push(line.clone()),
                // Pip packages
                Value::Mapping(block) => {
                    let pip_entries = block
                        .get("pip")
                        .and_then(Value::as_sequence)
                        .ok_or_else(|| {
                            PypiError::ManifestParse(
                                "Nested dependency block must contain a 'pip' list".to_string(),
                            )
                        })?;

                    for pip_entry in pip_entries {
                        match pip_entry.as_str() {
                            Some(line) => raw_entries.push(line.to_string()),
                            None => debug!("Skipping non-string pip entry: {:?}", pip_entry),
                        }
                    }
                }
                other => debug!("Skipping non-string dependency entry: {:?}", other),
            }
        }

        Ok(raw_entries)
    }

    /// Split a `name`, `name=version` or `name==version` line.
    ///
    /// The version is always the last `=` segment so both conda and pip pins work.
    pub fn parse_package_line(line: &str) -> PackageRef {
        let mut segments = line.split('=');
        let name = segments.next().unwrap_or_default();
        let version = segments.last().unwrap_or(VERSION_NOT_PROVIDED);

        PackageRef::new(name, version)
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PypiError {
    #[error("Manifest parsing failed: {0}")]
    ManifestParse(String),

    #[error("Registry returned status {status} for '{package}'")]
    Resolution { package: String, status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("Release cache is unreadable: {0}")]
    CacheRead(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PypiError>;

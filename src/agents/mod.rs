pub mod release_cache;
pub mod update_detector;

pub use release_cache::ReleaseCache;
pub use update_detector::{UpdateDetector, UpdateRecord};

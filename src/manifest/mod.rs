pub mod parser;

pub use parser::{ManifestParser, PackageRef};

//! On-disk helpers: persisted key/value files and prebuilt archive extraction.

pub mod prebuilt;
pub mod properties;

pub use prebuilt::unpack_archive;
pub use properties::PropertiesFile;

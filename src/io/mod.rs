//! Filesystem access for seed files

pub mod discovery;

pub use discovery::discover_files;

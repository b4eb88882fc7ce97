// Public API
pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod loader;
pub mod model;
pub mod runner;

// Internal modules
mod io;

//! Configuration constants and command-line option validation
//!
//! Timeouts apply only at the database boundary; everything else in a run is
//! local file I/O and in-memory work.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

// ============================================================================
// Connection Configuration
// ============================================================================

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(45);

/// PGAdapter's default listening port
pub const DEFAULT_PORT: u16 = 5432;

pub const DEFAULT_HOST: &str = "localhost";

pub const DEFAULT_USERNAME: &str = "postgres";

// ============================================================================
// Store Configuration
// ============================================================================

/// Timeout for the catalog query
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the whole bulk write, layout queries and commit included
///
/// A single transaction carries every record, so this bounds the full run
/// against the database.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

// ============================================================================
// Seed Options
// ============================================================================

/// Raw options as given on the command line
#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    pub project: Option<String>,
    pub instance: Option<String>,
    pub database: Option<String>,
    pub directory: Option<PathBuf>,
    /// `host` or `host:port`
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub dry_run: bool,
    pub quiet: bool,
}

/// Validated configuration for one seeding run
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub project: String,
    pub instance: String,
    pub database: String,
    pub directory: PathBuf,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub dry_run: bool,
    pub quiet: bool,

    // Test-only: inject a pre-created pool (for SQLite testing)
    #[cfg(test)]
    pub test_pool: Option<crate::db::Pool>,
}

impl SeedConfig {
    /// Fully qualified database path used as the connection's database name
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

impl SeedOptions {
    /// Check required options, reporting every missing one at once
    pub fn validate(self) -> Result<SeedConfig, ConfigError> {
        let mut missing = Vec::new();

        let project = required(self.project, "--project", &mut missing);
        let instance = required(self.instance, "--instance", &mut missing);
        let database = required(self.database, "--database", &mut missing);
        let directory = self
            .directory
            .filter(|d| !d.as_os_str().is_empty());
        if directory.is_none() {
            missing.push("--directory");
        }

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let (host, port) = match self.endpoint.as_deref() {
            Some(endpoint) => parse_endpoint(endpoint)?,
            None => (DEFAULT_HOST.to_string(), DEFAULT_PORT),
        };

        Ok(SeedConfig {
            project: project.unwrap_or_default(),
            instance: instance.unwrap_or_default(),
            database: database.unwrap_or_default(),
            directory: directory.unwrap_or_default(),
            host,
            port,
            username: self
                .username
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: self.password,
            dry_run: self.dry_run,
            quiet: self.quiet,
            #[cfg(test)]
            test_pool: None,
        })
    }
}

fn required(
    value: Option<String>,
    flag: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if value.is_none() {
        missing.push(flag);
    }
    value
}

/// Parse `host`, `host:port` or `[v6addr]:port`
pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = endpoint.trim();
    let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| invalid("unclosed '['"))?;
        match after {
            "" => (host, None),
            _ => match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => return Err(invalid("expected ':' after ']'")),
            },
        }
    } else {
        match trimmed.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (trimmed, None),
        }
    };

    if host.is_empty() {
        return Err(invalid("empty host"));
    }
    if host.contains(':') && !trimmed.starts_with('[') {
        return Err(invalid("IPv6 addresses must be written as [addr]:port"));
    }

    let port = match port {
        None => DEFAULT_PORT,
        Some(port) => match port.parse::<u16>() {
            Ok(0) | Err(_) => return Err(invalid("port must be a number between 1 and 65535")),
            Ok(port) => port,
        },
    };

    Ok((host.to_string(), port))
}

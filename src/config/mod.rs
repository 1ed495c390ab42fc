pub mod display;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::{ConfigError, ConfigParser};
pub use types::{AppConfig, RouteConfig, ServerConfig};

use std::path::Path;

use crate::error::Result;

/// Reads, lexes, parses and validates a configuration file, returning the
/// accepted server blocks. A config with zero valid blocks after validation
/// is itself a startup failure.
pub fn load(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| crate::error::CleanError::from(format!("reading config '{}': {e}", path.display())))?;

    let servers = ConfigParser::parse_file(&text)?;
    let servers = validate::validate_configs(servers);

    if servers.is_empty() {
        return Err(crate::error::CleanError::from(
            "no valid server blocks remain after validation".to_string(),
        ));
    }

    Ok(AppConfig { servers })
}

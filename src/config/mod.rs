//! Configuration module for Card-Localizer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use card_localizer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("localizer.toml")).unwrap();
//! println!("Download workers: {}", config.localizer.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, LocalizerConfig, NetworkConfig, DEFAULT_FORCE_PROXY, DEFAULT_MAX_WORKERS,
    DEFAULT_OUTPUT_DIR_NAME, DEFAULT_SERVED_PREFIX,
};

// Re-export parser and validation functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;

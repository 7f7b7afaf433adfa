//! Configuration module for Sitemapper
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default, so an empty file (or no file at all) plus a
//! root URL on the command line is a complete configuration.
//!
//! # Example
//!
//! ```no_run
//! use sitemapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemapper.toml")).unwrap();
//! println!("Crawler will use max depth: {:?}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig, OutputConfig, OutputFormat};

// Re-export parser functions
pub use parser::{
    compute_config_hash, effective_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;

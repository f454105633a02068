//! Configuration module
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file, and loading the site lists it points to.
//!
//! # Example
//!
//! ```no_run
//! use ls_crawler::config::{load_config, load_site_lists};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! let seeds = load_site_lists(&config).unwrap();
//! println!("{} homepages to crawl", seeds.len());
//! ```

mod parser;
mod sitelist;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, FilenamePolicy, OutputConfig, SeedsConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use sitelist::{load_site_list, load_site_lists, parse_site_list, CrawlSeed};
